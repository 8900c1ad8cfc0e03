//! Extension-based classification of file names into target folders.
//!
//! Every file is sorted into a folder named after its lowercased extension.
//! Files without a usable extension go into [`FALLBACK_FOLDER`].

use std::ffi::OsStr;
use std::path::Path;

/// Folder that receives files lacking an extension.
pub const FALLBACK_FOLDER: &str = "no_extension";

/// Marker that starts the name of a hidden entry.
pub const HIDDEN_MARKER: char = '.';

const EXTENSION_SEPARATOR: char = '.';

/// Returns true if the entry name denotes a hidden file or folder.
pub fn is_hidden(name: &str) -> bool {
    name.starts_with(HIDDEN_MARKER)
}

/// Extracts the lowercased extension of a file name.
///
/// Returns `None` when the name has no separator, when nothing precedes the
/// last separator (`.env`), or when nothing follows it (`notes.`).
///
/// # Examples
///
/// ```
/// use easy_cleanup::classify::extension_of;
///
/// assert_eq!(extension_of("report.PDF").as_deref(), Some("pdf"));
/// assert_eq!(extension_of("archive.tar.gz").as_deref(), Some("gz"));
/// assert_eq!(extension_of("Makefile"), None);
/// assert_eq!(extension_of(".env"), None);
/// ```
pub fn extension_of(name: &str) -> Option<String> {
    let (stem, ext) = name.rsplit_once(EXTENSION_SEPARATOR)?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_lowercase())
}

/// Maps a file name to the name of the folder it belongs in.
///
/// Pure and deterministic: the same extension always yields the same folder,
/// regardless of its case.
///
/// # Examples
///
/// ```
/// use easy_cleanup::classify::{classify, FALLBACK_FOLDER};
///
/// assert_eq!(classify("photo.JPG"), "jpg");
/// assert_eq!(classify("README"), FALLBACK_FOLDER);
/// ```
pub fn classify(name: &str) -> String {
    extension_of(name).unwrap_or_else(|| FALLBACK_FOLDER.to_string())
}

/// Classifies a name as read from the file system, which need not be UTF-8.
///
/// Invalid bytes never contain the separator, so the lossy form splits at the
/// same place as the raw name and yields the same folder the verifier expects.
pub fn classify_os(name: &OsStr) -> String {
    classify(&name.to_string_lossy())
}

/// Splits a file name into the part a copy suffix is inserted after and the
/// extension (without its separator) that stays at the end.
///
/// `x.txt` splits into `("x", Some("txt"))`, `README` into `("README", None)`.
/// The split follows the same rule as [`extension_of`].
pub(crate) fn split_for_suffix(name: &OsStr) -> (&OsStr, Option<&OsStr>) {
    let path = Path::new(name);
    match (path.file_stem(), path.extension()) {
        (Some(stem), Some(ext)) if !stem.is_empty() && !ext.is_empty() => (stem, Some(ext)),
        _ => (name, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_case_insensitive() {
        assert_eq!(classify("report.PDF"), "pdf");
        assert_eq!(classify("report.pdf"), "pdf");
        assert_eq!(classify("report.Pdf"), "pdf");
    }

    #[test]
    fn test_no_extension_uses_fallback() {
        assert_eq!(classify("README"), FALLBACK_FOLDER);
        assert_eq!(classify("Makefile"), FALLBACK_FOLDER);
        assert_eq!(classify("c"), FALLBACK_FOLDER);
    }

    #[test]
    fn test_empty_stem_or_extension_uses_fallback() {
        assert_eq!(classify(".env"), FALLBACK_FOLDER);
        assert_eq!(classify("notes."), FALLBACK_FOLDER);
    }

    #[test]
    fn test_last_separator_wins() {
        assert_eq!(classify("test.backup.txt"), "txt");
        assert_eq!(classify("archive.tar.GZ"), "gz");
    }

    #[test]
    fn test_is_hidden() {
        assert!(is_hidden(".env"));
        assert!(is_hidden(".DS_Store"));
        assert!(!is_hidden("env"));
        assert!(!is_hidden("a.env"));
    }

    #[test]
    fn test_split_for_suffix() {
        let split = |name: &'static str| split_for_suffix(OsStr::new(name));
        assert_eq!(split("x.txt"), (OsStr::new("x"), Some(OsStr::new("txt"))));
        assert_eq!(split("a.tar.gz"), (OsStr::new("a.tar"), Some(OsStr::new("gz"))));
        assert_eq!(split("README"), (OsStr::new("README"), None));
        assert_eq!(split("notes."), (OsStr::new("notes."), None));
        assert_eq!(split(".env"), (OsStr::new(".env"), None));
    }

    #[cfg(unix)]
    #[test]
    fn test_classify_os_non_utf8_name() {
        use std::os::unix::ffi::OsStrExt;

        assert_eq!(classify_os(OsStr::from_bytes(b"caf\xe9.TXT")), "txt");
        assert_eq!(classify_os(OsStr::from_bytes(b"caf\xe9")), FALLBACK_FOLDER);
        assert_eq!(classify_os(OsStr::new("report.PDF")), classify("report.PDF"));
    }
}
