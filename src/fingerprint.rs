//! Cheap change detection for polling front ends.
//!
//! A fingerprint hashes the sorted `(kind, name)` pairs of a directory's
//! immediate children. No file content is read, so computing one costs a
//! single shallow listing.
use crate::error::{OrganizeError, OrganizeResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Number of digest bytes kept in the hex string.
const DIGEST_BYTES: usize = 16;

/// Opaque summary of a directory's membership.
///
/// Two fingerprints of the same membership compare equal regardless of the
/// order the entries were listed in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DirectoryFingerprint {
    pub digest: String,
    pub file_count: usize,
    pub folder_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum EntryKind {
    File,
    Folder,
    Other,
}

impl EntryKind {
    fn tag(self) -> u8 {
        match self {
            Self::File => b'f',
            Self::Folder => b'd',
            Self::Other => b'o',
        }
    }
}

/// Computes the fingerprint of `directory`.
///
/// Entries that vanish while the listing is in progress are left out; the
/// result describes whatever membership was observed.
///
/// # Examples
///
/// ```no_run
/// use easy_cleanup::fingerprint::fingerprint_directory;
/// use std::path::Path;
///
/// let before = fingerprint_directory(Path::new("/path/to/dir")).unwrap();
/// let after = fingerprint_directory(Path::new("/path/to/dir")).unwrap();
/// if before != after {
///     println!("directory changed");
/// }
/// ```
pub fn fingerprint_directory(directory: &Path) -> OrganizeResult<DirectoryFingerprint> {
    let entries = fs::read_dir(directory)
        .map_err(|e| OrganizeError::invalid_target(directory, e.to_string()))?;

    let members = entries
        .flatten()
        .filter_map(|entry| {
            let file_type = entry.file_type().ok()?;
            let kind = if file_type.is_dir() {
                EntryKind::Folder
            } else if file_type.is_file() {
                EntryKind::File
            } else {
                EntryKind::Other
            };
            Some((entry.file_name().as_encoded_bytes().to_vec(), kind))
        });

    Ok(digest_listing(members))
}

/// Fingerprints a listing given in whatever order the directory produced it.
fn digest_listing(listing: impl IntoIterator<Item = (Vec<u8>, EntryKind)>) -> DirectoryFingerprint {
    let mut members: Vec<_> = listing.into_iter().collect();
    members.sort();
    digest_members(&members)
}

/// Hashes members that are already sorted.
fn digest_members(members: &[(Vec<u8>, EntryKind)]) -> DirectoryFingerprint {
    let file_count = members.iter().filter(|(_, k)| *k == EntryKind::File).count();
    let folder_count = members.iter().filter(|(_, k)| *k == EntryKind::Folder).count();

    let mut hasher = blake3::Hasher::new();
    hasher.update(&(members.len() as u64).to_le_bytes());
    for (name, kind) in members {
        hasher.update(&[kind.tag()]);
        hasher.update(&(name.len() as u64).to_le_bytes());
        hasher.update(name);
    }
    let hash = hasher.finalize();

    let digest = hash.as_bytes()[..DIGEST_BYTES]
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect();

    DirectoryFingerprint {
        digest,
        file_count,
        folder_count,
    }
}
