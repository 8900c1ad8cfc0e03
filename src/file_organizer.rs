//! Physical relocation of a single file into its target folder.
//!
//! [`FileOrganizer::move_file`] creates the folder when needed, resolves the
//! final name through the duplicate policy and moves the file. Every outcome,
//! including failures, is returned as a [`MoveOutcome`] value so the caller can
//! continue with the remaining files.
use crate::classify::classify_os;
use crate::duplicates::{DuplicateDecider, DuplicatePolicy, Resolution, resolve};
use serde::{Deserialize, Serialize};
use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

/// What happened to a single file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MoveAction {
    /// Moved under its own name; there was no collision.
    Moved,
    /// Replaced an existing file of the same name.
    Overwritten,
    /// Placed under a fresh `_copyN` name.
    CopyRenamed,
    /// Left in place because the front end chose to skip the collision.
    Skipped,
    /// Left in place because the move could not be performed.
    Failed { reason: String },
}

/// Result of relocating one entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveOutcome {
    /// Name of the file at the top level before the move.
    pub source_name: String,
    /// Target folder the file belongs in.
    pub folder: String,
    /// Name inside the folder; equals `source_name` unless renamed.
    pub final_name: String,
    /// Whether the desired name was already taken.
    pub collision: bool,
    pub action: MoveAction,
}

impl MoveOutcome {
    /// True if the file now lives inside its target folder.
    pub fn is_placed(&self) -> bool {
        matches!(
            self.action,
            MoveAction::Moved | MoveAction::Overwritten | MoveAction::CopyRenamed
        )
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.action, MoveAction::Failed { .. })
    }

    fn failed(source_name: &str, folder: &str, collision: bool, reason: String) -> Self {
        Self {
            source_name: source_name.to_string(),
            folder: folder.to_string(),
            final_name: source_name.to_string(),
            collision,
            action: MoveAction::Failed { reason },
        }
    }
}

/// A [`MoveOutcome`] plus whether its target folder was created by this move.
#[derive(Debug, Clone)]
pub struct MoveReport {
    pub outcome: MoveOutcome,
    pub created_folder: bool,
}

/// Moves files from a base directory into extension folders beneath it.
pub struct FileOrganizer;

impl FileOrganizer {
    /// Moves `file_name` from `base_path` into the folder its name classifies to.
    ///
    /// Creates the folder if absent and reports whether it did. A collision is
    /// resolved under `policy`, consulting `decider` for `Prompt`. Names that
    /// are not valid UTF-8 are moved under their raw name; the outcome carries
    /// a lossy rendering.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use easy_cleanup::duplicates::{AlwaysCopy, DuplicatePolicy};
    /// use easy_cleanup::file_organizer::FileOrganizer;
    /// use std::path::Path;
    ///
    /// let report = FileOrganizer::move_file(
    ///     Path::new("/path/to/base"),
    ///     "report.pdf",
    ///     DuplicatePolicy::AutoCopy,
    ///     &mut AlwaysCopy,
    /// );
    /// println!("{} -> {}/{}", report.outcome.source_name, report.outcome.folder, report.outcome.final_name);
    /// ```
    pub fn move_file(
        base_path: &Path,
        file_name: impl AsRef<OsStr>,
        policy: DuplicatePolicy,
        decider: &mut dyn DuplicateDecider,
    ) -> MoveReport {
        let file_name = file_name.as_ref();
        let display = file_name.to_string_lossy();
        let folder = classify_os(file_name);
        let folder_path = base_path.join(&folder);
        let original = base_path.join(file_name);

        // A file called `no_extension` occupies the name of its own folder.
        let staged = if file_name == folder.as_str() && is_non_directory(&original) {
            match stage_self_named(file_name, &original) {
                Ok(staged) => Some(staged),
                Err(e) => {
                    warn!(file = %file_name.to_string_lossy(), error = %e, "Could not free the folder name");
                    return MoveReport {
                        outcome: MoveOutcome::failed(
                            &display,
                            &folder,
                            false,
                            format!("failed to create folder {folder}/: {e}"),
                        ),
                        created_folder: false,
                    };
                }
            }
        } else {
            None
        };
        let source = staged.clone().unwrap_or(original);

        let created_folder = match staged {
            Some(_) => true,
            None => match Self::ensure_folder(&folder_path) {
                Ok(created) => created,
                Err(e) => {
                    warn!(folder = %folder_path.display(), error = %e, "Could not prepare target folder");
                    return MoveReport {
                        outcome: MoveOutcome::failed(
                            &display,
                            &folder,
                            false,
                            format!("failed to create folder {folder}/: {e}"),
                        ),
                        created_folder: false,
                    };
                }
            },
        };

        let resolution = resolve(&folder_path, file_name, policy, decider);
        let collision = resolution.is_collision();
        let (final_name, action) = match resolution {
            Resolution::Free(name) => (name, MoveAction::Moved),
            Resolution::Overwrite(name) => (name, MoveAction::Overwritten),
            Resolution::Renamed(name) => (name, MoveAction::CopyRenamed),
            Resolution::Skip => {
                debug!(file = %file_name.to_string_lossy(), folder = %folder, "Skipped on collision");
                let created_folder = created_folder && !unstage(staged.as_deref(), &folder_path);
                return MoveReport {
                    outcome: MoveOutcome {
                        source_name: display.to_string(),
                        folder,
                        final_name: display.to_string(),
                        collision,
                        action: MoveAction::Skipped,
                    },
                    created_folder,
                };
            }
        };

        let destination = folder_path.join(&final_name);
        match relocate(&source, &destination) {
            Ok(()) => {
                debug!(
                    source = %source.display(),
                    destination = %destination.display(),
                    ?action,
                    "Moved file"
                );
                MoveReport {
                    outcome: MoveOutcome {
                        source_name: display.to_string(),
                        folder,
                        final_name: final_name.to_string_lossy().into_owned(),
                        collision,
                        action,
                    },
                    created_folder,
                }
            }
            Err(e) => {
                warn!(source = %source.display(), error = %e, "Move failed");
                let created_folder = created_folder && !unstage(staged.as_deref(), &folder_path);
                MoveReport {
                    outcome: MoveOutcome::failed(
                        &display,
                        &folder,
                        collision,
                        format!("failed to move to {}: {e}", destination.display()),
                    ),
                    created_folder,
                }
            }
        }
    }

    /// Creates `folder_path` if it does not exist. Returns true if it was created.
    fn ensure_folder(folder_path: &Path) -> io::Result<bool> {
        match fs::metadata(folder_path) {
            Ok(meta) if meta.is_dir() => Ok(false),
            Ok(_) => Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                "a non-directory entry already uses this name",
            )),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                fs::create_dir(folder_path)?;
                Ok(true)
            }
            Err(e) => Err(e),
        }
    }
}

fn is_non_directory(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok_and(|meta| !meta.is_dir())
}

/// Hidden sibling name used while a file is in transit: `.{name}.{id}.{tag}`.
fn staging_path(path: &Path, tag: &str) -> PathBuf {
    let mut name = OsString::from(".");
    name.push(path.file_name().unwrap_or_default());
    name.push(format!(".{}.{tag}", Uuid::new_v4().simple()));
    path.with_file_name(name)
}

/// Moves the file at `path` aside and creates a folder under its name.
/// Returns where the file now is.
fn stage_self_named(file_name: &OsStr, path: &Path) -> io::Result<PathBuf> {
    let staged = staging_path(path, "tmp");
    fs::rename(path, &staged)?;
    if let Err(e) = fs::create_dir(path) {
        if let Err(restore_err) = fs::rename(&staged, path) {
            warn!(
                file = ?file_name,
                staged = %staged.display(),
                error = %restore_err,
                "Could not restore file after failed folder creation"
            );
        }
        return Err(e);
    }
    debug!(file = ?file_name, staged = %staged.display(), "Freed folder name");
    Ok(staged)
}

/// Puts a staged file back under its folder's name after the move was
/// abandoned. Returns true if the folder was removed again.
fn unstage(staged: Option<&Path>, folder_path: &Path) -> bool {
    let Some(staged) = staged else {
        return false;
    };
    let restored = fs::remove_dir(folder_path).and_then(|()| fs::rename(staged, folder_path));
    match restored {
        Ok(()) => true,
        Err(e) => {
            warn!(staged = %staged.display(), error = %e, "Could not put file back");
            false
        }
    }
}

/// Renames `source` to `destination`, falling back to [`copy_then_remove`]
/// when the two live on different devices.
fn relocate(source: &Path, destination: &Path) -> io::Result<()> {
    match fs::rename(source, destination) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            debug!(source = %source.display(), "Rename crosses devices, copying instead");
            copy_then_remove(source, destination)
        }
        Err(e) => Err(e),
    }
}

/// Moves `source` to `destination` by copying.
///
/// The copy is written to a hidden name next to `destination` and renamed over
/// it only after `source` is gone, so an existing destination survives any
/// failure before that point and the file never ends up in both places.
pub(crate) fn copy_then_remove(source: &Path, destination: &Path) -> io::Result<()> {
    let partial = staging_path(destination, "partial");
    if let Err(e) = fs::copy(source, &partial) {
        discard(&partial);
        return Err(e);
    }
    if let Err(e) = fs::remove_file(source) {
        discard(&partial);
        return Err(e);
    }
    fs::rename(&partial, destination).inspect_err(|e| {
        warn!(
            copy = %partial.display(),
            destination = %destination.display(),
            error = %e,
            "Copied file could not be renamed into place"
        );
    })
}

fn discard(path: &Path) {
    if let Err(e) = fs::remove_file(path)
        && e.kind() != io::ErrorKind::NotFound
    {
        warn!(path = %path.display(), error = %e, "Could not remove partial copy");
    }
}
