//! Collision handling when a file's destination name is already taken.
//!
//! Three policies are supported. `AutoCopy` and `Overwrite` are decided by the
//! engine alone; `Prompt` delegates each collision to a [`DuplicateDecider`]
//! supplied by the front end, which may block on user input.

use crate::classify::split_for_suffix;
use serde::{Deserialize, Serialize};
use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::Path;
use tracing::debug;

const COPY_SUFFIX: &str = "_copy";

/// How to handle a destination name that already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// Ask the front end for every collision.
    Prompt,
    /// Place the file under the first free `name_copyN.ext`.
    #[default]
    AutoCopy,
    /// Replace the existing file.
    Overwrite,
}

/// Answer given by a front end for a single collision under `Prompt`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateDecision {
    Overwrite,
    Copy,
    Skip,
}

/// Decision hook fulfilled by the front end for the `Prompt` policy.
///
/// Called synchronously with the destination path that already exists.
pub trait DuplicateDecider {
    fn decide(&mut self, destination: &Path) -> DuplicateDecision;
}

impl<F> DuplicateDecider for F
where
    F: FnMut(&Path) -> DuplicateDecision,
{
    fn decide(&mut self, destination: &Path) -> DuplicateDecision {
        self(destination)
    }
}

/// Decider for unattended hosts: always answers copy.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysCopy;

impl DuplicateDecider for AlwaysCopy {
    fn decide(&mut self, _destination: &Path) -> DuplicateDecision {
        DuplicateDecision::Copy
    }
}

/// Final placement chosen for a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// No collision; the desired name is free.
    Free(OsString),
    /// Collision; the existing file is replaced.
    Overwrite(OsString),
    /// Collision; the file is placed under a fresh copy name.
    Renamed(OsString),
    /// Collision; the file stays where it is.
    Skip,
}

impl Resolution {
    /// Name the file will be placed under, if it is placed at all.
    pub fn final_name(&self) -> Option<&OsStr> {
        match self {
            Self::Free(name) | Self::Overwrite(name) | Self::Renamed(name) => Some(name),
            Self::Skip => None,
        }
    }

    pub fn is_collision(&self) -> bool {
        !matches!(self, Self::Free(_))
    }
}

/// Builds the copy name for the given index: `x.txt` → `x_copy2.txt`.
///
/// Works on raw names, so bytes that are not valid UTF-8 are kept as they are.
pub fn copy_name(name: &OsStr, index: u64) -> OsString {
    let (stem, extension) = split_for_suffix(name);
    let mut copy = stem.to_os_string();
    copy.push(format!("{COPY_SUFFIX}{index}"));
    if let Some(extension) = extension {
        copy.push(".");
        copy.push(extension);
    }
    copy
}

/// Tries `name_copy1`, `name_copy2`, ... and returns the first name for which
/// `taken` is false.
///
/// There is no upper bound on the search: a folder holding a very long
/// contiguous run of copies makes this linear in that run's length.
pub fn next_copy_name(name: &OsStr, mut taken: impl FnMut(&OsStr) -> bool) -> OsString {
    let mut index = 1u64;
    loop {
        let candidate = copy_name(name, index);
        if !taken(&candidate) {
            return candidate;
        }
        index += 1;
    }
}

/// Resolves the placement of `name` given a predicate telling which names are
/// already taken in the destination folder.
///
/// `decider` is consulted only under [`DuplicatePolicy::Prompt`] and only when
/// a collision exists.
pub fn resolve_with(
    name: &OsStr,
    policy: DuplicatePolicy,
    decider: &mut dyn DuplicateDecider,
    destination: &Path,
    mut taken: impl FnMut(&OsStr) -> bool,
) -> Resolution {
    if !taken(name) {
        return Resolution::Free(name.to_os_string());
    }

    let decision = match policy {
        DuplicatePolicy::AutoCopy => DuplicateDecision::Copy,
        DuplicatePolicy::Overwrite => DuplicateDecision::Overwrite,
        DuplicatePolicy::Prompt => decider.decide(destination),
    };
    debug!(?name, ?policy, ?decision, "Destination name already taken");

    match decision {
        DuplicateDecision::Overwrite => Resolution::Overwrite(name.to_os_string()),
        DuplicateDecision::Copy => Resolution::Renamed(next_copy_name(name, taken)),
        DuplicateDecision::Skip => Resolution::Skip,
    }
}

/// Resolves the placement of `name` inside `folder` on disk.
///
/// A name counts as taken if anything exists under it, including a dangling
/// symlink or a directory.
pub fn resolve(
    folder: &Path,
    name: &OsStr,
    policy: DuplicatePolicy,
    decider: &mut dyn DuplicateDecider,
) -> Resolution {
    let destination = folder.join(name);
    resolve_with(name, policy, decider, &destination, |candidate| {
        fs::symlink_metadata(folder.join(candidate)).is_ok()
    })
}
