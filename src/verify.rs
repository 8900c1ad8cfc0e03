//! Post-run verification of an organized directory.
//!
//! The check is read-only: it lists the top level and each folder one level
//! deep, and reports every non-hidden file that is not where its extension
//! says it should be.
use crate::classify::{classify, is_hidden};
use crate::error::{OrganizeError, OrganizeResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A file found outside the folder its name classifies to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Misplacement {
    pub path: PathBuf,
    /// Folder the file should be in.
    pub expected_folder: String,
}

/// Outcome of a verification pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub passed: bool,
    /// Sorted by path.
    pub mismatches: Vec<Misplacement>,
}

impl VerificationReport {
    pub fn mismatched_paths(&self) -> Vec<&Path> {
        self.mismatches.iter().map(|m| m.path.as_path()).collect()
    }
}

/// Verifies that every file under `directory` sits in its extension folder.
///
/// Top-level files are allowed only if hidden or if `exempt` returns true for
/// their name (the run log, files excluded by configuration). Files inside a
/// folder must classify to that folder's name; hidden files and anything
/// nested deeper are not inspected.
pub fn verify_organization(
    directory: &Path,
    exempt: impl Fn(&str) -> bool,
) -> OrganizeResult<VerificationReport> {
    let entries = fs::read_dir(directory)
        .map_err(|e| OrganizeError::invalid_target(directory, e.to_string()))?;

    let mut mismatches = Vec::new();

    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().into_owned();
        if is_hidden(&name) {
            continue;
        }
        let Ok(file_type) = entry.file_type() else {
            continue;
        };

        if file_type.is_dir() {
            check_folder(&entry.path(), &name, &mut mismatches);
        } else if file_type.is_file() && !exempt(&name) {
            mismatches.push(Misplacement {
                path: entry.path(),
                expected_folder: classify(&name),
            });
        }
    }

    mismatches.sort();
    let report = VerificationReport {
        passed: mismatches.is_empty(),
        mismatches,
    };
    debug!(
        directory = %directory.display(),
        passed = report.passed,
        mismatches = report.mismatches.len(),
        "Verification finished"
    );
    Ok(report)
}

fn check_folder(folder_path: &Path, folder_name: &str, mismatches: &mut Vec<Misplacement>) {
    let entries = match fs::read_dir(folder_path) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(folder = %folder_path.display(), error = %e, "Could not list folder during verification");
            return;
        }
    };

    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().into_owned();
        if is_hidden(&name) {
            continue;
        }
        if !entry.file_type().is_ok_and(|t| t.is_file()) {
            continue;
        }
        let expected = classify(&name);
        if expected != folder_name {
            mismatches.push(Misplacement {
                path: entry.path(),
                expected_folder: expected,
            });
        }
    }
}
