//! The result of one organization run, as handed to every front end.
use crate::file_organizer::MoveOutcome;
use crate::verify::VerificationReport;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Files that went to one target folder during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderOutcome {
    pub name: String,
    /// Whether this run created the folder.
    pub is_new: bool,
    /// In processing order.
    pub moves: Vec<MoveOutcome>,
}

impl FolderOutcome {
    /// Final names of the files that were placed in this folder.
    pub fn placed_names(&self) -> Vec<&str> {
        self.moves
            .iter()
            .filter(|m| m.is_placed())
            .map(|m| m.final_name.as_str())
            .collect()
    }
}

/// Summary of one organization run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub id: Uuid,
    pub timestamp: DateTime<Local>,
    pub directory: PathBuf,
    /// Sorted by folder name.
    pub folders: Vec<FolderOutcome>,
    pub verification: VerificationReport,
    /// Number of entries handed to the mover.
    pub total_files: usize,
    /// Non-fatal problems that are not tied to a single file, such as a log
    /// that could not be written.
    pub warnings: Vec<String>,
}

impl RunRecord {
    pub(crate) fn new(directory: PathBuf) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Local::now(),
            directory,
            folders: Vec::new(),
            verification: VerificationReport::default(),
            total_files: 0,
            warnings: Vec::new(),
        }
    }

    /// Appends an outcome under its folder, keeping folders sorted by name.
    pub(crate) fn record(&mut self, outcome: MoveOutcome, created_folder: bool) {
        let idx = match self
            .folders
            .binary_search_by(|f| f.name.cmp(&outcome.folder))
        {
            Ok(idx) => idx,
            Err(idx) => {
                self.folders.insert(
                    idx,
                    FolderOutcome {
                        name: outcome.folder.clone(),
                        is_new: false,
                        moves: Vec::new(),
                    },
                );
                idx
            }
        };
        let folder = &mut self.folders[idx];
        folder.is_new |= created_folder;
        folder.moves.push(outcome);
    }

    pub fn outcomes(&self) -> impl Iterator<Item = &MoveOutcome> {
        self.folders.iter().flat_map(|f| f.moves.iter())
    }

    pub fn folder(&self, name: &str) -> Option<&FolderOutcome> {
        self.folders.iter().find(|f| f.name == name)
    }

    /// Number of files that ended up inside a target folder.
    pub fn moved_count(&self) -> usize {
        self.outcomes().filter(|m| m.is_placed()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.outcomes().filter(|m| m.is_failure()).count()
    }

    /// True if the run finished but something needs the user's attention.
    pub fn has_problems(&self) -> bool {
        self.failure_count() > 0 || !self.verification.passed || !self.warnings.is_empty()
    }
}
