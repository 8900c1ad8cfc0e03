//! easy-cleanup - sort the files of a directory into one folder per extension
//!
//! This library scans a directory, moves every top-level file into a
//! subfolder named after its lowercased extension, resolves name collisions
//! under a configurable policy, verifies the result, and appends a
//! human-readable record of each run to a log inside the directory.

pub mod classify;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod file_organizer;
pub mod fingerprint;
pub mod logging;
pub mod orchestrator;
pub mod output;
pub mod record;
pub mod run_log;
pub mod session;
pub mod verify;

pub use classify::{FALLBACK_FOLDER, classify, classify_os, extension_of, is_hidden};
pub use config::{CompiledFilters, Config, ConfigError};
pub use duplicates::{DuplicateDecider, DuplicateDecision, DuplicatePolicy};
pub use error::{OrganizeError, OrganizeResult};
pub use file_organizer::{FileOrganizer, MoveAction, MoveOutcome};
pub use fingerprint::{DirectoryFingerprint, fingerprint_directory};
pub use orchestrator::{Orchestrator, PlannedMove, RunObserver, RunPhase};
pub use record::{FolderOutcome, RunRecord};
pub use run_log::{LoggedRun, RunLogger};
pub use session::{ResultCache, RunGate};
pub use verify::{Misplacement, VerificationReport, verify_organization};

pub use cli::{Command, run_cli};
