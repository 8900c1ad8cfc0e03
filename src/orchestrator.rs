//! Sequencing of a complete organization run.
//!
//! A run moves through [`RunPhase::Scanning`], `Moving`, `Verifying`,
//! `Logging` and ends in `Done`. Only a target that cannot be scanned ends the
//! run in `Failed`; every later problem is collected into the [`RunRecord`].
//!
//! The orchestrator holds no lock. Hosts that may start runs concurrently must
//! serialize them per directory, for example with [`crate::session::RunGate`].
use crate::classify::classify_os;
use crate::config::{CompiledFilters, Config, ConfigError};
use crate::duplicates::{AlwaysCopy, DuplicateDecider, DuplicatePolicy, resolve_with};
use crate::error::{OrganizeError, OrganizeResult};
use crate::file_organizer::{FileOrganizer, MoveOutcome};
use crate::record::RunRecord;
use crate::run_log::RunLogger;
use crate::verify::{VerificationReport, verify_organization};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Stage of an organization run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunPhase {
    Scanning,
    Moving,
    Verifying,
    Logging,
    Done,
    Failed,
}

/// Receives progress notifications during a run. All methods default to no-ops.
pub trait RunObserver {
    fn phase_changed(&mut self, _phase: RunPhase) {}

    /// Called once scanning finishes, with the number of files to process.
    fn scanned(&mut self, _total: usize) {}

    fn file_processed(&mut self, _outcome: &MoveOutcome) {}
}

impl RunObserver for () {}

/// A top-level file selected for organization.
#[derive(Debug, Clone)]
struct Candidate {
    /// Name on disk, possibly not valid UTF-8.
    name: OsString,
    /// Lossy rendering of `name` for records and filters.
    display: String,
    folder: String,
}

/// A move that a run would perform, computed without touching the disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedMove {
    pub source_name: String,
    pub folder: String,
    pub final_name: String,
    pub collision: bool,
    pub folder_exists: bool,
}

/// Runs organization against one target directory.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    directory: PathBuf,
    policy: DuplicatePolicy,
    filters: CompiledFilters,
    logger: RunLogger,
}

impl Orchestrator {
    /// Creates an orchestrator with the default policy, no filters and the
    /// default log file.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            policy: DuplicatePolicy::default(),
            filters: CompiledFilters::default(),
            logger: RunLogger::default(),
        }
    }

    /// Creates an orchestrator configured from `config`.
    pub fn from_config(directory: impl Into<PathBuf>, config: &Config) -> Result<Self, ConfigError> {
        Ok(Self::new(directory)
            .with_policy(config.organize.duplicates)
            .with_filters(config.filters.compile()?)
            .with_logger(RunLogger::new(config.organize.log_file.clone())))
    }

    pub fn with_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_filters(mut self, filters: CompiledFilters) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_logger(mut self, logger: RunLogger) -> Self {
        self.logger = logger;
        self
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    pub fn logger(&self) -> &RunLogger {
        &self.logger
    }

    /// Names at the top level that are neither moved nor reported by verification.
    fn is_exempt(&self, name: &str) -> bool {
        name == self.logger.file_name() || !self.filters.should_include(name)
    }

    /// Runs without a front end. Under `Prompt`, every collision is answered
    /// with copy.
    pub fn run(&self) -> OrganizeResult<RunRecord> {
        self.run_with(&mut AlwaysCopy, &mut ())
    }

    /// Runs the full sequence, consulting `decider` for collisions under the
    /// `Prompt` policy and reporting progress to `observer`.
    ///
    /// # Errors
    ///
    /// Returns [`OrganizeError::InvalidTarget`] if the directory cannot be
    /// scanned. Nothing has been modified in that case.
    pub fn run_with(
        &self,
        decider: &mut dyn DuplicateDecider,
        observer: &mut dyn RunObserver,
    ) -> OrganizeResult<RunRecord> {
        observer.phase_changed(RunPhase::Scanning);
        let candidates = match self.scan() {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(directory = %self.directory.display(), error = %e, "Run failed before any change");
                observer.phase_changed(RunPhase::Failed);
                return Err(e);
            }
        };
        let mut record = RunRecord::new(self.directory.clone());
        record.total_files = candidates.len();
        observer.scanned(record.total_files);
        info!(
            directory = %self.directory.display(),
            files = record.total_files,
            policy = ?self.policy,
            "Organizing directory"
        );

        observer.phase_changed(RunPhase::Moving);
        for candidate in &candidates {
            let report =
                FileOrganizer::move_file(&self.directory, &candidate.name, self.policy, decider);
            observer.file_processed(&report.outcome);
            record.record(report.outcome, report.created_folder);
        }

        observer.phase_changed(RunPhase::Verifying);
        record.verification = match verify_organization(&self.directory, |n| self.is_exempt(n)) {
            Ok(report) => report,
            Err(e) => {
                record
                    .warnings
                    .push(format!("verification could not complete: {e}"));
                VerificationReport::default()
            }
        };

        observer.phase_changed(RunPhase::Logging);
        if let Err(e) = self.logger.append(&self.directory, &record) {
            warn!(error = %e, "Could not append to run log");
            record.warnings.push(format!(
                "could not write {}: {e}",
                self.logger.log_path(&self.directory).display()
            ));
        }

        observer.phase_changed(RunPhase::Done);
        info!(
            moved = record.moved_count(),
            failed = record.failure_count(),
            verified = record.verification.passed,
            "Run finished"
        );
        Ok(record)
    }

    /// Verifies the directory without moving anything.
    pub fn verify(&self) -> OrganizeResult<VerificationReport> {
        verify_organization(&self.directory, |n| self.is_exempt(n))
    }

    /// Computes the moves a run would perform right now, without modifying
    /// anything. `Prompt` is planned as copy.
    pub fn plan(&self) -> OrganizeResult<Vec<PlannedMove>> {
        let candidates = self.scan()?;
        let mut taken_by_folder: HashMap<String, (bool, HashSet<OsString>)> = HashMap::new();
        let mut planned = Vec::with_capacity(candidates.len());

        for candidate in candidates {
            let (folder_exists, taken) = taken_by_folder
                .entry(candidate.folder.clone())
                .or_insert_with(|| self.existing_names(&candidate.folder));
            let destination = self.directory.join(&candidate.folder).join(&candidate.name);
            let resolution = resolve_with(
                &candidate.name,
                self.policy,
                &mut AlwaysCopy,
                &destination,
                |n| taken.contains(n),
            );
            let collision = resolution.is_collision();
            let Some(final_name) = resolution.final_name().map(|n| n.to_os_string()) else {
                continue;
            };
            let final_display = final_name.to_string_lossy().into_owned();
            taken.insert(final_name);
            planned.push(PlannedMove {
                source_name: candidate.display,
                folder: candidate.folder,
                final_name: final_display,
                collision,
                folder_exists: *folder_exists,
            });
        }
        Ok(planned)
    }

    fn existing_names(&self, folder: &str) -> (bool, HashSet<OsString>) {
        match fs::read_dir(self.directory.join(folder)) {
            Ok(entries) => (true, entries.flatten().map(|e| e.file_name()).collect()),
            Err(_) => (false, HashSet::new()),
        }
    }

    /// Lists movable top-level files: regular, non-hidden, not the run log,
    /// not filtered out. Directories are never movable.
    ///
    /// Files are ordered by name, except that a file whose name equals a folder
    /// this run must create is moved first so the folder can be created.
    /// Names that are not valid UTF-8 are kept raw and filtered by their lossy
    /// rendering.
    fn scan(&self) -> OrganizeResult<Vec<Candidate>> {
        let metadata = fs::metadata(&self.directory)
            .map_err(|e| OrganizeError::invalid_target(&self.directory, e.to_string()))?;
        if !metadata.is_dir() {
            return Err(OrganizeError::invalid_target(
                &self.directory,
                "not a directory",
            ));
        }
        let entries = fs::read_dir(&self.directory)
            .map_err(|e| OrganizeError::invalid_target(&self.directory, e.to_string()))?;

        let mut candidates = Vec::new();
        for entry in entries.flatten() {
            if !entry.file_type().is_ok_and(|t| t.is_file()) {
                continue;
            }
            let name = entry.file_name();
            let display = name.to_string_lossy().into_owned();
            if self.is_exempt(&display) {
                debug!(file = %name.to_string_lossy(), "Left in place");
                continue;
            }
            candidates.push(Candidate {
                folder: classify_os(&name),
                name,
                display,
            });
        }

        let needed: HashSet<&str> = candidates.iter().map(|c| c.folder.as_str()).collect();
        let blocks_folder: HashSet<OsString> = candidates
            .iter()
            .filter(|c| c.name.to_str().is_some_and(|n| needed.contains(n)))
            .map(|c| c.name.clone())
            .collect();
        candidates.sort_by(|a, b| {
            let a_later = !blocks_folder.contains(&a.name);
            let b_later = !blocks_folder.contains(&b.name);
            a_later.cmp(&b_later).then_with(|| a.name.cmp(&b.name))
        });
        Ok(candidates)
    }
}
