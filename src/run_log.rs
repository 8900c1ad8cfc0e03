//! Append-only, human-readable log of organization runs.
//!
//! Each run appends one block to a text file inside the target directory:
//!
//! ```text
//! ============================================================
//! [14 Nov 2025 @ 09:30:12] Downloads/
//! ============================================================
//!
//! [pdf/] NEW • 2 file(s)
//!   → a.pdf
//!   → b.PDF
//!
//! Verification: PASSED
//! Run: 0b6f7c1e-...
//! ```
//!
//! Blocks are never rewritten. [`RunLogger::read_runs`] splits the file back
//! into one [`LoggedRun`] per block.
use crate::error::{OrganizeError, OrganizeResult};
use crate::file_organizer::{MoveAction, MoveOutcome};
use crate::record::RunRecord;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::fmt::Write as _;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default name of the log file in the target directory.
pub const DEFAULT_LOG_FILE: &str = "organization_log.txt";

const RULE_WIDTH: usize = 60;
const TIMESTAMP_FORMAT: &str = "%d %b %Y @ %H:%M:%S";

/// One block read back from the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoggedRun {
    /// Header line, e.g. `[14 Nov 2025 @ 09:30:12] Downloads/`.
    pub header: String,
    /// Parsed from the header; `None` if the header was edited by hand.
    pub timestamp: Option<NaiveDateTime>,
    /// Lines after the header, with surrounding blank lines removed.
    pub lines: Vec<String>,
}

/// Writes and reads the run log of one directory.
#[derive(Debug, Clone)]
pub struct RunLogger {
    file_name: String,
}

impl Default for RunLogger {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_FILE)
    }
}

impl RunLogger {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn log_path(&self, directory: &Path) -> PathBuf {
        directory.join(&self.file_name)
    }

    /// Appends the block for `record`, creating the log if absent.
    ///
    /// The block is written with a single call so a failure cannot leave half
    /// a block behind in the common case.
    pub fn append(&self, directory: &Path, record: &RunRecord) -> io::Result<PathBuf> {
        let path = self.log_path(directory);
        let block = format_block(record);
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        file.write_all(block.as_bytes())?;
        file.flush()?;
        debug!(log = %path.display(), run = %record.id, "Appended run to log");
        Ok(path)
    }

    /// Reads every logged run, oldest first. A missing log yields no runs.
    pub fn read_runs(&self, directory: &Path) -> OrganizeResult<Vec<LoggedRun>> {
        let path = self.log_path(directory);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(OrganizeError::LogRead { path, source }),
        };
        Ok(parse_runs(&content))
    }
}

fn rule() -> String {
    "=".repeat(RULE_WIDTH)
}

/// Renders the log block for one run.
pub fn format_block(record: &RunRecord) -> String {
    let mut out = String::new();
    let dir_name = record
        .directory
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| record.directory.display().to_string());

    let _ = writeln!(out);
    let _ = writeln!(out, "{}", rule());
    let _ = writeln!(
        out,
        "[{}] {}/",
        record.timestamp.format(TIMESTAMP_FORMAT),
        dir_name
    );
    let _ = writeln!(out, "{}", rule());

    if record.folders.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "No files to organize.");
    }

    for folder in &record.folders {
        let status = if folder.is_new { "NEW" } else { "EXISTING" };
        let placed: Vec<&MoveOutcome> = {
            let mut placed: Vec<_> = folder.moves.iter().filter(|m| m.is_placed()).collect();
            placed.sort_by(|a, b| a.final_name.cmp(&b.final_name));
            placed
        };

        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "[{}/] {} • {} file(s)",
            folder.name,
            status,
            placed.len()
        );
        for outcome in placed {
            let _ = writeln!(out, "  → {}{}", outcome.final_name, annotation(outcome));
        }
        for outcome in folder.moves.iter().filter(|m| !m.is_placed()) {
            match &outcome.action {
                MoveAction::Skipped => {
                    let _ = writeln!(out, "  - {} (skipped, name taken)", outcome.source_name);
                }
                MoveAction::Failed { reason } => {
                    let _ = writeln!(out, "  ✗ {}: {}", outcome.source_name, reason);
                }
                _ => {}
            }
        }
    }

    let _ = writeln!(out);
    if record.verification.passed {
        let _ = writeln!(out, "Verification: PASSED");
    } else {
        let _ = writeln!(
            out,
            "Verification: FAILED ({} misplaced)",
            record.verification.mismatches.len()
        );
        for mismatch in &record.verification.mismatches {
            let _ = writeln!(
                out,
                "  ! {} (belongs in {}/)",
                mismatch.path.display(),
                mismatch.expected_folder
            );
        }
    }
    let _ = writeln!(out, "Run: {}", record.id);
    out
}

fn annotation(outcome: &MoveOutcome) -> String {
    match outcome.action {
        MoveAction::CopyRenamed => format!(" (renamed from {})", outcome.source_name),
        MoveAction::Overwritten => " (replaced existing)".to_string(),
        _ => String::new(),
    }
}

/// Splits log text into runs. Text before the first block is ignored.
pub fn parse_runs(content: &str) -> Vec<LoggedRun> {
    let rule = rule();
    let lines: Vec<&str> = content.lines().collect();
    let is_block_start = |i: usize| {
        lines[i] == rule
            && lines.get(i + 1).is_some_and(|l| l.starts_with('['))
            && lines.get(i + 2).is_some_and(|l| *l == rule)
    };

    let mut runs = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        if !is_block_start(i) {
            i += 1;
            continue;
        }
        let header = lines[i + 1].to_string();
        let mut j = i + 3;
        while j < lines.len() && !is_block_start(j) {
            j += 1;
        }
        let body = trim_blank(&lines[i + 3..j]);
        runs.push(LoggedRun {
            timestamp: parse_timestamp(&header),
            header,
            lines: body.iter().map(|l| l.to_string()).collect(),
        });
        i = j;
    }
    runs
}

fn trim_blank<'a>(lines: &'a [&'a str]) -> &'a [&'a str] {
    let start = lines
        .iter()
        .position(|l| !l.trim().is_empty())
        .unwrap_or(lines.len());
    let end = lines
        .iter()
        .rposition(|l| !l.trim().is_empty())
        .map_or(start, |p| p + 1);
    &lines[start..end]
}

fn parse_timestamp(header: &str) -> Option<NaiveDateTime> {
    let inner = header.strip_prefix('[')?.split_once(']')?.0;
    NaiveDateTime::parse_from_str(inner, TIMESTAMP_FORMAT).ok()
}
