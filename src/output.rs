//! Output formatting and styling for the command line.
//!
//! All terminal rendering of run records, plans, verification reports and
//! fingerprints goes through [`OutputFormatter`], so the engine itself never
//! prints.

use crate::file_organizer::{MoveAction, MoveOutcome};
use crate::fingerprint::DirectoryFingerprint;
use crate::orchestrator::{PlannedMove, RunObserver, RunPhase};
use crate::record::RunRecord;
use crate::run_log::LoggedRun;
use crate::verify::VerificationReport;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;

/// Manages all CLI output with consistent styling.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Creates a progress bar for the move phase of a run.
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        // The template is a literal; fall back to the default style if it ever fails to parse.
        let style = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░");
        pb.set_style(style);
        pb
    }

    /// Prints the per-folder result of a run followed by verification and totals.
    pub fn run_record(record: &RunRecord) {
        Self::header(&format!("Organized {}", record.directory.display()));

        if record.folders.is_empty() {
            Self::info("→ No files to organize");
        }

        for folder in &record.folders {
            let status = if folder.is_new {
                "NEW".green().bold()
            } else {
                "EXISTING".blue()
            };
            println!("\n[{}/] {}", folder.name.bold(), status);
            for outcome in &folder.moves {
                Self::move_line(outcome);
            }
        }

        Self::verification(&record.verification);

        for warning in &record.warnings {
            Self::warning(warning);
        }

        Self::header("SUMMARY");
        println!(
            "{:<10} | {}",
            "Processed",
            record.total_files.to_string().bold()
        );
        println!("{:<10} | {}", "Moved", record.moved_count().to_string().green());
        let failed = record.failure_count();
        let failed_text = if failed > 0 {
            failed.to_string().red()
        } else {
            failed.to_string().normal()
        };
        println!("{:<10} | {}", "Failed", failed_text);
        println!("{:<10} | {}", "Run id", record.id);
    }

    fn move_line(outcome: &MoveOutcome) {
        match &outcome.action {
            MoveAction::Moved => println!("  → {}", outcome.final_name),
            MoveAction::CopyRenamed => println!(
                "  → {} {}",
                outcome.final_name,
                format!("(renamed from {})", outcome.source_name).yellow()
            ),
            MoveAction::Overwritten => {
                println!("  → {} {}", outcome.final_name, "(replaced existing)".yellow())
            }
            MoveAction::Skipped => println!(
                "  {} {} {}",
                "-".dimmed(),
                outcome.source_name,
                "(skipped)".dimmed()
            ),
            MoveAction::Failed { reason } => {
                println!("  {} {}: {}", "✗".red(), outcome.source_name, reason.red())
            }
        }
    }

    /// Prints a verification report.
    pub fn verification(report: &VerificationReport) {
        Self::header("Verification");
        if report.passed {
            Self::success("All files organized correctly");
            return;
        }
        Self::error("Issues found:");
        for mismatch in &report.mismatches {
            println!(
                "  • {} (should be in {}/)",
                mismatch.path.display(),
                mismatch.expected_folder
            );
        }
    }

    /// Prints a dry-run plan with a per-folder count.
    pub fn plan(directory: &Path, plan: &[PlannedMove]) {
        Self::dry_run_notice(&format!("Analyzing contents of: {}", directory.display()));
        if plan.is_empty() {
            println!("No files to organize.");
            return;
        }

        for planned in plan {
            let folder_note = if planned.folder_exists { "" } else { " (new folder)" };
            let rename_note = if planned.source_name != planned.final_name {
                format!(" as {}", planned.final_name)
            } else if planned.collision {
                " (replacing existing)".to_string()
            } else {
                String::new()
            };
            println!(
                " - {} → {}/{}{}",
                planned.source_name, planned.folder, folder_note, rename_note
            );
        }

        let mut folders: Vec<&str> = plan.iter().map(|p| p.folder.as_str()).collect();
        folders.sort_unstable();
        folders.dedup();
        Self::header("DRY RUN SUMMARY");
        for folder in folders {
            let count = plan.iter().filter(|p| p.folder == folder).count();
            let file_word = if count == 1 { "file" } else { "files" };
            println!("  {}/: {} {}", folder, count.to_string().green(), file_word);
        }
        Self::dry_run_notice("No files were modified.");
    }

    /// Prints a directory fingerprint.
    pub fn fingerprint(directory: &Path, fingerprint: &DirectoryFingerprint) {
        println!("{}", directory.display().to_string().bold());
        println!("  digest:  {}", fingerprint.digest.cyan());
        println!("  files:   {}", fingerprint.file_count);
        println!("  folders: {}", fingerprint.folder_count);
    }

    /// Prints logged runs, most recent last.
    pub fn logged_runs(runs: &[LoggedRun]) {
        if runs.is_empty() {
            Self::info("No runs logged for this directory.");
            return;
        }
        for run in runs {
            println!("\n{}", run.header.bold());
            for line in &run.lines {
                println!("{}", line);
            }
        }
    }

    /// Prints a dry-run notice message.
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }
}

/// Drives a progress bar from run notifications.
#[derive(Default)]
pub struct ProgressObserver {
    bar: Option<ProgressBar>,
}

impl RunObserver for ProgressObserver {
    fn scanned(&mut self, total: usize) {
        if total > 0 {
            self.bar = Some(OutputFormatter::create_progress_bar(total as u64));
        }
    }

    fn file_processed(&mut self, outcome: &MoveOutcome) {
        if let Some(bar) = &self.bar {
            bar.set_message(outcome.source_name.clone());
            bar.inc(1);
        }
    }

    fn phase_changed(&mut self, phase: RunPhase) {
        if phase == RunPhase::Verifying
            && let Some(bar) = self.bar.take()
        {
            bar.finish_and_clear();
        }
    }
}
