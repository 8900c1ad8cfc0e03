//! Command-line interface for easy-cleanup.
//!
//! This module handles:
//! - Argument parsing with `clap`
//! - Loading configuration and building the [`Orchestrator`]
//! - Answering duplicate prompts from stdin
//! - Rendering results as styled text or JSON

use crate::config::Config;
use crate::duplicates::{AlwaysCopy, DuplicateDecider, DuplicateDecision, DuplicatePolicy};
use crate::fingerprint::fingerprint_directory;
use crate::orchestrator::{Orchestrator, RunObserver};
use crate::output::{OutputFormatter, ProgressObserver};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

/// Sort the files of a directory into one folder per extension.
#[derive(Debug, Parser)]
#[command(name = "easy-cleanup", version, about)]
pub struct Cli {
    /// Print debug diagnostics to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file to use instead of the default lookup.
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Represents a CLI command to execute.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Move every top-level file into the folder named after its extension.
    Organize {
        /// Directory to organize.
        dir: PathBuf,
        /// Show what would be moved without changing anything.
        #[arg(long)]
        dry_run: bool,
        /// Replace files that already exist at the destination.
        #[arg(long, conflicts_with = "prompt")]
        overwrite: bool,
        /// Ask for every file whose destination name is taken.
        #[arg(long)]
        prompt: bool,
        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Check that every file sits in the folder matching its extension.
    Verify {
        dir: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Print a fingerprint of the directory's current contents.
    State {
        dir: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Show runs recorded in the directory's log.
    Log {
        dir: PathBuf,
        /// Only show the most recent N runs.
        #[arg(long, value_name = "N")]
        last: Option<usize>,
    },
}

impl Command {
    /// Collision policy requested on the command line, if any.
    fn policy_override(&self) -> Option<DuplicatePolicy> {
        match self {
            Command::Organize { overwrite: true, .. } => Some(DuplicatePolicy::Overwrite),
            Command::Organize { prompt: true, .. } => Some(DuplicatePolicy::Prompt),
            _ => None,
        }
    }
}

/// Answers duplicate prompts by reading `o`, `c` or `s` lines from `input`.
///
/// Questions go to stderr so JSON on stdout stays parseable. End of input
/// answers skip.
pub struct PromptDecider<R> {
    input: R,
}

impl<R: BufRead> PromptDecider<R> {
    pub fn new(input: R) -> Self {
        Self { input }
    }
}

impl<R: BufRead> DuplicateDecider for PromptDecider<R> {
    fn decide(&mut self, destination: &Path) -> DuplicateDecision {
        loop {
            eprint!(
                "{} already exists. [o]verwrite, [c]opy, [s]kip? ",
                destination.display()
            );
            let _ = io::stderr().flush();

            let mut line = String::new();
            match self.input.read_line(&mut line) {
                Ok(0) | Err(_) => return DuplicateDecision::Skip,
                Ok(_) => {}
            }
            if let Some(decision) = parse_decision(&line) {
                return decision;
            }
            eprintln!("Please answer o, c or s.");
        }
    }
}

fn parse_decision(answer: &str) -> Option<DuplicateDecision> {
    match answer.trim().to_lowercase().as_str() {
        "o" | "overwrite" => Some(DuplicateDecision::Overwrite),
        "c" | "copy" => Some(DuplicateDecision::Copy),
        "s" | "skip" => Some(DuplicateDecision::Skip),
        _ => None,
    }
}

/// Runs the CLI application with the given command.
///
/// Returns `Err` only when the command could not start (bad configuration,
/// missing or unreadable directory). A run that completed with failed moves
/// prints them and returns `Ok`.
///
/// # Examples
///
/// ```no_run
/// use easy_cleanup::cli::{run_cli, Command};
/// use std::path::PathBuf;
///
/// let command = Command::Verify { dir: PathBuf::from("/path/to/directory"), json: false };
/// if let Err(e) = run_cli(command, None) {
///     eprintln!("Error: {}", e);
/// }
/// ```
pub fn run_cli(command: Command, config_path: Option<&Path>) -> Result<(), String> {
    let config =
        Config::load(config_path).map_err(|e| format!("Error loading configuration: {}", e))?;

    match command {
        Command::Organize {
            ref dir,
            dry_run,
            json,
            ..
        } => {
            let mut orchestrator = build_orchestrator(dir, &config)?;
            if let Some(policy) = command.policy_override() {
                orchestrator = orchestrator.with_policy(policy);
            }
            if dry_run {
                organize_dry_run(&orchestrator, json)
            } else {
                organize(&orchestrator, json)
            }
        }
        Command::Verify { dir, json } => {
            let report = build_orchestrator(&dir, &config)?
                .verify()
                .map_err(|e| e.to_string())?;
            if json {
                print_json(&report)
            } else {
                OutputFormatter::verification(&report);
                Ok(())
            }
        }
        Command::State { dir, json } => {
            let fingerprint = fingerprint_directory(&dir).map_err(|e| e.to_string())?;
            if json {
                print_json(&fingerprint)
            } else {
                OutputFormatter::fingerprint(&dir, &fingerprint);
                Ok(())
            }
        }
        Command::Log { dir, last } => {
            let orchestrator = build_orchestrator(&dir, &config)?;
            let runs = orchestrator
                .logger()
                .read_runs(&dir)
                .map_err(|e| e.to_string())?;
            let skip = last.map_or(0, |n| runs.len().saturating_sub(n));
            OutputFormatter::logged_runs(&runs[skip..]);
            Ok(())
        }
    }
}

fn build_orchestrator(dir: &Path, config: &Config) -> Result<Orchestrator, String> {
    Orchestrator::from_config(dir, config).map_err(|e| format!("Error compiling filters: {}", e))
}

/// Organizes the directory, asking on stdin for collisions under `Prompt`.
fn organize(orchestrator: &Orchestrator, json: bool) -> Result<(), String> {
    let prompting = orchestrator.policy() == DuplicatePolicy::Prompt;
    let mut decider: Box<dyn DuplicateDecider> = if prompting {
        Box::new(PromptDecider::new(io::stdin().lock()))
    } else {
        Box::new(AlwaysCopy)
    };

    // The progress bar would fight with prompts and JSON for the terminal.
    let mut progress = ProgressObserver::default();
    let mut quiet = ();
    let observer: &mut dyn RunObserver = if prompting || json {
        &mut quiet
    } else {
        &mut progress
    };

    let record = orchestrator
        .run_with(decider.as_mut(), observer)
        .map_err(|e| e.to_string())?;

    if json {
        return print_json(&record);
    }

    OutputFormatter::run_record(&record);
    if record.failure_count() > 0 {
        OutputFormatter::error("Some files could not be organized. Please review errors above.");
    }
    Ok(())
}

fn organize_dry_run(orchestrator: &Orchestrator, json: bool) -> Result<(), String> {
    let plan = orchestrator.plan().map_err(|e| e.to_string())?;
    if json {
        return print_json(&plan);
    }
    OutputFormatter::plan(orchestrator.directory(), &plan);
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), String> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Error serializing output: {}", e))?;
    println!("{}", text);
    Ok(())
}
