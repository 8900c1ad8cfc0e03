use easy_cleanup::cli::{Command, run_cli};
/// Integration tests for easy-cleanup
///
/// These tests drive complete runs against temporary directories, through
/// both the library API and the command-line entry point.
///
/// Test categories:
/// 1. Basic organization workflows
/// 2. Duplicate handling
/// 3. Verification and directory state
/// 4. Dry-run mode
/// 5. Configuration and filtering
/// 6. Run log and error scenarios
use easy_cleanup::{
    DuplicateDecision, DuplicatePolicy, MoveAction, Orchestrator, OrganizeError, RunLogger,
    fingerprint_directory,
};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const LOG_FILE: &str = "organization_log.txt";

// ============================================================================
// Test Utilities
// ============================================================================

/// A test fixture that sets up a temporary directory with configurable
/// file structure for testing.
struct TestFixture {
    temp_dir: TempDir,
}

impl TestFixture {
    /// Create a new test fixture with a temporary directory.
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        TestFixture { temp_dir }
    }

    /// Get the path to the test directory.
    fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Create a file with content, relative to the test directory.
    fn create_file(&self, name: &str, content: &[u8]) {
        let file_path = self.path().join(name);
        let mut file = File::create(&file_path).expect("Failed to create file");
        file.write_all(content)
            .expect("Failed to write file content");
    }

    /// Create several empty-ish files at once.
    fn create_files(&self, names: &[&str]) {
        for name in names {
            self.create_file(name, name.as_bytes());
        }
    }

    /// Create a subdirectory in the test directory.
    fn create_subdir(&self, name: &str) {
        let dir_path = self.path().join(name);
        fs::create_dir(&dir_path).expect("Failed to create subdirectory");
    }

    fn read(&self, rel_path: &str) -> String {
        fs::read_to_string(self.path().join(rel_path)).expect("Failed to read file")
    }

    fn assert_dir_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(path.is_dir(), "Directory should exist: {}", path.display());
    }

    fn assert_file_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(path.is_file(), "File should exist: {}", path.display());
    }

    fn assert_file_not_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(!path.exists(), "File should not exist: {}", path.display());
    }

    /// Count top-level files, excluding the run log.
    fn count_files(&self) -> usize {
        fs::read_dir(self.path())
            .expect("Failed to read directory")
            .flatten()
            .filter(|e| e.file_name() != LOG_FILE)
            .filter(|e| e.metadata().is_ok_and(|m| m.is_file()))
            .count()
    }

    /// Count top-level directories.
    fn count_dirs(&self) -> usize {
        fs::read_dir(self.path())
            .expect("Failed to read directory")
            .flatten()
            .filter(|e| e.metadata().is_ok_and(|m| m.is_dir()))
            .count()
    }

    /// List all files recursively, excluding the run log.
    fn list_files_recursive(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();
        Self::walk_dir(self.path(), &mut files);
        files.retain(|p| p.file_name().is_none_or(|n| n != LOG_FILE));
        files.sort();
        files
    }

    fn walk_dir(dir: &Path, files: &mut Vec<PathBuf>) {
        if let Ok(entries) = fs::read_dir(dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_file() {
                    files.push(path);
                } else if path.is_dir() {
                    Self::walk_dir(&path, files);
                }
            }
        }
    }

    fn organize_cli(&self) -> Result<(), String> {
        run_cli(
            Command::Organize {
                dir: self.path().to_path_buf(),
                dry_run: false,
                overwrite: false,
                prompt: false,
                json: false,
            },
            None,
        )
    }
}

// ============================================================================
// Test Suite 1: Basic Organization
// ============================================================================

#[test]
fn test_organize_by_extension_end_to_end() {
    let fixture = TestFixture::new();
    fixture.create_files(&["a.pdf", "b.PDF", "c", ".hidden"]);

    let record = Orchestrator::new(fixture.path())
        .run()
        .expect("Failed to run organization");

    fixture.assert_file_exists("pdf/a.pdf");
    fixture.assert_file_exists("pdf/b.PDF");
    fixture.assert_file_exists("no_extension/c");
    fixture.assert_file_exists(".hidden");
    assert_eq!(fixture.count_files(), 1, "only the hidden file stays");

    let pdf = record.folder("pdf").expect("pdf folder recorded");
    assert!(pdf.is_new);
    assert_eq!(pdf.placed_names(), vec!["a.pdf", "b.PDF"]);
    let fallback = record.folder("no_extension").expect("fallback recorded");
    assert!(fallback.is_new);
    assert_eq!(fallback.placed_names(), vec!["c"]);
    assert!(record.verification.passed);

    let log = fixture.read(LOG_FILE);
    assert!(log.contains("[pdf/] NEW • 2 file(s)"));
    assert!(log.contains("[no_extension/] NEW • 1 file(s)"));
    assert!(log.contains("Verification: PASSED"));
}

#[test]
fn test_organize_empty_directory_still_logs() {
    let fixture = TestFixture::new();

    let result = fixture.organize_cli();

    assert!(result.is_ok(), "Should succeed on empty directory");
    assert_eq!(fixture.count_dirs(), 0, "Should have no subdirectories");
    assert!(fixture.read(LOG_FILE).contains("No files to organize."));
}

#[test]
fn test_second_run_is_a_no_op() {
    let fixture = TestFixture::new();
    fixture.create_files(&["photo.png", "report.pdf", "notes.txt"]);

    Orchestrator::new(fixture.path())
        .run()
        .expect("Failed to run organization");
    let files_after_first = fixture.list_files_recursive();

    let second = Orchestrator::new(fixture.path())
        .run()
        .expect("Failed to run organization");

    assert_eq!(second.moved_count(), 0);
    assert!(second.folders.is_empty());
    assert!(second.verification.passed);
    assert_eq!(files_after_first, fixture.list_files_recursive());

    let runs = RunLogger::default()
        .read_runs(fixture.path())
        .expect("Failed to read log");
    assert_eq!(runs.len(), 2);
}

#[test]
fn test_dotfiles_are_never_moved() {
    let fixture = TestFixture::new();
    fixture.create_files(&[".env", ".gitignore", "app.js"]);

    fixture.organize_cli().expect("Failed to organize");

    fixture.assert_file_exists(".env");
    fixture.assert_file_exists(".gitignore");
    fixture.assert_file_exists("js/app.js");
    fixture.assert_file_not_exists("no_extension");
}

#[test]
fn test_existing_folders_receive_new_files() {
    let fixture = TestFixture::new();
    fixture.create_subdir("png");
    fixture.create_file("png/existing.png", b"old");
    fixture.create_file("new_photo.png", b"new");

    let record = Orchestrator::new(fixture.path())
        .run()
        .expect("Failed to run organization");

    let png = record.folder("png").expect("png folder recorded");
    assert!(!png.is_new);
    fixture.assert_file_exists("png/existing.png");
    fixture.assert_file_exists("png/new_photo.png");
}

#[test]
fn test_content_and_special_names_preserved() {
    let fixture = TestFixture::new();
    fixture.create_file("photo (1).png", b"\x89PNG bytes");
    fixture.create_file("report.final.pdf", b"%PDF-1.4");
    fixture.create_subdir("keep_me");

    fixture.organize_cli().expect("Failed to organize");

    fixture.assert_file_exists("png/photo (1).png");
    fixture.assert_file_exists("pdf/report.final.pdf");
    fixture.assert_dir_exists("keep_me");
    let content = fs::read(fixture.path().join("png/photo (1).png")).expect("Failed to read file");
    assert_eq!(content, b"\x89PNG bytes");
}

// ============================================================================
// Test Suite 2: Duplicate Handling
// ============================================================================

#[test]
fn test_auto_copy_increments_suffix() {
    let fixture = TestFixture::new();
    fixture.create_subdir("txt");
    fixture.create_file("txt/x.txt", b"original");

    fixture.create_file("x.txt", b"second");
    let first = Orchestrator::new(fixture.path())
        .run()
        .expect("Failed to run organization");
    fixture.create_file("x.txt", b"third");
    let second = Orchestrator::new(fixture.path())
        .run()
        .expect("Failed to run organization");

    assert_eq!(fixture.read("txt/x.txt"), "original");
    assert_eq!(fixture.read("txt/x_copy1.txt"), "second");
    assert_eq!(fixture.read("txt/x_copy2.txt"), "third");

    let outcome = &first.folder("txt").expect("txt recorded").moves[0];
    assert!(outcome.collision);
    assert_eq!(outcome.action, MoveAction::CopyRenamed);
    assert_eq!(
        second.folder("txt").expect("txt recorded").moves[0].final_name,
        "x_copy2.txt"
    );
    assert!(fixture.read(LOG_FILE).contains("x_copy2.txt (renamed from x.txt)"));
}

#[test]
fn test_overwrite_policy_replaces_existing() {
    let fixture = TestFixture::new();
    fixture.create_subdir("txt");
    fixture.create_file("txt/x.txt", b"old");
    fixture.create_file("x.txt", b"new");

    let result = run_cli(
        Command::Organize {
            dir: fixture.path().to_path_buf(),
            dry_run: false,
            overwrite: true,
            prompt: false,
            json: false,
        },
        None,
    );

    assert!(result.is_ok());
    assert_eq!(fixture.read("txt/x.txt"), "new");
    fixture.assert_file_not_exists("txt/x_copy1.txt");
    fixture.assert_file_not_exists("x.txt");
}

#[test]
fn test_prompt_policy_consults_decider() {
    let fixture = TestFixture::new();
    fixture.create_subdir("txt");
    fixture.create_file("txt/a.txt", b"old a");
    fixture.create_file("txt/b.txt", b"old b");
    fixture.create_file("a.txt", b"new a");
    fixture.create_file("b.txt", b"new b");

    let mut asked = Vec::new();
    let mut decider = |destination: &Path| {
        asked.push(destination.to_path_buf());
        if destination.ends_with("a.txt") {
            DuplicateDecision::Skip
        } else {
            DuplicateDecision::Overwrite
        }
    };
    let record = Orchestrator::new(fixture.path())
        .with_policy(DuplicatePolicy::Prompt)
        .run_with(&mut decider, &mut ())
        .expect("Failed to run organization");

    assert_eq!(asked.len(), 2);
    fixture.assert_file_exists("a.txt");
    assert_eq!(fixture.read("txt/a.txt"), "old a");
    assert_eq!(fixture.read("txt/b.txt"), "new b");
    // The skipped file is still at the top level, so verification flags it.
    assert!(!record.verification.passed);
    assert_eq!(record.verification.mismatches.len(), 1);
}

// ============================================================================
// Test Suite 3: Verification and Directory State
// ============================================================================

#[test]
fn test_verification_flags_misplaced_file() {
    let fixture = TestFixture::new();
    fixture.create_files(&["doc.pdf"]);
    fixture.organize_cli().expect("Failed to organize");

    fixture.create_file("pdf/photo.jpg", b"jpg");
    let report = Orchestrator::new(fixture.path())
        .verify()
        .expect("Failed to verify");

    assert!(!report.passed);
    assert_eq!(report.mismatches.len(), 1);
    assert!(report.mismatches[0].path.ends_with("pdf/photo.jpg"));
    assert_eq!(report.mismatches[0].expected_folder, "jpg");
}

#[test]
fn test_fingerprint_tracks_changes() {
    let fixture = TestFixture::new();
    fixture.create_files(&["a.txt", "b.pdf"]);

    let before = fingerprint_directory(fixture.path()).expect("Failed to fingerprint");
    let again = fingerprint_directory(fixture.path()).expect("Failed to fingerprint");
    assert_eq!(before, again);
    assert_eq!(before.file_count, 2);

    Orchestrator::new(fixture.path())
        .run()
        .expect("Failed to run organization");
    let after = fingerprint_directory(fixture.path()).expect("Failed to fingerprint");

    assert_ne!(before.digest, after.digest);
    assert_eq!(after.folder_count, 2);
}

#[test]
fn test_state_and_verify_commands() {
    let fixture = TestFixture::new();
    fixture.create_files(&["a.txt"]);

    let state = run_cli(
        Command::State {
            dir: fixture.path().to_path_buf(),
            json: true,
        },
        None,
    );
    let verify = run_cli(
        Command::Verify {
            dir: fixture.path().to_path_buf(),
            json: false,
        },
        None,
    );

    assert!(state.is_ok());
    assert!(verify.is_ok(), "A failed verification is still a completed command");
    fixture.assert_file_exists("a.txt");
}

// ============================================================================
// Test Suite 4: Dry-Run Mode
// ============================================================================

#[test]
fn test_dry_run_doesnt_move_files() {
    let fixture = TestFixture::new();
    fixture.create_files(&["photo.png", "report.pdf"]);

    let result = run_cli(
        Command::Organize {
            dir: fixture.path().to_path_buf(),
            dry_run: true,
            overwrite: false,
            prompt: false,
            json: false,
        },
        None,
    );

    assert!(result.is_ok());
    fixture.assert_file_exists("photo.png");
    fixture.assert_file_exists("report.pdf");
    assert_eq!(fixture.count_dirs(), 0, "Dry-run should not create directories");
    fixture.assert_file_not_exists(LOG_FILE);
}

#[test]
fn test_dry_run_matches_actual_run() {
    let fixture = TestFixture::new();
    fixture.create_files(&["a.md", "b.md", "c.csv"]);

    let orchestrator = Orchestrator::new(fixture.path());
    let plan = orchestrator.plan().expect("Failed to plan");
    let record = orchestrator.run().expect("Failed to run organization");

    let mut planned: Vec<(String, String)> = plan
        .into_iter()
        .map(|p| (p.folder, p.final_name))
        .collect();
    let mut actual: Vec<(String, String)> = record
        .outcomes()
        .map(|o| (o.folder.clone(), o.final_name.clone()))
        .collect();
    planned.sort();
    actual.sort();
    assert_eq!(planned, actual);
}

// ============================================================================
// Test Suite 5: Configuration and Filtering
// ============================================================================

#[test]
fn test_organize_with_exclude_rules() {
    let fixture = TestFixture::new();
    let config_path = fixture.path().join(".easycleanup.toml");
    let config_content = r#"
[filters.exclude]
patterns = ["*.part"]
extensions = ["tmp"]
filenames = ["LICENSE"]
"#;
    fs::write(&config_path, config_content).expect("Failed to write config");
    fixture.create_files(&["photo.png", "movie.mkv.part", "scratch.tmp", "LICENSE"]);

    let result = run_cli(
        Command::Organize {
            dir: fixture.path().to_path_buf(),
            dry_run: false,
            overwrite: false,
            prompt: false,
            json: false,
        },
        Some(&config_path),
    );

    assert!(result.is_ok(), "Result error: {:?}", result.err());
    fixture.assert_file_exists("png/photo.png");
    fixture.assert_file_exists("movie.mkv.part");
    fixture.assert_file_exists("scratch.tmp");
    fixture.assert_file_exists("LICENSE");

    let config = easy_cleanup::Config::load(Some(&config_path)).expect("Failed to load config");
    let report = Orchestrator::from_config(fixture.path(), &config)
        .expect("Failed to build orchestrator")
        .verify()
        .expect("Failed to verify");
    assert!(report.passed, "Excluded files are not misplaced");
}

#[test]
fn test_config_sets_policy_and_log_name() {
    let fixture = TestFixture::new();
    let config_path = fixture.path().join("settings.toml");
    fs::write(
        &config_path,
        "[organize]\nduplicates = \"overwrite\"\nlog_file = \"cleanup.log\"\n",
    )
    .expect("Failed to write config");
    fixture.create_subdir("toml");
    fixture.create_file("toml/settings.toml", b"old");

    let config = easy_cleanup::Config::load(Some(&config_path)).expect("Failed to load config");
    let record = Orchestrator::from_config(fixture.path(), &config)
        .expect("Failed to build orchestrator")
        .run()
        .expect("Failed to run organization");

    assert_eq!(record.moved_count(), 1);
    assert!(fixture.read("toml/settings.toml").contains("overwrite"));
    fixture.assert_file_exists("cleanup.log");
    fixture.assert_file_not_exists(LOG_FILE);
}

#[test]
fn test_invalid_config_is_an_error() {
    let fixture = TestFixture::new();
    let config_path = fixture.path().join("bad.toml");
    fs::write(&config_path, "[filters.exclude]\nregex = [\"[unclosed(\"]\n")
        .expect("Failed to write config");
    fixture.create_files(&["a.txt"]);

    let result = run_cli(
        Command::Organize {
            dir: fixture.path().to_path_buf(),
            dry_run: false,
            overwrite: false,
            prompt: false,
            json: false,
        },
        Some(&config_path),
    );

    assert!(result.is_err());
    fixture.assert_file_exists("a.txt");
}

#[test]
fn test_log_file_outside_directory_is_rejected() {
    let fixture = TestFixture::new();
    fixture.create_subdir("target");
    fixture.create_file("target/a.txt", b"a");
    let config_path = fixture.path().join("escape.toml");
    fs::write(&config_path, "[organize]\nlog_file = \"../escaped.log\"\n")
        .expect("Failed to write config");

    let result = run_cli(
        Command::Organize {
            dir: fixture.path().join("target"),
            dry_run: false,
            overwrite: false,
            prompt: false,
            json: false,
        },
        Some(&config_path),
    );

    assert!(result.is_err());
    fixture.assert_file_exists("target/a.txt");
    fixture.assert_file_not_exists("escaped.log");
}

// ============================================================================
// Test Suite 6: Run Log and Error Scenarios
// ============================================================================

#[test]
fn test_log_is_append_only() {
    let fixture = TestFixture::new();
    fixture.create_files(&["one.txt"]);
    fixture.organize_cli().expect("Failed to organize");
    let first_log = fixture.read(LOG_FILE);

    fixture.create_files(&["two.txt"]);
    fixture.organize_cli().expect("Failed to organize");
    let second_log = fixture.read(LOG_FILE);

    assert!(second_log.starts_with(&first_log));
    assert!(second_log.contains("[txt/] EXISTING • 1 file(s)"));

    let log = run_cli(
        Command::Log {
            dir: fixture.path().to_path_buf(),
            last: Some(1),
        },
        None,
    );
    assert!(log.is_ok());
}

#[test]
fn test_missing_directory_is_an_error() {
    let fixture = TestFixture::new();
    let missing = fixture.path().join("does_not_exist");

    let result = Orchestrator::new(&missing).run();
    assert!(matches!(result, Err(OrganizeError::InvalidTarget { .. })));

    let cli_result = run_cli(
        Command::Organize {
            dir: missing.clone(),
            dry_run: false,
            overwrite: false,
            prompt: false,
            json: false,
        },
        None,
    );
    assert!(cli_result.is_err());
    assert!(!missing.exists());
}

#[cfg(unix)]
#[test]
fn test_non_utf8_names_are_organized() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let fixture = TestFixture::new();
    let name = OsStr::from_bytes(b"caf\xe9.txt");
    fs::write(fixture.path().join(name), "bytes").expect("Failed to write file");
    fixture.create_files(&["plain.txt"]);

    fixture.organize_cli().expect("Failed to organize");
    assert!(fixture.path().join("txt").join(name).is_file());
    fixture.assert_file_exists("txt/plain.txt");

    let record = Orchestrator::new(fixture.path())
        .run()
        .expect("Failed to run organization");
    assert_eq!(record.moved_count(), 0);
    assert!(record.verification.passed);
}
