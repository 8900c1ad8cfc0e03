//! Run settings and file filtering rules.
//!
//! Settings are loaded from a TOML file. Filters decide which top-level files
//! are left alone by an organization run; hidden files are always left alone.
//!
//! # Configuration File Format
//!
//! ```toml
//! [organize]
//! duplicates = "auto-copy"   # "prompt", "auto-copy" or "overwrite"
//! log_file = "organization_log.txt"
//!
//! [filters.exclude]
//! filenames = ["Thumbs.db"]
//! patterns = ["*.part"]
//! extensions = ["tmp"]
//! regex = []
//!
//! [filters.include]
//! patterns = []
//! ```

use crate::classify::{extension_of, is_hidden};
use crate::duplicates::DuplicatePolicy;
pub use crate::error::ConfigError;
use crate::run_log::DEFAULT_LOG_FILE;
use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Name of the per-directory configuration file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = ".easycleanup.toml";

/// Complete configuration as read from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub organize: OrganizeSettings,

    #[serde(default)]
    pub filters: FilterRules,
}

/// Settings for organization runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizeSettings {
    /// Collision policy used when none is given on the command line.
    #[serde(default)]
    pub duplicates: DuplicatePolicy,

    /// File name of the run log inside the target directory.
    #[serde(default = "default_log_file")]
    pub log_file: String,
}

fn default_log_file() -> String {
    DEFAULT_LOG_FILE.to_string()
}

impl Default for OrganizeSettings {
    fn default() -> Self {
        Self {
            duplicates: DuplicatePolicy::default(),
            log_file: default_log_file(),
        }
    }
}

/// Filter rules configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterRules {
    /// Rules for excluding files.
    #[serde(default)]
    pub exclude: ExcludeRules,

    /// Rules for including files (whitelist, overrides exclude rules).
    #[serde(default)]
    pub include: IncludeRules,
}

/// Rules for excluding files from organization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExcludeRules {
    /// Exact filenames to exclude (e.g., "Thumbs.db").
    #[serde(default)]
    pub filenames: Vec<String>,

    /// Glob patterns matched against the file name (e.g., "*.part").
    #[serde(default)]
    pub patterns: Vec<String>,

    /// File extensions to exclude, without the dot.
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Regex patterns matched against the file name.
    #[serde(default)]
    pub regex: Vec<String>,
}

/// Rules for including files, overriding exclude rules (whitelist).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IncludeRules {
    /// Glob patterns that override exclude rules.
    #[serde(default)]
    pub patterns: Vec<String>,
}

impl Config {
    /// Load configuration from a file, with fallback to defaults.
    ///
    /// Attempts to load configuration in the following order:
    /// 1. If `config_path` is provided, load from that file
    /// 2. Look for `.easycleanup.toml` in the current directory
    /// 3. Look for `~/.config/easy-cleanup/config.toml` in home directory
    /// 4. Fall back to default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file is explicitly provided but cannot be read,
    /// or if any file found cannot be parsed.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("easy-cleanup")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        debug!(config = %path.display(), "Loaded configuration");
        Self::from_toml(&content)
    }

    /// Parses settings from TOML text.
    ///
    /// `organize.log_file` must be a plain file name so the log always lands
    /// directly inside the target directory.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        let log_file = &config.organize.log_file;
        if !is_plain_file_name(log_file) {
            return Err(ConfigError::Invalid(format!(
                "log_file must be a plain file name, got '{log_file}'"
            )));
        }
        Ok(config)
    }
}

/// True for a single path component with no separators, `.` or `..`.
fn is_plain_file_name(name: &str) -> bool {
    if name.contains(['/', '\\']) {
        return false;
    }
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(part)), None) if part == name
    )
}

impl FilterRules {
    /// Compile the rules into matchers.
    ///
    /// # Errors
    ///
    /// Returns an error if any regex or glob patterns are invalid.
    pub fn compile(&self) -> Result<CompiledFilters, ConfigError> {
        CompiledFilters::new(self)
    }
}

/// Pre-compiled filter rules, built once per run.
#[derive(Debug, Clone, Default)]
pub struct CompiledFilters {
    exclude_filenames: HashSet<String>,
    exclude_extensions: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
    include_patterns: Vec<Pattern>,
}

fn compile_globs(patterns: &[String]) -> Result<Vec<Pattern>, ConfigError> {
    patterns
        .iter()
        .map(|pattern| {
            Pattern::new(pattern).map_err(|_| ConfigError::InvalidGlobPattern(pattern.clone()))
        })
        .collect()
}

impl CompiledFilters {
    fn new(rules: &FilterRules) -> Result<Self, ConfigError> {
        let exclude_regexes = rules
            .exclude
            .regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            exclude_filenames: rules.exclude.filenames.iter().cloned().collect(),
            exclude_extensions: rules
                .exclude
                .extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
            exclude_patterns: compile_globs(&rules.exclude.patterns)?,
            exclude_regexes,
            include_patterns: compile_globs(&rules.include.patterns)?,
        })
    }

    /// Check if a top-level file should be organized.
    ///
    /// Checks are performed in this order, with early termination:
    /// 1. Hidden files - always excluded
    /// 2. Include patterns (whitelist) - if matched, include
    /// 3. Exact filename, extension, glob and regex rules - if matched, exclude
    /// 4. Default: include
    pub fn should_include(&self, file_name: &str) -> bool {
        if is_hidden(file_name) {
            return false;
        }

        if self.include_patterns.iter().any(|p| p.matches(file_name)) {
            return true;
        }

        if self.exclude_filenames.contains(file_name) {
            return false;
        }

        if let Some(ext) = extension_of(file_name)
            && self.exclude_extensions.contains(&ext)
        {
            return false;
        }

        if self.exclude_patterns.iter().any(|p| p.matches(file_name)) {
            return false;
        }

        !self.exclude_regexes.iter().any(|r| r.is_match(file_name))
    }
}
