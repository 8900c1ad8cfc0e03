//! Error types shared by the organization engine and its configuration layer.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that stop an operation before it touches the target directory.
///
/// Per-file problems are never reported through this type: a failed move is a
/// [`crate::MoveAction::Failed`] value inside the run record.
#[derive(Debug, Error)]
pub enum OrganizeError {
    /// The target does not exist, is not a directory, or cannot be listed.
    #[error("invalid target directory {}: {reason}", path.display())]
    InvalidTarget { path: PathBuf, reason: String },

    /// The run log exists but could not be read.
    #[error("failed to read run log {}: {source}", path.display())]
    LogRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl OrganizeError {
    pub(crate) fn invalid_target(path: &std::path::Path, reason: impl Into<String>) -> Self {
        Self::InvalidTarget {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }
}

/// Result type for engine operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// Errors that can occur during configuration loading and filter compilation.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at an explicitly given path.
    #[error("configuration file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Invalid TOML syntax or structure.
    #[error("invalid configuration: {0}")]
    Invalid(String),

    /// Invalid glob pattern provided.
    #[error("invalid glob pattern '{0}': expected something like *.ext")]
    InvalidGlobPattern(String),

    /// Invalid regex pattern provided.
    #[error("invalid regex pattern '{pattern}': {reason}")]
    InvalidRegexPattern { pattern: String, reason: String },

    /// IO error while reading configuration.
    #[error("IO error reading configuration: {0}")]
    Io(String),
}
