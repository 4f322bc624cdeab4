//! Error types for the troubleshoot-assist crate.

use std::path::Path;

use thiserror::Error;

/// Result type alias for assist operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while running a troubleshooting session.
///
/// Diagnostic command failures are not errors: they are recorded as report
/// text. Everything here aborts the session.
#[derive(Error, Debug)]
pub enum Error {
    /// The tool was started without root privileges.
    #[error("this tool must be run as root (try: sudo troubleshoot)")]
    NotRoot,

    /// The invoking user could not be resolved.
    #[error("Unknown user: {0}")]
    UnknownUser(String),

    /// Invalid or unreadable configuration.
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Failed to read or write a file or directory.
    #[error("Failed to access {path}: {reason}")]
    IoError { path: String, reason: String },

    /// Failed to build the archive.
    #[error("Failed to build archive {path}: {reason}")]
    ArchiveError { path: String, reason: String },

    /// The interactive prompt failed.
    #[error("Prompt failed: {0}")]
    PromptError(String),

    /// User cancelled operation.
    #[error("Operation cancelled by user")]
    UserCancelled,
}

impl Error {
    /// Wrap an I/O error together with the path it concerns.
    pub fn io(path: &Path, err: std::io::Error) -> Self {
        Error::IoError {
            path: path.display().to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::ConfigError(err.to_string())
    }
}

impl From<dialoguer::Error> for Error {
    fn from(err: dialoguer::Error) -> Self {
        match err {
            dialoguer::Error::IO(e) if e.kind() == std::io::ErrorKind::Interrupted => {
                Error::UserCancelled
            }
            other => Error::PromptError(other.to_string()),
        }
    }
}
