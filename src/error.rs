//! Error types for installer media generation.
//!
//! One enum covers the whole pipeline. Variants are grouped by when they can
//! occur: precondition checks before any filesystem mutation, external tool
//! failures, and data decoding failures. Unmount exhaustion is deliberately
//! NOT an error; see [`crate::generator::disk::unmount`].

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for generator operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for all generator operations
#[derive(Error, Debug)]
pub enum Error {
    /// Destination artifact already exists and `--force` was not passed.
    /// Raised before any destructive action has taken place.
    #[error("'{}' already exists, use --force to overwrite", path.display())]
    ExistingDestination {
        /// Destination path that blocked generation
        path: PathBuf,
    },

    /// An external tool exited non-zero. Fatal for the current output kind.
    #[error("'{command}' failed with exit code {code}: {stderr}")]
    CommandFailed {
        /// Full command line that was executed
        command: String,
        /// Exit code, -1 when terminated by signal
        code: i32,
        /// Captured stderr, trimmed
        stderr: String,
    },

    /// An external tool could not be spawned at all.
    #[error("failed to execute '{command}': {source}")]
    CommandSpawn {
        /// Program that failed to launch
        command: String,
        /// Underlying spawn error
        source: std::io::Error,
    },

    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Installer metadata decode errors
    #[error("installer metadata error: {0}")]
    Metadata(#[from] serde_json::Error),

    /// Property list decode/encode errors
    #[error("property list error: {0}")]
    Plist(#[from] plist::Error),

    /// Generic errors
    #[error("{0}")]
    Generic(String),
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },
}

impl Error {
    /// True when the error came from an external tool rather than this
    /// process.
    pub fn is_process_failure(&self) -> bool {
        matches!(
            self,
            Error::CommandFailed { .. } | Error::CommandSpawn { .. }
        )
    }
}
