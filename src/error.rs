//! Error types.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Result alias for processing and store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by processing and store operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The input file does not exist.
    #[error("input file '{}' not found", .path.display())]
    InputNotFound {
        /// The expected path.
        path: PathBuf,
    },

    /// The input file contains no lines at all.
    #[error("The input file '{}' is empty.", .path.display())]
    EmptyInput {
        /// The empty file.
        path: PathBuf,
    },

    /// A result file could not be written.
    #[error("failed to write '{}': {source}", .path.display())]
    OutputWriteFailure {
        /// The file that could not be written.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A result file exists but is not a JSON array of results.
    #[error("'{}' does not contain valid results: {source}", .path.display())]
    CorruptOutput {
        /// The unreadable file.
        path: PathBuf,
        /// Underlying decode error.
        source: serde_json::Error,
    },

    /// Filesystem I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the taxonomy bucket this error is reported under.
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::InputNotFound { .. } => ErrorClass::InputNotFound,
            Self::EmptyInput { .. } => ErrorClass::EmptyInput,
            Self::OutputWriteFailure { .. } => ErrorClass::OutputWriteFailure,
            Self::CorruptOutput { .. } => ErrorClass::CorruptOutput,
            Self::Io(_) | Self::Json(_) => ErrorClass::Unexpected,
        }
    }
}

/// Why a single hostname failed to resolve.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveFailure {
    /// The naming system has no address for the name.
    #[error("name not found")]
    NotFound,

    /// The lookup did not finish within the timeout.
    #[error("lookup timed out")]
    Timeout,

    /// Any other failure, with the underlying message.
    #[error("{0}")]
    Unexpected(String),
}

impl ResolveFailure {
    /// Returns the operator-facing message for a failure on `hostname`.
    #[must_use]
    pub fn describe(&self, hostname: &str) -> String {
        match self {
            Self::NotFound => {
                format!("Could not resolve hostname '{hostname}'. Please check if it's correct.")
            }
            Self::Timeout => format!(
                "Timeout occurred while resolving '{hostname}'. The server might be slow or unreachable."
            ),
            Self::Unexpected(detail) => {
                format!("Unexpected error occurred while resolving '{hostname}': {detail}")
            }
        }
    }

    /// Returns the taxonomy bucket this failure is reported under.
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::NotFound => ErrorClass::NotFound,
            Self::Timeout => ErrorClass::Timeout,
            Self::Unexpected(_) => ErrorClass::Unexpected,
        }
    }
}

/// Every kind of failure the program reports, used as the `class` field of
/// log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The input file does not exist.
    InputNotFound,
    /// The input file has no lines.
    EmptyInput,
    /// A hostname has no address.
    NotFound,
    /// A lookup exceeded its timeout.
    Timeout,
    /// Anything else, from a lookup or from the run as a whole.
    Unexpected,
    /// A result file could not be written.
    OutputWriteFailure,
    /// A result file held invalid JSON.
    CorruptOutput,
}

impl ErrorClass {
    /// Returns the class name as written in log events.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InputNotFound => "InputNotFound",
            Self::EmptyInput => "EmptyInput",
            Self::NotFound => "NotFound",
            Self::Timeout => "Timeout",
            Self::Unexpected => "Unexpected",
            Self::OutputWriteFailure => "OutputWriteFailure",
            Self::CorruptOutput => "CorruptOutput",
        }
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
