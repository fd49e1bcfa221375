//! Append-only plain-text error log.
//!
//! Each reported failure becomes one line:
//!
//! ```text
//! 2024-05-01 12:00:00 - Input: nope.invalid - Error: Could not resolve hostname 'nope.invalid'. ...
//! ```

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::ErrorClass;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Error log file opened in append mode on every write.
#[derive(Debug, Clone)]
pub struct ErrorLog {
    path: PathBuf,
}

impl ErrorLog {
    /// Creates a log writing to `path`. The file is created on first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the log file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends an entry for `input`.
    ///
    /// The entry is also emitted as a `tracing` warning tagged with `class`.
    /// A log that cannot be written is reported through `tracing` only.
    pub fn record(&self, class: ErrorClass, input: &str, message: &str) {
        tracing::warn!(class = %class, input = %input, "{message}");

        if let Err(e) = self.append(&format_entry(input, message)) {
            tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to write error log"
            );
        }
    }

    fn append(&self, line: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())
    }
}

fn format_entry(input: &str, message: &str) -> String {
    let timestamp = chrono::Local::now().format(TIMESTAMP_FORMAT);
    format!("{timestamp} - Input: {input} - Error: {message}\n")
}
