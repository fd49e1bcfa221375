//! Run configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Default error log file name, relative to the working directory.
pub const DEFAULT_LOG_FILE: &str = "error_log.txt";

/// Default per-hostname lookup timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// How results are persisted to the output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// Buffer every result, then merge once into the existing output.
    #[default]
    Batch,
    /// Reset the output, then read-modify-write it after every hostname.
    Incremental,
}

impl Strategy {
    /// Indentation width of the pretty-printed output.
    #[must_use]
    pub const fn indent(self) -> usize {
        match self {
            Self::Batch => 2,
            Self::Incremental => 4,
        }
    }
}

/// Configuration for a single processing run.
///
/// # Example
///
/// ```
/// use hostlist_resolver::{ProcessConfig, Strategy};
/// use std::time::Duration;
///
/// let config = ProcessConfig::new("hosts.txt", "results.json")
///     .with_strategy(Strategy::Incremental)
///     .with_timeout(Duration::from_secs(2));
///
/// assert_eq!(config.strategy, Strategy::Incremental);
/// assert_eq!(config.log_file.to_str(), Some("error_log.txt"));
/// ```
#[derive(Debug, Clone)]
pub struct ProcessConfig {
    /// Newline-delimited hostname list.
    pub input: PathBuf,

    /// JSON result store.
    pub output: PathBuf,

    /// Append-only error log.
    pub log_file: PathBuf,

    /// Upper bound on a single lookup.
    pub timeout: Duration,

    /// Persistence strategy.
    pub strategy: Strategy,

    /// Directory holding `temp_results.json` and `old_results.json`
    /// (batch strategy only).
    pub work_dir: PathBuf,
}

impl ProcessConfig {
    /// Creates a config with the default log file, a 5 second timeout, the
    /// batch strategy and the current directory as work dir.
    #[must_use]
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            timeout: DEFAULT_TIMEOUT,
            strategy: Strategy::default(),
            work_dir: PathBuf::from("."),
        }
    }

    /// Overrides the error log path.
    #[must_use]
    pub fn with_log_file(mut self, log_file: impl Into<PathBuf>) -> Self {
        self.log_file = log_file.into();
        self
    }

    /// Overrides the lookup timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Overrides the persistence strategy.
    #[must_use]
    pub const fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Overrides the directory used for intermediate files.
    #[must_use]
    pub fn with_work_dir(mut self, work_dir: impl Into<PathBuf>) -> Self {
        self.work_dir = work_dir.into();
        self
    }
}
