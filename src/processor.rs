//! The resolve-and-persist loop.
//!
//! [`Processor::run`] reads the hostname list, resolves each entry once and
//! persists the results with the configured [`Strategy`]. Per-hostname
//! failures never stop the loop; they are printed, logged and recorded with
//! an empty address. [`Processor::process`] wraps `run` with the top-level
//! failure policy: whatever aborts the run is printed and logged, and the
//! caller never sees an error for it.

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::{ProcessConfig, Strategy};
use crate::error::{Error, ErrorClass, Result};
use crate::error_log::ErrorLog;
use crate::resolver::{Resolve, SystemResolver};
use crate::store::{AppendOutcome, HostResult, ResultStore, merge};

/// Scratch file holding the results of the current batch run.
pub const TEMP_RESULTS_FILE: &str = "temp_results.json";

/// Snapshot of the output file taken before a batch merge.
pub const OLD_RESULTS_FILE: &str = "old_results.json";

/// Log input used for failures not tied to a hostname or file.
const PROCESS_INPUT: &str = "process";

/// Counts from a completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Hostnames looked up (blank lines excluded).
    pub processed: usize,
    /// Lookups that produced an address.
    pub resolved: usize,
    /// Lookups that failed.
    pub failed: usize,
}

/// Runs one pass over a hostname list.
///
/// # Example
///
/// ```rust,ignore
/// use hostlist_resolver::{ProcessConfig, Processor};
///
/// let processor = Processor::new(ProcessConfig::new("hosts.txt", "results.json"));
/// processor.process(&mut std::io::stdout())?;
/// ```
pub struct Processor<R = SystemResolver> {
    config: ProcessConfig,
    resolver: R,
    log: ErrorLog,
}

impl Processor<SystemResolver> {
    /// Creates a processor using the system resolver.
    #[must_use]
    pub fn new(config: ProcessConfig) -> Self {
        Self::with_resolver(config, SystemResolver::new())
    }
}

impl<R: Resolve> Processor<R> {
    /// Creates a processor using `resolver` for lookups.
    #[must_use]
    pub fn with_resolver(config: ProcessConfig, resolver: R) -> Self {
        let log = ErrorLog::new(&config.log_file);
        Self {
            config,
            resolver,
            log,
        }
    }

    /// Runs the loop, reporting every outcome on `console` and in the error
    /// log.
    ///
    /// # Errors
    ///
    /// Only fails if `console` cannot be written.
    pub fn process<W: Write>(&self, console: &mut W) -> std::io::Result<()> {
        match self.run(console) {
            Ok(summary) => {
                tracing::info!(
                    processed = summary.processed,
                    resolved = summary.resolved,
                    failed = summary.failed,
                    output = %self.config.output.display(),
                    "Processing complete"
                );
                writeln!(
                    console,
                    "Processing complete. Results have been saved to {}",
                    self.config.output.display()
                )
            }
            Err(e) => self.report_abort(&e, console),
        }
    }

    /// Runs the loop and returns the counts, or the error that aborted it.
    ///
    /// Resolution failures and, with [`Strategy::Incremental`], per-record
    /// write failures are reported and skipped rather than returned.
    ///
    /// # Errors
    ///
    /// [`Error::InputNotFound`] or [`Error::EmptyInput`] before anything is
    /// written; [`Error::OutputWriteFailure`] if the output cannot be
    /// initialized (incremental) or written (batch); any other I/O or JSON
    /// error encountered along the way.
    pub fn run<W: Write>(&self, console: &mut W) -> Result<RunSummary> {
        let content = self.read_input()?;
        let output = ResultStore::new(&self.config.output, self.config.strategy.indent());

        tracing::info!(
            input = %self.config.input.display(),
            output = %output.path().display(),
            strategy = ?self.config.strategy,
            "Starting run"
        );

        if self.config.strategy == Strategy::Incremental {
            output.reset()?;
        }

        let mut summary = RunSummary::default();
        let mut batch = Vec::new();

        for line in content.lines() {
            let hostname = line.trim();
            if hostname.is_empty() {
                tracing::debug!(line = %line.escape_debug(), "Skipping blank line");
                continue;
            }

            let record = self.resolve_one(hostname, console)?;
            summary.processed += 1;
            if record.is_resolved() {
                summary.resolved += 1;
            } else {
                summary.failed += 1;
            }

            match self.config.strategy {
                Strategy::Batch => batch.push(record),
                Strategy::Incremental => self.persist_one(&output, record, console)?,
            }
            writeln!(console, "Processed: {hostname}")?;
        }

        if self.config.strategy == Strategy::Batch {
            self.merge_batch(&output, &batch)?;
        }
        Ok(summary)
    }

    fn read_input(&self) -> Result<String> {
        let path = &self.config.input;
        if !path.exists() {
            return Err(Error::InputNotFound { path: path.clone() });
        }
        let content = std::fs::read_to_string(path)?;
        if content.is_empty() {
            return Err(Error::EmptyInput { path: path.clone() });
        }
        Ok(content)
    }

    fn resolve_one<W: Write>(&self, hostname: &str, console: &mut W) -> Result<HostResult> {
        let resolution = self.resolver.resolve(hostname, self.config.timeout);
        match resolution.failure() {
            Some(failure) => {
                let message = failure.describe(hostname);
                writeln!(console, "Error: {message}")?;
                self.log.record(failure.class(), hostname, &message);
            }
            None => tracing::info!(host = %hostname, ip = ?resolution.address(), "Resolved"),
        }
        Ok(HostResult::from_resolution(hostname, &resolution))
    }

    fn persist_one<W: Write>(
        &self,
        output: &ResultStore,
        record: HostResult,
        console: &mut W,
    ) -> Result<()> {
        let hostname = record.hostname.clone();
        let loaded = match output.load_for_append() {
            Ok((records, AppendOutcome::Appended)) => Ok(records),
            Ok((records, AppendOutcome::RecoveredCorrupt)) => {
                // Reported before the write is attempted.
                let message = format!(
                    "Invalid JSON in '{}'; reset to the current result",
                    output.path().display()
                );
                writeln!(console, "Warning: {message}")?;
                self.log.record(ErrorClass::CorruptOutput, &hostname, &message);
                Ok(records)
            }
            Err(e) => Err(e),
        };

        let written = loaded.and_then(|mut records| {
            records.push(record);
            output.write(&records)
        });
        match written {
            Ok(()) => Ok(()),
            Err(e @ Error::OutputWriteFailure { .. }) => {
                let message = e.to_string();
                writeln!(console, "Error: {message}")?;
                self.log.record(e.class(), &hostname, &message);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Merges `batch` into the output through the scratch files.
    ///
    /// The previous records are read from the output before any file is
    /// touched. A scratch file that is itself the output is never written
    /// separately: the output is only replaced by the final merged write.
    fn merge_batch(&self, output: &ResultStore, batch: &[HostResult]) -> Result<()> {
        let indent = Strategy::Batch.indent();
        let work_dir = &self.config.work_dir;
        let temp = ResultStore::new(work_dir.join(TEMP_RESULTS_FILE), indent);
        let old = ResultStore::new(work_dir.join(OLD_RESULTS_FILE), indent);

        let previous = output.load()?;

        if same_file(output.path(), old.path()) {
            tracing::debug!(path = %old.path().display(), "Output is the snapshot file, skipping copy");
        } else {
            snapshot(output, &old)?;
        }

        let current = if same_file(output.path(), temp.path()) {
            tracing::debug!(path = %temp.path().display(), "Output is the scratch file, merging in memory");
            batch.to_vec()
        } else {
            temp.write(batch)?;
            temp.load()?
        };

        output.write(&merge(previous, current))
    }

    fn report_abort<W: Write>(&self, error: &Error, console: &mut W) -> std::io::Result<()> {
        let class = error.class();
        let (input, message) = match error {
            Error::InputNotFound { path }
            | Error::EmptyInput { path }
            | Error::OutputWriteFailure { path, .. }
            | Error::CorruptOutput { path, .. } => (path.display().to_string(), error.to_string()),
            Error::Io(_) | Error::Json(_) => (
                PROCESS_INPUT.to_string(),
                format!("An unexpected error occurred: {error}"),
            ),
        };

        if class == ErrorClass::EmptyInput {
            writeln!(console, "Warning: {message}")?;
        } else {
            writeln!(console, "Error: {message}")?;
        }
        self.log.record(class, &input, &message);
        Ok(())
    }
}

/// Returns `true` if `a` and `b` name the same file, whether or not it
/// exists yet.
fn same_file(a: &Path, b: &Path) -> bool {
    normalize(a) == normalize(b)
}

/// Canonicalizes the parent directory and re-attaches the file name.
fn normalize(path: &Path) -> PathBuf {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    match (parent.canonicalize(), path.file_name()) {
        (Ok(dir), Some(name)) => dir.join(name),
        _ => path.to_path_buf(),
    }
}

/// Copies the current output (if any) to `old`, or clears a stale snapshot.
fn snapshot(output: &ResultStore, old: &ResultStore) -> Result<()> {
    if output.path().exists() {
        std::fs::copy(output.path(), old.path())?;
    } else if old.path().exists() {
        std::fs::remove_file(old.path())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    use crate::error::ResolveFailure;
    use crate::resolver::StaticResolver;

    struct Fixture {
        dir: tempfile::TempDir,
    }

    impl Fixture {
        fn new(input: &str) -> Self {
            let dir = tempfile::tempdir().unwrap();
            std::fs::write(dir.path().join("hosts.txt"), input).unwrap();
            Self { dir }
        }

        fn path(&self, name: &str) -> PathBuf {
            self.dir.path().join(name)
        }

        fn config(&self, strategy: Strategy) -> ProcessConfig {
            ProcessConfig::new(self.path("hosts.txt"), self.path("out.json"))
                .with_log_file(self.path("error_log.txt"))
                .with_work_dir(self.dir.path())
                .with_strategy(strategy)
        }

        fn log(&self) -> String {
            std::fs::read_to_string(self.path("error_log.txt")).unwrap_or_default()
        }

        fn results(&self) -> Vec<HostResult> {
            load(&self.path("out.json"))
        }
    }

    fn load(path: &Path) -> Vec<HostResult> {
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
    }

    fn resolver() -> StaticResolver {
        StaticResolver::new()
            .with_address("a.test", Ipv4Addr::new(10, 0, 0, 1))
            .with_address("b.test", Ipv4Addr::new(10, 0, 0, 2))
            .with_failure("slow.test", ResolveFailure::Timeout)
    }

    fn run(fx: &Fixture, strategy: Strategy) -> (Result<RunSummary>, String) {
        let p = Processor::with_resolver(fx.config(strategy), resolver());
        let mut console = Vec::new();
        let result = p.run(&mut console);
        (result, String::from_utf8(console).unwrap())
    }

    #[test]
    fn batch_writes_results_and_intermediates() {
        let fx = Fixture::new("a.test\n\n  b.test  \nslow.test\n");
        let (summary, console) = run(&fx, Strategy::Batch);

        assert_eq!(
            summary.unwrap(),
            RunSummary {
                processed: 3,
                resolved: 2,
                failed: 1
            }
        );
        assert_eq!(
            fx.results(),
            vec![
                HostResult::new("a.test", "10.0.0.1"),
                HostResult::new("b.test", "10.0.0.2"),
                HostResult::new("slow.test", ""),
            ]
        );
        assert_eq!(load(&fx.path(TEMP_RESULTS_FILE)).len(), 3);
        assert!(!fx.path(OLD_RESULTS_FILE).exists());

        assert!(console.contains("Processed: b.test\n"));
        assert!(console.contains("Error: Timeout occurred while resolving 'slow.test'"));
        assert_eq!(fx.log().lines().count(), 1);
        assert!(fx.log().contains("Input: slow.test"));
    }

    #[test]
    fn batch_merges_into_existing_output() {
        let fx = Fixture::new("b.test\nc.test\n");
        std::fs::write(
            fx.path("out.json"),
            r#"[{"hostname":"c.test","ip":"1.1.1.1"},{"hostname":"z.test","ip":"9.9.9.9"}]"#,
        )
        .unwrap();

        run(&fx, Strategy::Batch).0.unwrap();

        assert_eq!(
            fx.results(),
            vec![
                HostResult::new("c.test", ""),
                HostResult::new("z.test", "9.9.9.9"),
                HostResult::new("b.test", "10.0.0.2"),
            ]
        );
        assert_eq!(load(&fx.path(OLD_RESULTS_FILE)).len(), 2);
    }

    #[test]
    fn batch_output_is_two_space_indented() {
        let fx = Fixture::new("a.test\n");
        run(&fx, Strategy::Batch).0.unwrap();
        let raw = std::fs::read_to_string(fx.path("out.json")).unwrap();
        assert!(raw.starts_with("[\n  {\n    \"hostname\""));
    }

    #[test]
    fn incremental_resets_then_appends() {
        let fx = Fixture::new("b.test\na.test\n");
        std::fs::write(
            fx.path("out.json"),
            r#"[{"hostname":"old.test","ip":"1.1.1.1"}]"#,
        )
        .unwrap();

        run(&fx, Strategy::Incremental).0.unwrap();

        assert_eq!(
            fx.results(),
            vec![
                HostResult::new("b.test", "10.0.0.2"),
                HostResult::new("a.test", "10.0.0.1"),
            ]
        );
        let raw = std::fs::read_to_string(fx.path("out.json")).unwrap();
        assert!(raw.starts_with("[\n    {\n        \"hostname\""));
        assert!(!fx.path(TEMP_RESULTS_FILE).exists());
    }

    #[test]
    fn incremental_output_init_failure_aborts() {
        let fx = Fixture::new("a.test\n");
        let config = ProcessConfig {
            output: fx.path("missing-dir/out.json"),
            ..fx.config(Strategy::Incremental)
        };
        let p = Processor::with_resolver(config, resolver());

        let mut console = Vec::new();
        assert!(matches!(
            p.run(&mut console),
            Err(Error::OutputWriteFailure { .. })
        ));
        assert!(console.is_empty());
    }

    #[test]
    fn missing_input_is_reported_not_returned() {
        let fx = Fixture::new("");
        let config = ProcessConfig {
            input: fx.path("nope.txt"),
            ..fx.config(Strategy::Batch)
        };
        let p = Processor::with_resolver(config, resolver());

        let mut console = Vec::new();
        p.process(&mut console).unwrap();

        let console = String::from_utf8(console).unwrap();
        assert!(console.starts_with("Error: input file"));
        assert!(!fx.path("out.json").exists());
        assert!(fx.log().contains("not found"));
    }

    #[test]
    fn empty_input_is_a_warning() {
        let fx = Fixture::new("");
        let p = Processor::with_resolver(fx.config(Strategy::Batch), resolver());

        let mut console = Vec::new();
        p.process(&mut console).unwrap();

        let console = String::from_utf8(console).unwrap();
        assert!(console.starts_with("Warning: The input file"));
        assert!(fx.log().contains("is empty."));
        assert!(!fx.path("out.json").exists());
    }

    #[test]
    fn corrupt_old_results_abort_the_batch() {
        let fx = Fixture::new("a.test\n");
        std::fs::write(fx.path("out.json"), "not json").unwrap();

        let (result, _) = run(&fx, Strategy::Batch);
        assert!(matches!(result, Err(Error::CorruptOutput { .. })));
        assert_eq!(
            std::fs::read_to_string(fx.path("out.json")).unwrap(),
            "not json"
        );
    }

    #[test]
    fn process_prints_completion() {
        let fx = Fixture::new("a.test\n");
        let p = Processor::with_resolver(fx.config(Strategy::Batch), resolver());

        let mut console = Vec::new();
        p.process(&mut console).unwrap();

        let console = String::from_utf8(console).unwrap();
        assert!(console.ends_with(&format!(
            "Processing complete. Results have been saved to {}\n",
            fx.path("out.json").display()
        )));
        assert_eq!(fx.log(), "");
    }

    /// Runs `hook` with the trimmed hostname before each lookup.
    struct Hooked<F> {
        inner: StaticResolver,
        hook: F,
    }

    impl<F: Fn(&str)> Resolve for Hooked<F> {
        fn resolve(&self, hostname: &str, timeout: std::time::Duration) -> crate::Resolution {
            (self.hook)(hostname.trim());
            self.inner.resolve(hostname, timeout)
        }
    }

    fn run_with<F: Fn(&str)>(config: ProcessConfig, hook: F) -> (Result<RunSummary>, String) {
        let p = Processor::with_resolver(
            config,
            Hooked {
                inner: resolver(),
                hook,
            },
        );
        let mut console = Vec::new();
        let result = p.run(&mut console);
        (result, String::from_utf8(console).unwrap())
    }

    fn batch_into(fx: &Fixture, output: &str) -> ProcessConfig {
        ProcessConfig {
            output: fx.path(output),
            ..fx.config(Strategy::Batch)
        }
    }

    #[test]
    fn batch_output_named_like_snapshot_keeps_old_records() {
        let fx = Fixture::new("a.test
");
        std::fs::write(
            fx.path(OLD_RESULTS_FILE),
            r#"[{"hostname":"keep.test","ip":"1.1.1.1"}]"#,
        )
        .unwrap();

        let (result, _) = run_with(batch_into(&fx, OLD_RESULTS_FILE), |_| {});

        result.unwrap();
        assert_eq!(
            load(&fx.path(OLD_RESULTS_FILE)),
            vec![
                HostResult::new("keep.test", "1.1.1.1"),
                HostResult::new("a.test", "10.0.0.1"),
            ]
        );
    }

    #[test]
    fn batch_output_named_like_scratch_keeps_old_records() {
        let fx = Fixture::new("a.test
b.test
");
        std::fs::write(
            fx.path(TEMP_RESULTS_FILE),
            r#"[{"hostname":"keep.test","ip":"1.1.1.1"},{"hostname":"a.test","ip":""}]"#,
        )
        .unwrap();

        let (result, _) = run_with(batch_into(&fx, TEMP_RESULTS_FILE), |_| {});

        result.unwrap();
        assert_eq!(
            load(&fx.path(TEMP_RESULTS_FILE)),
            vec![
                HostResult::new("keep.test", "1.1.1.1"),
                HostResult::new("a.test", "10.0.0.1"),
                HostResult::new("b.test", "10.0.0.2"),
            ]
        );
        assert_eq!(load(&fx.path(OLD_RESULTS_FILE)).len(), 2);
    }

    #[test]
    fn same_file_sees_through_relative_segments() {
        let fx = Fixture::new("");
        let nested = fx.path("nested");
        std::fs::create_dir(&nested).unwrap();

        assert!(same_file(
            &nested.join("..").join(OLD_RESULTS_FILE),
            &fx.path(OLD_RESULTS_FILE)
        ));
        assert!(!same_file(&fx.path(OLD_RESULTS_FILE), &fx.path(TEMP_RESULTS_FILE)));
    }

    #[test]
    fn incremental_corrupt_output_is_logged_and_reset() {
        let fx = Fixture::new("a.test
b.test
");
        let out = fx.path("out.json");

        let (result, console) = run_with(fx.config(Strategy::Incremental), |host| {
            if host == "b.test" {
                std::fs::write(&out, "{oops").unwrap();
            }
        });

        result.unwrap();
        assert_eq!(fx.results(), vec![HostResult::new("b.test", "10.0.0.2")]);
        assert!(console.contains("Warning: Invalid JSON in"));
        assert!(console.ends_with("Processed: b.test\n"));

        let log = fx.log();
        assert_eq!(log.lines().count(), 1);
        assert!(log.contains("Input: b.test - Error: Invalid JSON in"));
    }

    #[test]
    fn incremental_write_failure_skips_only_that_record() {
        let fx = Fixture::new("a.test
b.test
slow.test
");
        let out = fx.path("out.json");

        let (result, console) = run_with(fx.config(Strategy::Incremental), |host| match host {
            "b.test" => {
                std::fs::remove_file(&out).unwrap();
                std::fs::create_dir(&out).unwrap();
            }
            "slow.test" => std::fs::remove_dir(&out).unwrap(),
            _ => {}
        });

        assert_eq!(
            result.unwrap(),
            RunSummary {
                processed: 3,
                resolved: 2,
                failed: 1
            }
        );
        assert_eq!(fx.results(), vec![HostResult::new("slow.test", "")]);
        for host in ["a.test", "b.test", "slow.test"] {
            assert!(console.contains(&format!("Processed: {host}\n")));
        }

        let log = fx.log();
        assert!(log.contains("Input: b.test - Error: failed to write"));
        assert!(log.contains("Input: slow.test - Error: Timeout occurred"));
        assert_eq!(log.lines().count(), 2);
    }
}
