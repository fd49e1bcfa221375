//! JSON result store.
//!
//! The store is a JSON array of `{"hostname": ..., "ip": ...}` objects. Full
//! rewrites go through a temporary file in the same directory followed by a
//! rename, so readers never observe a half-written array.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use tempfile::NamedTempFile;

use crate::error::{Error, Result};
use crate::resolver::Resolution;

/// Resolution result for one hostname. `ip` is empty when the lookup failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostResult {
    /// Hostname as read from the input, trimmed.
    pub hostname: String,
    /// Dotted IPv4 address, or empty if the lookup failed.
    pub ip: String,
}

impl HostResult {
    /// Creates a record from its parts.
    #[must_use]
    pub fn new(hostname: impl Into<String>, ip: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            ip: ip.into(),
        }
    }

    /// Builds the record for `hostname`, leaving `ip` empty on failure.
    #[must_use]
    pub fn from_resolution(hostname: impl Into<String>, resolution: &Resolution) -> Self {
        let ip = resolution
            .address()
            .map(|addr| addr.to_string())
            .unwrap_or_default();
        Self::new(hostname, ip)
    }

    /// Returns `true` if the record carries an address.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        !self.ip.is_empty()
    }
}

/// What [`ResultStore::load_for_append`] found in the existing file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    /// The file held a valid array (or did not exist).
    Appended,
    /// The file held invalid JSON; its content is discarded.
    RecoveredCorrupt,
}

/// A JSON result file with a fixed indentation width.
#[derive(Debug, Clone)]
pub struct ResultStore {
    path: PathBuf,
    indent: usize,
}

impl ResultStore {
    /// Creates a store at `path`, pretty-printed with `indent` spaces.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, indent: usize) -> Self {
        Self {
            path: path.into(),
            indent,
        }
    }

    /// Returns the store path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads every record. A missing file is an empty store.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CorruptOutput`] if the file is not a JSON array of
    /// results, or [`Error::Io`] if it cannot be read.
    pub fn load(&self) -> Result<Vec<HostResult>> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => self.parse(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "Store does not exist, treating as empty");
                Ok(Vec::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Replaces the file content with `records`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutputWriteFailure`] if the file cannot be written,
    /// or [`Error::Json`] if encoding fails.
    pub fn write(&self, records: &[HostResult]) -> Result<()> {
        let json = self.encode(records)?;
        self.replace(&json).map_err(|source| Error::OutputWriteFailure {
            path: self.path.clone(),
            source,
        })?;
        tracing::debug!(path = %self.path.display(), records = records.len(), "Wrote result store");
        Ok(())
    }

    /// Resets the file to an empty array.
    ///
    /// # Errors
    ///
    /// Same as [`write`](Self::write).
    pub fn reset(&self) -> Result<()> {
        self.write(&[])
    }

    /// Reads the records an update should start from, without writing.
    ///
    /// Invalid JSON yields an empty list and
    /// [`AppendOutcome::RecoveredCorrupt`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutputWriteFailure`] if the existing file cannot be
    /// read, since the update cannot proceed.
    pub fn load_for_append(&self) -> Result<(Vec<HostResult>, AppendOutcome)> {
        match self.load() {
            Ok(records) => Ok((records, AppendOutcome::Appended)),
            Err(Error::CorruptOutput { .. }) => Ok((Vec::new(), AppendOutcome::RecoveredCorrupt)),
            Err(Error::Io(source)) => Err(Error::OutputWriteFailure {
                path: self.path.clone(),
                source,
            }),
            Err(e) => Err(e),
        }
    }

    /// Reads the array, appends `record` and writes the array back.
    ///
    /// Invalid JSON is discarded: the file is rewritten with `record` alone
    /// and [`AppendOutcome::RecoveredCorrupt`] is returned.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutputWriteFailure`] if the file cannot be read or
    /// written.
    pub fn append(&self, record: HostResult) -> Result<AppendOutcome> {
        let (mut records, outcome) = self.load_for_append()?;
        records.push(record);
        self.write(&records)?;
        Ok(outcome)
    }

    fn parse(&self, content: &str) -> Result<Vec<HostResult>> {
        serde_json::from_str(content).map_err(|source| Error::CorruptOutput {
            path: self.path.clone(),
            source,
        })
    }

    fn encode(&self, records: &[HostResult]) -> Result<Vec<u8>> {
        let indent = " ".repeat(self.indent);
        let mut buf = Vec::new();
        let mut ser = serde_json::Serializer::with_formatter(
            &mut buf,
            PrettyFormatter::with_indent(indent.as_bytes()),
        );
        records.serialize(&mut ser)?;
        Ok(buf)
    }

    fn replace(&self, bytes: &[u8]) -> std::io::Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

/// Merges `new` into `old` keyed by hostname.
///
/// Old entries keep their position and take the newer value; hostnames seen
/// for the first time are appended in order.
#[must_use]
pub fn merge(old: Vec<HostResult>, new: Vec<HostResult>) -> Vec<HostResult> {
    let mut merged: Vec<HostResult> = Vec::with_capacity(old.len() + new.len());
    let mut index: HashMap<String, usize> = HashMap::new();

    for record in old.into_iter().chain(new) {
        if let Some(&pos) = index.get(&record.hostname) {
            merged[pos] = record;
        } else {
            index.insert(record.hostname.clone(), merged.len());
            merged.push(record);
        }
    }
    merged
}
