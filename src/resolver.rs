//! Hostname resolution with a bounded timeout.
//!
//! [`SystemResolver`] asks the operating system's resolver for an IPv4
//! address. The lookup itself cannot be interrupted, so it runs on a
//! short-lived worker thread while the caller waits at most `timeout` for the
//! answer. A lookup that misses the deadline is abandoned and its thread
//! exits on its own once the system call returns.

use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use crate::error::ResolveFailure;
use crate::util::lookup_ipv4;

/// Outcome of a single lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The first address the naming system returned.
    Resolved(Ipv4Addr),
    /// The lookup failed.
    Failed(ResolveFailure),
}

impl Resolution {
    /// Returns the address, if the lookup succeeded.
    #[must_use]
    pub const fn address(&self) -> Option<Ipv4Addr> {
        match self {
            Self::Resolved(addr) => Some(*addr),
            Self::Failed(_) => None,
        }
    }

    /// Returns the failure, if the lookup failed.
    #[must_use]
    pub const fn failure(&self) -> Option<&ResolveFailure> {
        match self {
            Self::Resolved(_) => None,
            Self::Failed(failure) => Some(failure),
        }
    }
}

impl From<Result<Ipv4Addr, ResolveFailure>> for Resolution {
    fn from(result: Result<Ipv4Addr, ResolveFailure>) -> Self {
        match result {
            Ok(addr) => Self::Resolved(addr),
            Err(failure) => Self::Failed(failure),
        }
    }
}

/// Resolves one hostname, once.
pub trait Resolve {
    /// Looks up `hostname` (surrounding whitespace ignored), giving up after
    /// `timeout`.
    fn resolve(&self, hostname: &str, timeout: Duration) -> Resolution;
}

/// Resolver backed by the operating system (`getaddrinfo`).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

impl SystemResolver {
    /// Creates a system resolver.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Resolve for SystemResolver {
    fn resolve(&self, hostname: &str, timeout: Duration) -> Resolution {
        let host = hostname.trim().to_string();
        let (tx, rx) = mpsc::channel();

        let spawned = thread::Builder::new()
            .name("lookup".into())
            .spawn(move || {
                // The receiver is gone if the caller already timed out.
                let _ = tx.send(lookup_ipv4(&host));
            });
        if let Err(e) = spawned {
            return Resolution::Failed(ResolveFailure::Unexpected(format!(
                "failed to start lookup: {e}"
            )));
        }

        match rx.recv_timeout(timeout) {
            Ok(result) => result.into(),
            Err(RecvTimeoutError::Timeout) => {
                tracing::debug!(host = %hostname.trim(), ?timeout, "Lookup timed out");
                Resolution::Failed(ResolveFailure::Timeout)
            }
            Err(RecvTimeoutError::Disconnected) => Resolution::Failed(
                ResolveFailure::Unexpected("lookup worker exited without an answer".into()),
            ),
        }
    }
}

/// Resolver answering from a fixed table; unknown names are not found.
///
/// # Example
///
/// ```
/// use hostlist_resolver::{Resolve, Resolution, StaticResolver};
/// use std::time::Duration;
///
/// let resolver = StaticResolver::new().with_address("example.com", [93, 184, 216, 34].into());
///
/// let timeout = Duration::from_secs(5);
/// assert_eq!(
///     resolver.resolve(" example.com ", timeout),
///     Resolution::Resolved([93, 184, 216, 34].into())
/// );
/// assert!(resolver.resolve("other.test", timeout).failure().is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    answers: HashMap<String, Resolution>,
}

impl StaticResolver {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers `hostname` with `addr`.
    #[must_use]
    pub fn with_address(mut self, hostname: impl Into<String>, addr: Ipv4Addr) -> Self {
        self.answers
            .insert(hostname.into(), Resolution::Resolved(addr));
        self
    }

    /// Answers `hostname` with `failure`.
    #[must_use]
    pub fn with_failure(mut self, hostname: impl Into<String>, failure: ResolveFailure) -> Self {
        self.answers
            .insert(hostname.into(), Resolution::Failed(failure));
        self
    }
}

impl Resolve for StaticResolver {
    fn resolve(&self, hostname: &str, _timeout: Duration) -> Resolution {
        self.answers
            .get(hostname.trim())
            .cloned()
            .unwrap_or(Resolution::Failed(ResolveFailure::NotFound))
    }
}
