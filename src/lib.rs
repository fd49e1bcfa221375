//! # hostlist-resolver
//!
//! Resolve a file of hostnames to IPv4 addresses and keep the results in a
//! JSON store keyed by hostname.
//!
//! Each non-blank input line is looked up once through the system resolver
//! with a bounded timeout. Failures are classified (not found, timeout,
//! unexpected), printed, appended to a plain-text error log and recorded
//! with an empty address; the run carries on with the next hostname.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use hostlist_resolver::{ProcessConfig, Processor, Strategy};
//!
//! let config = ProcessConfig::new("hosts.txt", "results.json")
//!     .with_strategy(Strategy::Batch);
//!
//! Processor::new(config).process(&mut std::io::stdout())?;
//! ```
//!
//! ## Persistence
//!
//! Two strategies are available:
//!
//! - [`Strategy::Batch`] (default) buffers every result, writes them to
//!   `temp_results.json`, snapshots the existing output to
//!   `old_results.json` and merges both into the output in a single atomic
//!   write. Existing hostnames keep their position and take the new value.
//! - [`Strategy::Incremental`] resets the output to `[]` and rewrites the
//!   whole array after every hostname, so a crash loses at most one record.
//!
//! ## Output format
//!
//! ```json
//! [
//!   {
//!     "hostname": "example.com",
//!     "ip": "93.184.216.34"
//!   }
//! ]
//! ```
//!
//! Only the first IPv4 address returned for a name is kept.

#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod error_log;
pub mod processor;
pub mod resolver;
pub mod store;
pub mod util;

pub use config::{ProcessConfig, Strategy};
pub use error::{Error, ErrorClass, ResolveFailure, Result};
pub use error_log::ErrorLog;
pub use processor::{Processor, RunSummary};
pub use resolver::{Resolution, Resolve, StaticResolver, SystemResolver};
pub use store::{AppendOutcome, HostResult, ResultStore, merge};
