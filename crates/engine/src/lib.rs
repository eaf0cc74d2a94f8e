#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `engine` keeps a local symbol snapshot in step with a remote distribution
//! source. Each source gets one long-lived loop that decides between a full
//! download and a delta patch, verifies what it fetched, persists it
//! atomically, and publishes the decoded index into an
//! [`index::ActiveIndex`] that queries read without waiting on the loop.
//!
//! # Design
//!
//! - [`SyncEngine`] is the state machine. [`SyncEngine::run_cycle`] performs
//!   one pass and returns a [`CycleReport`] with the outcome and the delay
//!   before the next pass; [`SyncEngine::run`] repeats it until cancelled.
//! - [`RemoteSource`] is the transport seam. [`DirectorySource`] serves a
//!   local mirror; `HttpSource` (feature `http`) serves HTTP(S).
//! - [`wire`] owns the JSON response documents: base64 payloads, optional
//!   SHA-256 checksums, zlib-compressed full snapshots.
//! - [`retry_async`] is the bounded, cancellable retry used for persisting.
//! - [`SyncRegistry`] guarantees one loop per source id.
//!
//! # Invariants
//!
//! - Nothing is published or persisted unless it verified and decoded.
//! - Corrupt content on the patch path falls back to a full download in the
//!   same cycle; a corrupt full download fails the cycle.
//! - Cancellation is observed between states and during every fetch and
//!   wait. A cancelled cycle publishes nothing new.
//!
//! # Errors
//!
//! Cycle failures are [`SyncError`]s. [`SyncError::severity`] separates
//! transient trouble (network, disk) from corrupt content and cancellation.
//! They never escape the loop: each is logged and becomes the next delay.
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use engine::{DirectorySource, SyncConfig, SyncEngine};
//! use index::ActiveIndex;
//!
//! # async fn demo() {
//! let holder = Arc::new(ActiveIndex::new());
//! let config = SyncConfig::new().cache_dir("/var/cache/symdex");
//! let engine = SyncEngine::new("nuget.org", config, DirectorySource::new("/srv/mirror"), holder);
//! let report = engine.run_cycle().await;
//! println!("{:?}, next cycle in {:?}", report.outcome, report.delay);
//! # }
//! ```

mod config;
mod error;
mod registry;
pub mod remote;
mod retry;
mod sync;
pub mod wire;

pub use config::{
    ConfigError, DEFAULT_FAILED_DELAY, DEFAULT_MAX_SNAPSHOT_BYTES, DEFAULT_PERSIST_ATTEMPTS,
    DEFAULT_PERSIST_RETRY_DELAY, DEFAULT_POLL_INTERVAL, DEFAULT_SUCCEEDED_DELAY, SyncConfig,
    default_cache_dir,
};
pub use error::{Payload, Severity, SyncError};
pub use registry::{StartOutcome, SyncRegistry};
#[cfg(feature = "http")]
pub use remote::HttpSource;
pub use remote::{DirectorySource, Fetched, RemoteError, RemoteSource};
pub use retry::{Disposition, RetryOutcome, RetryPolicy, retry_async};
pub use sync::{CycleOutcome, CycleReport, DownloadReason, SyncEngine, SyncState};
pub use tokio_util::sync::CancellationToken;
