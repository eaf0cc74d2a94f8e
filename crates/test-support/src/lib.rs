#![deny(unsafe_code)]
#![deny(missing_docs)]

//! Shared fixtures for integration tests.
//!
//! - [`ScriptedRemote`] is a [`RemoteSource`](engine::RemoteSource) whose
//!   answers are queued per path.
//! - [`fixtures`] builds symbol indexes and the remote documents that carry
//!   them.
//! - [`FailingReplace`] makes the last step of a snapshot write fail.

pub mod fixtures;
mod replace;
mod scripted;

pub use replace::FailingReplace;
pub use scripted::{Scripted, ScriptedRemote};

use std::path::Path;
use std::time::Duration;

use engine::SyncConfig;
use tempfile::TempDir;

/// Creates a fresh temporary directory.
#[must_use]
pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("create temp dir")
}

/// Configuration with short, distinct delays rooted at `cache_dir`.
///
/// Succeeded 100 s, failed 10 s, poll 1 s, persist 3 x 100 ms.
#[must_use]
pub fn test_config(cache_dir: &Path) -> SyncConfig {
    SyncConfig::new()
        .cache_dir(cache_dir)
        .succeeded_delay(Duration::from_secs(100))
        .failed_delay(Duration::from_secs(10))
        .poll_interval(Duration::from_secs(1))
        .persist_attempts(3)
        .persist_retry_delay(Duration::from_millis(100))
}
