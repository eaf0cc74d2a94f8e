//! crates/engine/src/sync.rs
//!
//! The per-source synchronization state machine.
//!
//! ```text
//! CleanCache -> CheckLocalSnapshot -+-> DownloadFull ------------------+-> Persist -> Publish
//!                                   |                                 |
//!                                   +-> RequestPatch -+-> UpToDate    |
//!                                                     +-> TooOld -----+ (same cycle)
//!                                                     +-> Delta ------+-> Persist -> Publish
//!                                                     +-> corrupt ----+ (same cycle)
//! ```
//!
//! A cycle either succeeds (wait `succeeded_delay`), fails (wait
//! `failed_delay`) or is cancelled (the loop ends). Blocking disk and CPU
//! work runs on the blocking pool; cancellation is checked between states
//! and raced against every fetch and wait.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use checksums::verify;
use index::{ActiveIndex, PublishOutcome, SymbolIndex};
use logging::{trace_sync, warn_sync};
use store::{IoDisposition, ReplaceFile, SnapshotStore};
use tokio_util::sync::CancellationToken;

use crate::config::SyncConfig;
use crate::error::{Payload, Severity, SyncError};
use crate::remote::{Fetched, RemoteSource};
use crate::retry::{Disposition, RetryOutcome, RetryPolicy, retry_async};
use crate::wire::{self, PatchDescriptor};

/// Step of a synchronization cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SyncState {
    /// Ensuring the cache directory exists and removing stale artifacts.
    #[default]
    CleanCache,
    /// Looking for a local snapshot.
    CheckLocalSnapshot,
    /// Fetching, verifying and decoding the full snapshot.
    DownloadFull,
    /// Decoding the local snapshot and fetching its patch.
    RequestPatch,
    /// Writing the new snapshot to the cache.
    Persist,
    /// Installing the new index.
    Publish,
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::CleanCache => "clean-cache",
            Self::CheckLocalSnapshot => "check-local-snapshot",
            Self::DownloadFull => "download-full",
            Self::RequestPatch => "request-patch",
            Self::Persist => "persist",
            Self::Publish => "publish",
        })
    }
}

/// Why a cycle downloaded the full snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DownloadReason {
    /// No cache file existed.
    NoLocalSnapshot,
    /// The source reported the local snapshot as too old to patch.
    TooOld,
    /// The patch path hit corrupt content.
    PatchFailed,
}

/// What one cycle did.
#[derive(Debug)]
pub enum CycleOutcome {
    /// A full snapshot was persisted and published.
    Downloaded {
        /// Version of the new snapshot.
        version: String,
        /// Why the full snapshot was needed.
        reason: DownloadReason,
    },
    /// A patch was applied, persisted and published.
    Patched {
        /// Local version the patch was applied to.
        from: String,
        /// Version after patching.
        to: String,
    },
    /// The local snapshot is current.
    UpToDate {
        /// Current version.
        version: String,
    },
    /// The cycle failed.
    Failed {
        /// State the failure occurred in.
        state: SyncState,
        /// What went wrong.
        error: SyncError,
    },
    /// Cancellation was requested.
    Cancelled,
}

/// Result of [`SyncEngine::run_cycle`].
#[derive(Debug)]
pub struct CycleReport {
    /// What happened.
    pub outcome: CycleOutcome,
    /// Wait before the next cycle; `None` ends the loop.
    pub delay: Option<Duration>,
}

impl CycleReport {
    /// Reports whether the cycle succeeded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(
            self.outcome,
            CycleOutcome::Downloaded { .. } | CycleOutcome::Patched { .. } | CycleOutcome::UpToDate { .. }
        )
    }
}

/// Where the current cycle is, for failure reports.
#[derive(Debug, Default)]
struct Progress {
    state: SyncState,
    bytes: usize,
}

impl Progress {
    fn enter(&mut self, state: SyncState) {
        self.state = state;
        self.bytes = 0;
    }
}

/// Keeps one source's snapshot fresh on disk and in the holder.
#[derive(Debug)]
pub struct SyncEngine<R> {
    source: String,
    config: SyncConfig,
    store: SnapshotStore,
    remote: R,
    holder: Arc<ActiveIndex>,
    cancel: CancellationToken,
}

impl<R: RemoteSource> SyncEngine<R> {
    /// Creates an engine for `source` publishing into `holder`.
    pub fn new(
        source: impl Into<String>,
        config: SyncConfig,
        remote: R,
        holder: Arc<ActiveIndex>,
    ) -> Self {
        Self {
            source: source.into(),
            store: SnapshotStore::new(config.cache_dir.clone()),
            config,
            remote,
            holder,
            cancel: CancellationToken::new(),
        }
    }

    /// Replaces the cancellation token.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Uses `replace` to move persisted snapshots into place.
    #[must_use]
    pub fn with_replace<F: ReplaceFile + 'static>(mut self, replace: Arc<F>) -> Self {
        self.store = self.store.with_replace(replace);
        self
    }

    /// Returns the distribution source id.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the cancellation token observed by the engine.
    #[must_use]
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Returns the snapshot store.
    #[must_use]
    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Runs cycles until cancelled, waiting the reported delay in between.
    pub async fn run(self) {
        trace_sync!(
            source = %self.source,
            cache = %self.store.dir().display(),
            "sync loop started"
        );
        loop {
            let Some(delay) = self.run_cycle().await.delay else {
                break;
            };
            if self.sleep(delay).await.is_err() {
                break;
            }
        }
        trace_sync!(source = %self.source, "sync loop stopped");
    }

    /// Performs one cycle and reports the outcome and the next delay.
    pub async fn run_cycle(&self) -> CycleReport {
        let mut progress = Progress::default();
        match self.cycle(&mut progress).await {
            Ok(outcome) => {
                let delay = self.config.succeeded_delay;
                trace_sync!(
                    source = %self.source,
                    outcome = ?outcome,
                    delay_secs = delay.as_secs_f64(),
                    "sync cycle succeeded"
                );
                CycleReport {
                    outcome,
                    delay: Some(delay),
                }
            }
            Err(error) if error.severity() == Severity::Cancelled => {
                trace_sync!(source = %self.source, state = %progress.state, "sync cycle cancelled");
                CycleReport {
                    outcome: CycleOutcome::Cancelled,
                    delay: None,
                }
            }
            Err(error) => {
                let delay = self.config.failed_delay;
                warn_sync!(
                    source = %self.source,
                    state = %progress.state,
                    bytes = progress.bytes,
                    delay_secs = delay.as_secs_f64(),
                    error = %error,
                    "sync cycle failed"
                );
                CycleReport {
                    outcome: CycleOutcome::Failed {
                        state: progress.state,
                        error,
                    },
                    delay: Some(delay),
                }
            }
        }
    }

    async fn cycle(&self, progress: &mut Progress) -> Result<CycleOutcome, SyncError> {
        progress.enter(SyncState::CleanCache);
        self.checkpoint()?;
        let store = self.store.clone();
        let source = self.source.clone();
        blocking(move || Ok(store.clean(&source)?)).await?;

        progress.enter(SyncState::CheckLocalSnapshot);
        self.checkpoint()?;
        let store = self.store.clone();
        let source = self.source.clone();
        let Some(local) = blocking(move || Ok(store.read(&source)?)).await? else {
            return self
                .download_full(progress, DownloadReason::NoLocalSnapshot)
                .await;
        };

        progress.enter(SyncState::RequestPatch);
        match self.request_patch(progress, local).await {
            Ok(Some(outcome)) => Ok(outcome),
            Ok(None) => self.download_full(progress, DownloadReason::TooOld).await,
            Err(error) if error.severity() == Severity::CorruptContent => {
                warn_sync!(
                    source = %self.source,
                    state = %progress.state,
                    bytes = progress.bytes,
                    error = %error,
                    "patch path failed; downloading full snapshot"
                );
                self.download_full(progress, DownloadReason::PatchFailed).await
            }
            Err(error) => Err(error),
        }
    }

    /// Returns `None` when the source reports the local snapshot too old.
    async fn request_patch(
        &self,
        progress: &mut Progress,
        local: Vec<u8>,
    ) -> Result<Option<CycleOutcome>, SyncError> {
        progress.bytes = local.len();
        let local: Arc<[u8]> = local.into();
        let bytes = Arc::clone(&local);
        let current = blocking(move || Ok(index::decode(&bytes)?)).await?;
        let from = current.version().to_owned();
        self.holder.publish(current);

        self.checkpoint()?;
        let body = self.fetch_until_available(&wire::patch_path(&from)).await?;
        progress.bytes = body.len();

        match wire::parse_patch(&body)? {
            PatchDescriptor::UpToDate => {
                trace_sync!(source = %self.source, version = %from, "snapshot is up to date");
                Ok(Some(CycleOutcome::UpToDate { version: from }))
            }
            PatchDescriptor::TooOld => {
                trace_sync!(source = %self.source, version = %from, "snapshot too old to patch");
                Ok(None)
            }
            PatchDescriptor::Delta { bytes, checksum } => {
                let (snapshot, next) = blocking(move || {
                    verify(&bytes, checksum.as_ref()).map_err(|source| SyncError::Integrity {
                        payload: Payload::Patch,
                        source,
                    })?;
                    let snapshot = delta::apply_patch(&local, &bytes)?;
                    let next = index::decode(&snapshot)?;
                    Ok((snapshot, next))
                })
                .await?;
                let to = next.version().to_owned();
                self.install(progress, snapshot, next).await?;
                Ok(Some(CycleOutcome::Patched { from, to }))
            }
        }
    }

    async fn download_full(
        &self,
        progress: &mut Progress,
        reason: DownloadReason,
    ) -> Result<CycleOutcome, SyncError> {
        progress.enter(SyncState::DownloadFull);
        self.checkpoint()?;
        let body = self.fetch_until_available(&wire::full_snapshot_path()).await?;
        progress.bytes = body.len();

        let limit = self.config.max_snapshot_bytes;
        let (snapshot, next) = blocking(move || {
            let document = wire::parse_full(&body)?;
            verify(&document.compressed, document.checksum.as_ref()).map_err(|source| {
                SyncError::Integrity {
                    payload: Payload::Snapshot,
                    source,
                }
            })?;
            let snapshot = wire::inflate(&document.compressed, limit)?;
            let next = index::decode(&snapshot)?;
            Ok((snapshot, next))
        })
        .await?;

        let version = next.version().to_owned();
        self.install(progress, snapshot, next).await?;
        Ok(CycleOutcome::Downloaded { version, reason })
    }

    /// Persists `snapshot`, then publishes `next`.
    async fn install(
        &self,
        progress: &mut Progress,
        snapshot: Vec<u8>,
        next: SymbolIndex,
    ) -> Result<(), SyncError> {
        progress.enter(SyncState::Persist);
        progress.bytes = snapshot.len();
        self.checkpoint()?;
        self.persist(snapshot.into()).await?;

        progress.enter(SyncState::Publish);
        let version = next.version().to_owned();
        let entries = next.len();
        if let PublishOutcome::Installed { previous } = self.holder.publish(next) {
            trace_sync!(
                source = %self.source,
                version = %version,
                previous = ?previous,
                entries,
                "published symbol index"
            );
        }
        Ok(())
    }

    async fn persist(&self, snapshot: Arc<[u8]>) -> Result<(), SyncError> {
        let policy = RetryPolicy::new(self.config.persist_attempts, self.config.persist_retry_delay);
        let outcome = retry_async(
            policy,
            &self.cancel,
            |attempt| {
                let store = self.store.clone();
                let source = self.source.clone();
                let label = self.source.as_str();
                let bytes = Arc::clone(&snapshot);
                async move {
                    let result = blocking(move || Ok(store.persist(&source, &bytes)?)).await;
                    if let Err(error) = &result {
                        warn_sync!(source = %label, attempt, error = %error, "persist attempt failed");
                    }
                    result
                }
            },
            classify_persist,
        )
        .await;

        match outcome {
            RetryOutcome::Success { attempts, .. } => {
                if attempts > 1 {
                    trace_sync!(source = %self.source, attempts, "snapshot persisted after retries");
                }
                Ok(())
            }
            RetryOutcome::Exhausted { error, attempts } | RetryOutcome::Aborted { error, attempts } => {
                Err(SyncError::Persist {
                    attempts,
                    source: Box::new(error),
                })
            }
            RetryOutcome::Cancelled { .. } => Err(SyncError::Cancelled),
        }
    }

    async fn fetch_until_available(&self, path: &str) -> Result<Vec<u8>, SyncError> {
        loop {
            self.checkpoint()?;
            let fetched = tokio::select! {
                biased;
                () = self.cancel.cancelled() => return Err(SyncError::Cancelled),
                result = self.remote.fetch(&self.source, path) => {
                    result.map_err(|source| SyncError::Remote {
                        path: path.to_owned(),
                        source,
                    })?
                }
            };
            match fetched {
                Fetched::Available(body) => return Ok(body),
                Fetched::NotYetAvailable => {
                    trace_sync!(
                        source = %self.source,
                        path,
                        poll_secs = self.config.poll_interval.as_secs_f64(),
                        "content not yet available"
                    );
                    self.sleep(self.config.poll_interval).await?;
                }
            }
        }
    }

    async fn sleep(&self, delay: Duration) -> Result<(), SyncError> {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(SyncError::Cancelled),
            () = tokio::time::sleep(delay) => Ok(()),
        }
    }

    fn checkpoint(&self) -> Result<(), SyncError> {
        if self.cancel.is_cancelled() {
            Err(SyncError::Cancelled)
        } else {
            Ok(())
        }
    }
}

fn classify_persist(error: &SyncError) -> Disposition {
    match error {
        SyncError::Store(store) if store.disposition() == IoDisposition::Fatal => Disposition::Abort,
        SyncError::Store(_) | SyncError::Task(_) => Disposition::Retry,
        _ => Disposition::Abort,
    }
}

/// Runs blocking work on the blocking pool.
async fn blocking<T, F>(work: F) -> Result<T, SyncError>
where
    F: FnOnce() -> Result<T, SyncError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|err| SyncError::Task(err.to_string()))?
}
