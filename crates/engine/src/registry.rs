//! crates/engine/src/registry.rs
//!
//! At most one running loop per distribution source.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use logging::{trace_registry, warn_sync};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::remote::RemoteSource;
use crate::sync::SyncEngine;

/// Result of [`SyncRegistry::start`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StartOutcome {
    /// A new loop was spawned.
    Started,
    /// A loop for this source is already running; the engine was dropped.
    AlreadyRunning,
    /// The registry has been shut down.
    ShutDown,
}

#[derive(Debug)]
struct RunningLoop {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Tracks the running synchronization loop of each source.
///
/// The first [`start`](Self::start) for a source id spawns its loop; later
/// calls observe [`StartOutcome::AlreadyRunning`]. The check and the insert
/// happen under one map entry lock, so concurrent callers cannot both spawn.
/// Dropping the registry cancels every loop without waiting for it.
#[derive(Debug)]
pub struct SyncRegistry {
    runtime: Handle,
    shutdown: CancellationToken,
    loops: DashMap<String, RunningLoop>,
}

impl SyncRegistry {
    /// Creates a registry spawning loops on `runtime`.
    #[must_use]
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            shutdown: CancellationToken::new(),
            loops: DashMap::new(),
        }
    }

    /// Spawns `engine`'s loop unless its source already has a live one.
    ///
    /// A loop whose task has already ended (it panicked) is replaced.
    pub fn start<R>(&self, engine: SyncEngine<R>) -> StartOutcome
    where
        R: RemoteSource + 'static,
    {
        if self.shutdown.is_cancelled() {
            return StartOutcome::ShutDown;
        }

        match self.loops.entry(engine.source().to_owned()) {
            Entry::Occupied(mut occupied) if occupied.get().task.is_finished() => {
                warn_sync!(source = %occupied.key(), "replacing sync loop that ended unexpectedly");
                occupied.insert(self.spawn(engine));
                StartOutcome::Started
            }
            Entry::Occupied(occupied) => {
                trace_registry!(source = %occupied.key(), "sync loop already running");
                StartOutcome::AlreadyRunning
            }
            Entry::Vacant(vacant) => {
                trace_registry!(source = %vacant.key(), "starting sync loop");
                vacant.insert(self.spawn(engine));
                StartOutcome::Started
            }
        }
    }

    fn spawn<R>(&self, engine: SyncEngine<R>) -> RunningLoop
    where
        R: RemoteSource + 'static,
    {
        let cancel = self.shutdown.child_token();
        let engine = engine.with_cancellation(cancel.clone());
        RunningLoop {
            cancel,
            task: self.runtime.spawn(engine.run()),
        }
    }

    /// Reports whether `source` has a live loop.
    #[must_use]
    pub fn is_running(&self, source: &str) -> bool {
        self.loops
            .get(source)
            .is_some_and(|running| !running.task.is_finished())
    }

    /// Returns the ids of every registered source, sorted.
    #[must_use]
    pub fn sources(&self) -> Vec<String> {
        let mut sources: Vec<String> = self.loops.iter().map(|entry| entry.key().clone()).collect();
        sources.sort();
        sources
    }

    /// Cancels the loop of `source` and waits for it to finish. Returns
    /// `false` when no loop was registered.
    pub async fn stop(&self, source: &str) -> bool {
        let Some((source, running)) = self.loops.remove(source) else {
            return false;
        };
        running.cancel.cancel();
        join(&source, running.task).await;
        trace_registry!(source = %source, "sync loop stopped");
        true
    }

    /// Cancels every loop, waits for them, and refuses further starts.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        for source in self.sources() {
            if let Some((source, running)) = self.loops.remove(&source) {
                join(&source, running.task).await;
            }
        }
        trace_registry!("sync registry shut down");
    }

    /// Reports whether [`shutdown`](Self::shutdown) has been requested.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}

impl Drop for SyncRegistry {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn join(source: &str, task: JoinHandle<()>) {
    if let Err(err) = task.await {
        if err.is_panic() {
            warn_sync!(source = %source, "sync loop panicked");
        }
    }
}
