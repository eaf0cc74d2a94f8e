#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `symdex` keeps a local, queryable snapshot of a remote symbol catalog
//! fresh on disk and in memory, and answers "which packages define symbol X"
//! without ever waiting on the download machinery.
//!
//! [`SymbolSearchService`] ties the workspace together: it starts one
//! background synchronization loop per distribution source
//! ([`engine::SyncEngine`] via [`engine::SyncRegistry`]) and serves ranked
//! queries ([`index::QueryEngine`]) over the indexes those loops publish.
//!
//! # Design
//!
//! Every source publishes into its own [`index::ActiveIndex`] inside one
//! [`index::SourceIndexes`] set. Queries rank the matches of all published
//! indexes together, loading each with a single atomic read, so searching
//! before the first snapshot arrived simply yields nothing.
//!
//! # Errors
//!
//! Synchronization failures never reach callers; loops log them and retry
//! later. [`ServiceError`] only covers misuse of the service itself.
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use symdex::{DirectorySource, NoInstalledPackages, SymbolSearchService, SyncConfig};
//!
//! # async fn demo() -> Result<(), symdex::ServiceError> {
//! let service = SymbolSearchService::new(
//!     SyncConfig::new().cache_dir("/var/cache/symdex"),
//!     Arc::new(NoInstalledPackages),
//! )?;
//! service.start_sync("nuget.org", DirectorySource::new("/srv/mirror"))?;
//!
//! for entry in service.search("JsonConvert") {
//!     println!("{} from {}", entry.full_name(), entry.package);
//! }
//! service.dispose().await;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use engine::{ConfigError, RemoteSource, StartOutcome, SyncEngine, SyncRegistry};
use index::{QueryEngine, SourceIndexes};
use logging::trace_registry;
use thiserror::Error;
use tokio::runtime::{Handle, TryCurrentError};

#[cfg(feature = "http")]
pub use engine::HttpSource;
pub use engine::{CycleOutcome, DirectorySource, SyncConfig};
pub use index::{
    InstalledPackages, NoInstalledPackages, PackageMatch, RankedMatches, StaticInstalledPackages,
    SymbolEntry, SymbolIndex, SymbolOrigin,
};
pub use logging::{Verbosity, init_tracing};

/// Misuse of [`SymbolSearchService`].
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The service was created outside a tokio runtime.
    #[error("no tokio runtime available: {0}")]
    NoRuntime(#[from] TryCurrentError),
    /// The configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// A source id was empty.
    #[error("distribution source id must not be empty")]
    EmptySource,
    /// [`SymbolSearchService::dispose`] has already run.
    #[error("symbol search service has been disposed")]
    Disposed,
}

/// Background-synchronized symbol search.
#[derive(Debug)]
pub struct SymbolSearchService {
    config: SyncConfig,
    indexes: Arc<SourceIndexes>,
    queries: QueryEngine,
    registry: SyncRegistry,
}

impl SymbolSearchService {
    /// Creates a service spawning its loops on the current tokio runtime.
    pub fn new(
        config: SyncConfig,
        installed: Arc<dyn InstalledPackages>,
    ) -> Result<Self, ServiceError> {
        Self::with_runtime(config, installed, Handle::try_current()?)
    }

    /// Creates a service spawning its loops on `runtime`.
    pub fn with_runtime(
        config: SyncConfig,
        installed: Arc<dyn InstalledPackages>,
        runtime: Handle,
    ) -> Result<Self, ServiceError> {
        config.validate()?;
        let indexes = Arc::new(SourceIndexes::new());
        Ok(Self {
            config,
            queries: QueryEngine::new(Arc::clone(&indexes), installed),
            indexes,
            registry: SyncRegistry::new(runtime),
        })
    }

    /// Starts keeping `source` synchronized through `remote`.
    ///
    /// Starting a source that already has a running loop is a no-op and
    /// returns [`StartOutcome::AlreadyRunning`].
    pub fn start_sync<R>(
        &self,
        source: impl Into<String>,
        remote: R,
    ) -> Result<StartOutcome, ServiceError>
    where
        R: RemoteSource + 'static,
    {
        let source = source.into();
        if source.is_empty() {
            return Err(ServiceError::EmptySource);
        }
        let holder = self.indexes.holder(&source);
        let engine = SyncEngine::new(source, self.config.clone(), remote, holder);
        match self.registry.start(engine) {
            StartOutcome::ShutDown => Err(ServiceError::Disposed),
            outcome => Ok(outcome),
        }
    }

    /// Reports whether `source` has a running loop.
    #[must_use]
    pub fn is_syncing(&self, source: &str) -> bool {
        self.registry.is_running(source)
    }

    /// Stops the loop of `source`, waiting for it to end.
    pub async fn stop_sync(&self, source: &str) -> bool {
        self.registry.stop(source).await
    }

    /// Version of the index currently served for `source`, if any.
    #[must_use]
    pub fn index_version(&self, source: &str) -> Option<String> {
        self.indexes.version(source)
    }

    /// Symbols whose name matches `name`, ranked across every source.
    ///
    /// `name` may be qualified (`Newtonsoft.Json.JsonConvert`) to constrain
    /// the namespace.
    #[must_use]
    pub fn search(&self, name: &str) -> RankedMatches {
        self.queries.search(name)
    }

    /// Like [`search`](Self::search), restricted to generic arity `arity`.
    #[must_use]
    pub fn search_with_arity(&self, name: &str, arity: u8) -> RankedMatches {
        self.queries.search_with_arity(name, arity)
    }

    /// Symbols of `name` defined by reference assemblies, most popular first.
    #[must_use]
    pub fn search_reference_assemblies(&self, name: &str) -> Vec<SymbolEntry> {
        self.queries.search_reference_assemblies(name)
    }

    /// Packages shipping an assembly named `assembly`, ranked.
    #[must_use]
    pub fn search_by_assembly(&self, assembly: &str) -> Vec<PackageMatch> {
        self.queries.search_by_assembly(assembly)
    }

    /// Cancels every loop and waits for them to end. Later
    /// [`start_sync`](Self::start_sync) calls fail with
    /// [`ServiceError::Disposed`]; queries keep serving the last indexes.
    pub async fn dispose(&self) {
        if self.registry.is_shut_down() {
            return;
        }
        self.registry.shutdown().await;
        trace_registry!("symbol search service disposed");
    }
}
