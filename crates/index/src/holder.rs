use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwapOption;
use logging::trace_query;

use crate::symbol_index::SymbolIndex;

/// Result of [`ActiveIndex::publish`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PublishOutcome {
    /// The candidate replaced the held index (or filled an empty holder).
    Installed {
        /// Version that was replaced, if any.
        previous: Option<String>,
    },
    /// The candidate had the same version as the held index and was dropped.
    Unchanged,
}

/// Holds at most one current [`SymbolIndex`].
///
/// Readers call [`current`](Self::current), which is a lock-free atomic load.
/// Publishers serialise on an internal mutex so the version comparison and
/// the swap happen as one step.
#[derive(Debug, Default)]
pub struct ActiveIndex {
    current: ArcSwapOption<SymbolIndex>,
    publish_lock: Mutex<()>,
}

impl ActiveIndex {
    /// Creates an empty holder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current index, if one has been published.
    #[must_use]
    pub fn current(&self) -> Option<Arc<SymbolIndex>> {
        self.current.load_full()
    }

    /// Returns the version of the current index.
    #[must_use]
    pub fn version(&self) -> Option<String> {
        self.current
            .load()
            .as_ref()
            .map(|index| index.version().to_owned())
    }

    /// Installs `candidate` unless the held index has the same version.
    pub fn publish(&self, candidate: impl Into<Arc<SymbolIndex>>) -> PublishOutcome {
        let candidate = candidate.into();
        let _guard = self
            .publish_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let previous = self.current.load_full();
        if let Some(held) = &previous {
            if held.version() == candidate.version() {
                return PublishOutcome::Unchanged;
            }
        }

        trace_query!(
            version = candidate.version(),
            entries = candidate.len(),
            "active index installed"
        );
        self.current.store(Some(candidate));
        PublishOutcome::Installed {
            previous: previous.map(|held| held.version().to_owned()),
        }
    }
}
