//! crates/index/src/sources.rs
//!
//! One [`ActiveIndex`] per distribution source.

use std::sync::Arc;

use dashmap::DashMap;

use crate::holder::ActiveIndex;
use crate::symbol_index::SymbolIndex;

/// A set of published indexes the [`QueryEngine`](crate::QueryEngine) ranks
/// over.
pub trait IndexView: Send + Sync {
    /// Currently published indexes, in a stable order.
    fn snapshots(&self) -> Vec<Arc<SymbolIndex>>;
}

impl IndexView for ActiveIndex {
    fn snapshots(&self) -> Vec<Arc<SymbolIndex>> {
        self.current().into_iter().collect()
    }
}

/// Holders keyed by source id.
///
/// Each source publishes into its own holder, so a snapshot from one source
/// never replaces another source's index.
#[derive(Debug, Default)]
pub struct SourceIndexes {
    holders: DashMap<String, Arc<ActiveIndex>>,
}

impl SourceIndexes {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the holder of `source`, creating an empty one on first use.
    pub fn holder(&self, source: &str) -> Arc<ActiveIndex> {
        if let Some(held) = self.holders.get(source) {
            return Arc::clone(held.value());
        }
        Arc::clone(
            self.holders
                .entry(source.to_owned())
                .or_default()
                .value(),
        )
    }

    /// Version currently published for `source`.
    #[must_use]
    pub fn version(&self, source: &str) -> Option<String> {
        self.holders.get(source).and_then(|held| held.version())
    }

    /// Source ids with a holder, sorted.
    #[must_use]
    pub fn sources(&self) -> Vec<String> {
        let mut sources: Vec<String> = self
            .holders
            .iter()
            .map(|held| held.key().clone())
            .collect();
        sources.sort_unstable();
        sources
    }
}

impl IndexView for SourceIndexes {
    fn snapshots(&self) -> Vec<Arc<SymbolIndex>> {
        let mut current: Vec<(String, Arc<SymbolIndex>)> = self
            .holders
            .iter()
            .filter_map(|held| held.value().current().map(|index| (held.key().clone(), index)))
            .collect();
        current.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        current.into_iter().map(|(_, index)| index).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::SymbolEntry;

    fn index(version: &str) -> SymbolIndex {
        SymbolIndex::new(version, vec![SymbolEntry::new("T", "N", "p", 1)])
    }

    #[test]
    fn holders_are_per_source() {
        let indexes = SourceIndexes::new();
        indexes.holder("b").publish(index("b1"));
        indexes.holder("a").publish(index("a1"));

        assert_eq!(indexes.version("a").as_deref(), Some("a1"));
        assert_eq!(indexes.version("b").as_deref(), Some("b1"));
        assert!(indexes.version("c").is_none());
        let versions: Vec<_> = indexes
            .snapshots()
            .iter()
            .map(|index| index.version().to_owned())
            .collect();
        assert_eq!(versions, ["a1", "b1"]);
    }

    #[test]
    fn same_source_shares_one_holder() {
        let indexes = SourceIndexes::new();
        let first = indexes.holder("feed");
        let second = indexes.holder("feed");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(indexes.sources(), ["feed"]);
    }

    #[test]
    fn empty_holders_are_not_snapshots() {
        let indexes = SourceIndexes::new();
        let _ = indexes.holder("feed");
        assert!(indexes.snapshots().is_empty());
        assert!(ActiveIndex::new().snapshots().is_empty());
    }
}
