//! crates/index/src/query.rs
//!
//! Ranked lookups over the active index.
//!
//! Matches whose package is already installed elsewhere are always yielded
//! first. The remaining matches are visited by descending rank and yielded
//! while their [`popularity_tier`] stays within one tier of the best
//! remaining match; the first match past that gap ends the sequence.

use std::cmp::Reverse;
use std::sync::Arc;
use std::vec;

use logging::trace_query;
use rustc_hash::FxHashMap;

use crate::entry::{SymbolEntry, SymbolOrigin};
use crate::installed::InstalledPackages;
use crate::sources::IndexView;
use crate::symbol_index::SymbolIndex;

/// Largest tier gap to the best remaining match that is still yielded.
const MAX_TIER_GAP: u8 = 1;

/// Power-of-two popularity bucket of `rank`: its bit length.
///
/// ```
/// use index::popularity_tier;
///
/// assert_eq!(popularity_tier(0), 0);
/// assert_eq!(popularity_tier(1), 1);
/// assert_eq!(popularity_tier(3), 2);
/// assert_eq!(popularity_tier(5), 3);
/// assert_eq!(popularity_tier(255), 8);
/// ```
#[must_use]
pub const fn popularity_tier(rank: u8) -> u8 {
    (u8::BITS - rank.leading_zeros()) as u8
}

/// A package that ships a requested assembly.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackageMatch {
    /// Package identifier.
    pub package: String,
    /// Indexed package version, when known.
    pub package_version: Option<String>,
    /// Highest rank among the package's entries for the assembly.
    pub rank: u8,
}

/// Answers symbol lookups against whatever indexes are currently published.
///
/// Matches from every index in the view are ranked together, so several
/// distribution sources can be searched at once.
#[derive(Clone)]
pub struct QueryEngine {
    indexes: Arc<dyn IndexView>,
    installed: Arc<dyn InstalledPackages>,
}

impl std::fmt::Debug for QueryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let versions: Vec<String> = self
            .indexes
            .snapshots()
            .iter()
            .map(|index| index.version().to_owned())
            .collect();
        f.debug_struct("QueryEngine")
            .field("versions", &versions)
            .finish_non_exhaustive()
    }
}

impl QueryEngine {
    /// Creates an engine reading `indexes` and ranking with `installed`.
    ///
    /// `indexes` is a single [`ActiveIndex`](crate::ActiveIndex) or a
    /// [`SourceIndexes`](crate::SourceIndexes) set.
    #[must_use]
    pub fn new<V>(indexes: Arc<V>, installed: Arc<dyn InstalledPackages>) -> Self
    where
        V: IndexView + 'static,
    {
        Self { indexes, installed }
    }

    /// Finds entries for a simple or partially qualified type name.
    ///
    /// Returns an empty sequence when no index has been published yet.
    #[must_use]
    pub fn search(&self, name: &str) -> RankedMatches {
        self.ranked(name, |_| true)
    }

    /// Like [`search`](Self::search), restricted to types of generic `arity`.
    #[must_use]
    pub fn search_with_arity(&self, name: &str, arity: u8) -> RankedMatches {
        self.ranked(name, |entry| entry.arity == arity)
    }

    /// Finds reference-assembly entries for `name`, in descending rank order
    /// without the popularity cutoff.
    #[must_use]
    pub fn search_reference_assemblies(&self, name: &str) -> Vec<SymbolEntry> {
        let indexes = self.indexes.snapshots();
        let mut hits: Vec<&SymbolEntry> = indexes
            .iter()
            .flat_map(|index| index.lookup(name))
            .filter(|entry| entry.origin == SymbolOrigin::ReferenceAssembly)
            .collect();
        hits.sort_by(|a, b| entry_order(a, b));
        trace_query!(query = name, hits = hits.len(), "reference assembly lookup");
        hits.into_iter().cloned().collect()
    }

    /// Finds packages that ship `assembly`, one match per package.
    pub fn search_by_assembly(&self, assembly: &str) -> Vec<PackageMatch> {
        let indexes = self.indexes.snapshots();

        let mut best: FxHashMap<&str, PackageMatch> = FxHashMap::default();
        for entry in indexes.iter().flat_map(|index| index.lookup_assembly(assembly)) {
            if entry.origin != SymbolOrigin::Package {
                continue;
            }
            best.entry(entry.package.as_str())
                .and_modify(|held| {
                    if entry.rank > held.rank {
                        held.rank = entry.rank;
                        held.package_version.clone_from(&entry.package_version);
                    }
                })
                .or_insert_with(|| PackageMatch {
                    package: entry.package.clone(),
                    package_version: entry.package_version.clone(),
                    rank: entry.rank,
                });
        }

        let (mut installed, mut rest): (Vec<_>, Vec<_>) = best
            .into_values()
            .partition(|hit| self.installed.is_installed(&hit.package));
        let by_rank = |a: &PackageMatch, b: &PackageMatch| {
            Reverse(a.rank)
                .cmp(&Reverse(b.rank))
                .then_with(|| a.package.cmp(&b.package))
        };
        installed.sort_by(by_rank);
        rest.sort_by(by_rank);

        let cutoff = within_tier_gap(rest.iter().map(|hit| hit.rank));
        rest.truncate(cutoff);
        installed.extend(rest);
        trace_query!(assembly, hits = installed.len(), "assembly lookup");
        installed
    }

    fn ranked(&self, name: &str, keep: impl Fn(&SymbolEntry) -> bool) -> RankedMatches {
        let indexes = self.indexes.snapshots();
        if indexes.is_empty() {
            trace_query!(query = name, "no active index");
            return RankedMatches::empty();
        }

        let (mut installed, mut rest) = {
            let mut installed_by_package: FxHashMap<&str, bool> = FxHashMap::default();
            let mut installed = Vec::new();
            let mut rest = Vec::new();
            for (index_no, index) in indexes.iter().enumerate() {
                for slot in index.lookup_slots(name) {
                    let entry = index.entry(slot);
                    if !keep(entry) {
                        continue;
                    }
                    let package = entry.package.as_str();
                    let is_installed = *installed_by_package
                        .entry(package)
                        .or_insert_with(|| self.installed.is_installed(package));
                    let hit = Hit { index: index_no, slot };
                    if is_installed {
                        installed.push(hit);
                    } else {
                        rest.push(hit);
                    }
                }
            }
            (installed, rest)
        };
        let entry = |hit: Hit| indexes[hit.index].entry(hit.slot);
        installed.sort_by(|&a, &b| entry_order(entry(a), entry(b)));
        rest.sort_by(|&a, &b| entry_order(entry(a), entry(b)));
        let best_tier = rest.first().map(|&hit| popularity_tier(entry(hit).rank));

        trace_query!(
            query = name,
            installed = installed.len(),
            candidates = rest.len(),
            indexes = indexes.len(),
            "symbol lookup"
        );
        RankedMatches {
            best_tier,
            installed: installed.into_iter(),
            rest: rest.into_iter(),
            indexes,
        }
    }
}

/// Descending rank, then package, then namespace.
fn entry_order(a: &SymbolEntry, b: &SymbolEntry) -> std::cmp::Ordering {
    Reverse(a.rank)
        .cmp(&Reverse(b.rank))
        .then_with(|| a.package.cmp(&b.package))
        .then_with(|| a.namespace.cmp(&b.namespace))
}

/// Number of leading ranks (already sorted descending) inside the tier gap.
fn within_tier_gap(ranks: impl Iterator<Item = u8>) -> usize {
    let mut ranks = ranks.peekable();
    let Some(&first) = ranks.peek() else {
        return 0;
    };
    let best = popularity_tier(first);
    ranks
        .take_while(|&rank| best - popularity_tier(rank) <= MAX_TIER_GAP)
        .count()
}

/// Entry `slot` of the `index`-th snapshot a match set was computed from.
#[derive(Clone, Copy, Debug)]
struct Hit {
    index: usize,
    slot: u32,
}

/// Lazy ranked result sequence returned by [`QueryEngine::search`].
///
/// Holds its own references to the indexes it was computed from, so it stays
/// valid when a newer index is published mid-iteration.
#[derive(Debug)]
pub struct RankedMatches {
    indexes: Vec<Arc<SymbolIndex>>,
    installed: vec::IntoIter<Hit>,
    rest: vec::IntoIter<Hit>,
    best_tier: Option<u8>,
}

impl RankedMatches {
    fn empty() -> Self {
        Self {
            indexes: Vec::new(),
            installed: Vec::new().into_iter(),
            rest: Vec::new().into_iter(),
            best_tier: None,
        }
    }

    /// Versions of the indexes the matches come from.
    #[must_use]
    pub fn index_versions(&self) -> Vec<&str> {
        self.indexes.iter().map(|index| index.version()).collect()
    }

    fn entry(&self, hit: Hit) -> &SymbolEntry {
        self.indexes[hit.index].entry(hit.slot)
    }
}

impl Iterator for RankedMatches {
    type Item = SymbolEntry;

    fn next(&mut self) -> Option<SymbolEntry> {
        if let Some(hit) = self.installed.next() {
            return Some(self.entry(hit).clone());
        }

        let best = self.best_tier?;
        let hit = self.rest.next()?;
        let entry = self.entry(hit);
        if best - popularity_tier(entry.rank) > MAX_TIER_GAP {
            self.best_tier = None;
            return None;
        }
        Some(entry.clone())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let upper = self.installed.len()
            + if self.best_tier.is_some() {
                self.rest.len()
            } else {
                0
            };
        (self.installed.len(), Some(upper))
    }
}

impl std::iter::FusedIterator for RankedMatches {}
