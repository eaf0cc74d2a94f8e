use rustc_hash::FxHashMap;

use crate::entry::SymbolEntry;

/// Decoded, immutable, queryable catalog snapshot.
#[derive(Clone, Debug)]
pub struct SymbolIndex {
    version: String,
    entries: Vec<SymbolEntry>,
    by_name: FxHashMap<String, Vec<u32>>,
    by_assembly: FxHashMap<String, Vec<u32>>,
}

impl SymbolIndex {
    /// Builds an index over `entries`.
    #[must_use]
    pub fn new(version: impl Into<String>, entries: Vec<SymbolEntry>) -> Self {
        let mut by_name: FxHashMap<String, Vec<u32>> =
            FxHashMap::with_capacity_and_hasher(entries.len(), Default::default());
        let mut by_assembly: FxHashMap<String, Vec<u32>> = FxHashMap::default();
        for (slot, entry) in entries.iter().enumerate() {
            let slot = slot as u32;
            by_name.entry(entry.name.clone()).or_default().push(slot);
            if let Some(assembly) = &entry.assembly {
                by_assembly.entry(assembly.clone()).or_default().push(slot);
            }
        }
        Self {
            version: version.into(),
            entries,
            by_name,
            by_assembly,
        }
    }

    /// Returns the source-defined version of this snapshot.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Returns every entry in snapshot order.
    #[must_use]
    pub fn entries(&self) -> &[SymbolEntry] {
        &self.entries
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when the snapshot has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Finds entries matching a possibly qualified name.
    ///
    /// The last dotted segment must equal the short name; any preceding
    /// segments must form a suffix of the entry's namespace. `Generic.List`
    /// therefore matches `System.Collections.Generic.List` but not
    /// `Other.List`. Matching is case-sensitive.
    pub fn lookup<'a>(&'a self, query: &str) -> impl Iterator<Item = &'a SymbolEntry> {
        self.lookup_slots(query)
            .map(|slot| &self.entries[slot as usize])
    }

    /// Positions in [`entries`](Self::entries) that [`lookup`](Self::lookup)
    /// would return.
    pub(crate) fn lookup_slots(&self, query: &str) -> impl Iterator<Item = u32> {
        let mut segments: Vec<&str> = query.split('.').filter(|s| !s.is_empty()).collect();
        let name = segments.pop().unwrap_or_default();
        self.by_name
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .copied()
            .filter(move |&slot| self.entries[slot as usize].namespace_ends_with(&segments))
    }

    /// Returns the entry at `slot`.
    pub(crate) fn entry(&self, slot: u32) -> &SymbolEntry {
        &self.entries[slot as usize]
    }

    /// Finds entries whose defining assembly is `assembly`.
    pub fn lookup_assembly<'a>(&'a self, assembly: &str) -> impl Iterator<Item = &'a SymbolEntry> {
        self.by_assembly
            .get(assembly)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .map(|&slot| &self.entries[slot as usize])
    }
}
