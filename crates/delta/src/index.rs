use checksums::RollingChecksum;
use rustc_hash::FxHashMap;

/// Lookup table from rolling checksum to the base blocks carrying it.
///
/// Only full blocks are indexed; a short trailing block of the base is never
/// referenced by copy tokens.
#[derive(Clone, Debug)]
pub struct BlockIndex<'a> {
    base: &'a [u8],
    block_len: usize,
    blocks: FxHashMap<u32, Vec<u64>>,
}

impl<'a> BlockIndex<'a> {
    /// Indexes every full `block_len` sized block of `base`.
    #[must_use]
    pub fn build(base: &'a [u8], block_len: usize) -> Self {
        let block_len = block_len.max(1);
        let count = base.len() / block_len;
        let mut blocks: FxHashMap<u32, Vec<u64>> =
            FxHashMap::with_capacity_and_hasher(count, Default::default());
        for (index, block) in base.chunks_exact(block_len).enumerate() {
            blocks
                .entry(RollingChecksum::of(block).value())
                .or_default()
                .push(index as u64);
        }
        Self {
            base,
            block_len,
            blocks,
        }
    }

    /// Returns the block length the index was built with.
    #[must_use]
    pub const fn block_len(&self) -> usize {
        self.block_len
    }

    /// Returns the number of indexed blocks.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.base.len() / self.block_len
    }

    /// Finds a base block equal to `window` whose rolling checksum is `weak`.
    ///
    /// Candidates are confirmed byte for byte, so weak collisions never yield
    /// a wrong match.
    #[must_use]
    pub fn find_match(&self, weak: u32, window: &[u8]) -> Option<u64> {
        if window.len() != self.block_len {
            return None;
        }
        self.blocks.get(&weak)?.iter().copied().find(|&index| {
            let start = index as usize * self.block_len;
            &self.base[start..start + self.block_len] == window
        })
    }
}
