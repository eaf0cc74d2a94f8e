use checksums::RollingChecksum;
use logging::trace_delta;

use crate::format::{self, PatchHeader};
use crate::index::BlockIndex;
use crate::script::{DeltaScript, DeltaToken};

/// Block length used when the caller has no better estimate.
pub const DEFAULT_BLOCK_LEN: u32 = 2048;

/// Produces block-copy scripts by sliding a rolling window over the target.
#[derive(Clone, Debug)]
pub struct PatchGenerator {
    block_len: u32,
}

impl PatchGenerator {
    /// Creates a generator with [`DEFAULT_BLOCK_LEN`].
    #[must_use]
    pub const fn new() -> Self {
        Self {
            block_len: DEFAULT_BLOCK_LEN,
        }
    }

    /// Overrides the block length. Zero is clamped to one.
    #[must_use]
    pub fn with_block_len(mut self, block_len: u32) -> Self {
        self.block_len = block_len.max(1);
        self
    }

    /// Returns the configured block length.
    #[must_use]
    pub const fn block_len(&self) -> u32 {
        self.block_len
    }

    /// Computes the token script turning `base` into `target`.
    #[must_use]
    pub fn script(&self, base: &[u8], target: &[u8]) -> DeltaScript {
        let block_len = self.block_len as usize;
        let index = BlockIndex::build(base, block_len);
        let mut script = DeltaScript::new();

        if target.len() < block_len || index.block_count() == 0 {
            script.push(DeltaToken::Literal(target.to_vec()));
            return script;
        }

        let mut literal_start = 0usize;
        let mut pos = 0usize;
        let mut rolling = RollingChecksum::of(&target[..block_len]);

        loop {
            let window = &target[pos..pos + block_len];
            if let Some(block) = index.find_match(rolling.value(), window) {
                script.push(DeltaToken::Literal(target[literal_start..pos].to_vec()));
                script.push(DeltaToken::Copy {
                    index: block,
                    len: self.block_len,
                });
                pos += block_len;
                literal_start = pos;
                if pos + block_len > target.len() {
                    break;
                }
                rolling = RollingChecksum::of(&target[pos..pos + block_len]);
                continue;
            }

            if pos + block_len >= target.len() {
                break;
            }
            rolling.roll(target[pos], target[pos + block_len]);
            pos += 1;
        }

        script.push(DeltaToken::Literal(target[literal_start..].to_vec()));
        script
    }

    /// Generates an encoded patch from `base` to `target`.
    #[must_use]
    pub fn generate(&self, base: &[u8], target: &[u8]) -> Vec<u8> {
        let script = self.script(base, target);
        trace_delta!(
            "generated patch: {} tokens, {} copied bytes, {} literal bytes",
            script.tokens().len(),
            script.copy_bytes(),
            script.literal_bytes()
        );
        let header = PatchHeader::describe(base, target, self.block_len);
        format::encode(&header, &script)
    }
}

impl Default for PatchGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper that generates a patch with the given block length.
#[must_use]
pub fn generate_patch(base: &[u8], target: &[u8], block_len: u32) -> Vec<u8> {
    PatchGenerator::new()
        .with_block_len(block_len)
        .generate(base, target)
}
