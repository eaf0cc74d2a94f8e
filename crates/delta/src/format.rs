//! crates/delta/src/format.rs
//!
//! Patch container layout. All integers are little-endian.
//!
//! ```text
//! magic        4   "SYDP"
//! format       1   FORMAT_VERSION
//! block_len    4   u32, non-zero
//! base_len     8   u64
//! base_sha    32   SHA-256 of the base snapshot
//! target_len   8   u64
//! target_sha  32   SHA-256 of the target snapshot
//! tokens...        OP_COPY index:u64 len:u32 | OP_LITERAL len:u32 bytes
//! end          1   OP_END
//! ```

use checksums::ContentChecksum;

use crate::error::PatchError;
use crate::script::{DeltaScript, DeltaToken};

/// Leading bytes of every patch.
pub const MAGIC: [u8; 4] = *b"SYDP";
/// Container revision written by this crate.
pub const FORMAT_VERSION: u8 = 1;
/// Size of the fixed header in bytes.
pub const HEADER_LEN: usize = 4 + 1 + 4 + 8 + ContentChecksum::LEN + 8 + ContentChecksum::LEN;

const OP_END: u8 = 0x00;
const OP_COPY: u8 = 0x01;
const OP_LITERAL: u8 = 0x02;

/// Fixed header of a patch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PatchHeader {
    /// Block length the copy indices are expressed in.
    pub block_len: u32,
    /// Length of the base snapshot.
    pub base_len: u64,
    /// Checksum of the base snapshot.
    pub base_checksum: ContentChecksum,
    /// Length of the rebuilt snapshot.
    pub target_len: u64,
    /// Checksum of the rebuilt snapshot.
    pub target_checksum: ContentChecksum,
}

impl PatchHeader {
    /// Describes a patch from `base` to `target`.
    #[must_use]
    pub fn describe(base: &[u8], target: &[u8], block_len: u32) -> Self {
        Self {
            block_len,
            base_len: base.len() as u64,
            base_checksum: ContentChecksum::compute(base),
            target_len: target.len() as u64,
            target_checksum: ContentChecksum::compute(target),
        }
    }
}

/// Token borrowed from an encoded patch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TokenRef<'a> {
    Copy { index: u64, len: u32 },
    Literal(&'a [u8]),
}

/// Serialises `header` and `script` into a patch.
#[must_use]
pub fn encode(header: &PatchHeader, script: &DeltaScript) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_LEN + 1 + script.literal_bytes() as usize);
    out.extend_from_slice(&MAGIC);
    out.push(FORMAT_VERSION);
    out.extend_from_slice(&header.block_len.to_le_bytes());
    out.extend_from_slice(&header.base_len.to_le_bytes());
    out.extend_from_slice(header.base_checksum.as_bytes());
    out.extend_from_slice(&header.target_len.to_le_bytes());
    out.extend_from_slice(header.target_checksum.as_bytes());

    for token in script.tokens() {
        match token {
            DeltaToken::Copy { index, len } => {
                out.push(OP_COPY);
                out.extend_from_slice(&index.to_le_bytes());
                out.extend_from_slice(&len.to_le_bytes());
            }
            DeltaToken::Literal(bytes) => {
                for chunk in bytes.chunks(u32::MAX as usize) {
                    out.push(OP_LITERAL);
                    out.extend_from_slice(&(chunk.len() as u32).to_le_bytes());
                    out.extend_from_slice(chunk);
                }
            }
        }
    }
    out.push(OP_END);
    out
}

/// Decodes only the header of `patch`.
pub fn inspect_patch(patch: &[u8]) -> Result<PatchHeader, PatchError> {
    PatchReader::new(patch).map(|reader| reader.header)
}

/// Decodes a whole patch into an owned script.
pub fn decode(patch: &[u8]) -> Result<(PatchHeader, DeltaScript), PatchError> {
    let mut reader = PatchReader::new(patch)?;
    let mut script = DeltaScript::new();
    while let Some(token) = reader.next_token()? {
        script.push(match token {
            TokenRef::Copy { index, len } => DeltaToken::Copy { index, len },
            TokenRef::Literal(bytes) => DeltaToken::Literal(bytes.to_vec()),
        });
    }
    Ok((reader.header, script))
}

/// Streaming reader over an encoded patch.
pub(crate) struct PatchReader<'a> {
    input: &'a [u8],
    pos: usize,
    finished: bool,
    pub(crate) header: PatchHeader,
}

impl<'a> PatchReader<'a> {
    pub(crate) fn new(input: &'a [u8]) -> Result<Self, PatchError> {
        let mut reader = Self {
            input,
            pos: 0,
            finished: false,
            header: PatchHeader {
                block_len: 0,
                base_len: 0,
                base_checksum: ContentChecksum::from_bytes([0; ContentChecksum::LEN]),
                target_len: 0,
                target_checksum: ContentChecksum::from_bytes([0; ContentChecksum::LEN]),
            },
        };

        if reader.take(MAGIC.len())? != MAGIC {
            return Err(PatchError::BadMagic);
        }
        let format = reader.u8()?;
        if format != FORMAT_VERSION {
            return Err(PatchError::UnsupportedFormat { format });
        }
        let block_len = reader.u32()?;
        if block_len == 0 {
            return Err(PatchError::ZeroBlockLength);
        }
        reader.header = PatchHeader {
            block_len,
            base_len: reader.u64()?,
            base_checksum: reader.checksum()?,
            target_len: reader.u64()?,
            target_checksum: reader.checksum()?,
        };
        Ok(reader)
    }

    /// Returns the next token, `None` after the end marker.
    pub(crate) fn next_token(&mut self) -> Result<Option<TokenRef<'a>>, PatchError> {
        if self.finished {
            return Ok(None);
        }
        let offset = self.pos;
        match self.u8()? {
            OP_END => {
                self.finished = true;
                let count = self.input.len() - self.pos;
                if count == 0 {
                    Ok(None)
                } else {
                    Err(PatchError::TrailingBytes { count })
                }
            }
            OP_COPY => {
                let index = self.u64()?;
                let len = self.u32()?;
                Ok(Some(TokenRef::Copy { index, len }))
            }
            OP_LITERAL => {
                let len = self.u32()? as usize;
                Ok(Some(TokenRef::Literal(self.take(len)?)))
            }
            opcode => Err(PatchError::UnknownOpcode { opcode, offset }),
        }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], PatchError> {
        let remaining = self.input.len() - self.pos;
        if remaining < len {
            return Err(PatchError::Truncated {
                offset: self.pos,
                needed: len - remaining,
            });
        }
        let slice = &self.input[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], PatchError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8, PatchError> {
        Ok(self.array::<1>()?[0])
    }

    fn u32(&mut self) -> Result<u32, PatchError> {
        self.array().map(u32::from_le_bytes)
    }

    fn u64(&mut self) -> Result<u64, PatchError> {
        self.array().map(u64::from_le_bytes)
    }

    fn checksum(&mut self) -> Result<ContentChecksum, PatchError> {
        self.array().map(ContentChecksum::from_bytes)
    }
}
