//! crates/index/src/codec.rs
//!
//! Snapshot binary format. All integers are little-endian; strings are a
//! `u32` byte length followed by UTF-8.
//!
//! ```text
//! magic     4   "SYMX"
//! format    1   FORMAT_VERSION
//! version   str
//! count     u32
//! entry*    name:str ns_count:u16 ns:str* package:str
//!           package_version:opt assembly:opt rank:u8 arity:u8 origin:u8
//! ```
//!
//! `opt` is a `u8` presence flag (0 or 1) followed by a `str` when present.

use thiserror::Error;

use crate::entry::{SymbolEntry, SymbolOrigin};
use crate::symbol_index::SymbolIndex;

/// Leading bytes of every snapshot.
pub const MAGIC: [u8; 4] = *b"SYMX";
/// Snapshot format revision written by [`encode`].
pub const FORMAT_VERSION: u8 = 1;

/// Smallest possible encoded entry: empty name, no namespace, empty package,
/// both optionals absent, rank, arity, origin.
const MIN_ENTRY_LEN: usize = 4 + 2 + 4 + 1 + 1 + 3;

/// Reasons snapshot bytes cannot be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The input does not start with the snapshot magic.
    #[error("not a symbol snapshot: bad magic")]
    BadMagic,
    /// The format revision is not understood.
    #[error("unsupported snapshot format {format}")]
    UnsupportedFormat {
        /// Format byte found.
        format: u8,
    },
    /// The input ended in the middle of a field.
    #[error("snapshot truncated at offset {offset}: needed {needed} more bytes")]
    Truncated {
        /// Offset where reading stopped.
        offset: usize,
        /// Bytes still required.
        needed: usize,
    },
    /// The declared entry count cannot fit in the remaining input.
    #[error("snapshot declares {count} entries but only {remaining} bytes remain")]
    ImplausibleCount {
        /// Declared entry count.
        count: u32,
        /// Remaining input length.
        remaining: usize,
    },
    /// A string field is not UTF-8.
    #[error("invalid UTF-8 in string at offset {offset}")]
    InvalidUtf8 {
        /// Offset of the string payload.
        offset: usize,
    },
    /// A presence flag or origin byte has an unknown value.
    #[error("invalid {field} byte {value} at offset {offset}")]
    InvalidTag {
        /// Field name.
        field: &'static str,
        /// Byte found.
        value: u8,
        /// Offset of the byte.
        offset: usize,
    },
    /// The snapshot has an empty version.
    #[error("snapshot version is empty")]
    EmptyVersion,
    /// Bytes follow the last entry.
    #[error("{count} trailing bytes after last entry")]
    TrailingBytes {
        /// Number of unexpected bytes.
        count: usize,
    },
}

/// Decodes snapshot bytes into a queryable index.
pub fn decode(bytes: &[u8]) -> Result<SymbolIndex, DecodeError> {
    let mut reader = Reader { input: bytes, pos: 0 };

    if reader.take(MAGIC.len())? != MAGIC {
        return Err(DecodeError::BadMagic);
    }
    let format = reader.u8()?;
    if format != FORMAT_VERSION {
        return Err(DecodeError::UnsupportedFormat { format });
    }
    let version = reader.string()?;
    if version.is_empty() {
        return Err(DecodeError::EmptyVersion);
    }

    let count = reader.u32()?;
    let remaining = reader.remaining();
    if (count as usize).saturating_mul(MIN_ENTRY_LEN) > remaining {
        return Err(DecodeError::ImplausibleCount { count, remaining });
    }

    let mut entries = Vec::with_capacity(count as usize);
    for _ in 0..count {
        entries.push(reader.entry()?);
    }

    if reader.remaining() != 0 {
        return Err(DecodeError::TrailingBytes {
            count: reader.remaining(),
        });
    }
    Ok(SymbolIndex::new(version, entries))
}

/// Encodes an index into snapshot bytes.
#[must_use]
pub fn encode(index: &SymbolIndex) -> Vec<u8> {
    let mut out = Vec::with_capacity(64 + index.len() * 48);
    out.extend_from_slice(&MAGIC);
    out.push(FORMAT_VERSION);
    put_str(&mut out, index.version());
    out.extend_from_slice(&(index.len() as u32).to_le_bytes());
    for entry in index.entries() {
        put_str(&mut out, &entry.name);
        out.extend_from_slice(&(entry.namespace.len() as u16).to_le_bytes());
        for segment in &entry.namespace {
            put_str(&mut out, segment);
        }
        put_str(&mut out, &entry.package);
        put_opt(&mut out, entry.package_version.as_deref());
        put_opt(&mut out, entry.assembly.as_deref());
        out.push(entry.rank);
        out.push(entry.arity);
        out.push(match entry.origin {
            SymbolOrigin::Package => 0,
            SymbolOrigin::ReferenceAssembly => 1,
        });
    }
    out
}

fn put_str(out: &mut Vec<u8>, value: &str) {
    out.extend_from_slice(&(value.len() as u32).to_le_bytes());
    out.extend_from_slice(value.as_bytes());
}

fn put_opt(out: &mut Vec<u8>, value: Option<&str>) {
    match value {
        Some(value) => {
            out.push(1);
            put_str(out, value);
        }
        None => out.push(0),
    }
}

struct Reader<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn remaining(&self) -> usize {
        self.input.len() - self.pos
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        let remaining = self.remaining();
        if remaining < len {
            return Err(DecodeError::Truncated {
                offset: self.pos,
                needed: len - remaining,
            });
        }
        let slice = &self.input[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, DecodeError> {
        let bytes = self.take(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    fn u32(&mut self) -> Result<u32, DecodeError> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn string(&mut self) -> Result<String, DecodeError> {
        let len = self.u32()? as usize;
        let offset = self.pos;
        let bytes = self.take(len)?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| DecodeError::InvalidUtf8 { offset })
    }

    fn opt_string(&mut self) -> Result<Option<String>, DecodeError> {
        let offset = self.pos;
        match self.u8()? {
            0 => Ok(None),
            1 => self.string().map(Some),
            value => Err(DecodeError::InvalidTag {
                field: "presence",
                value,
                offset,
            }),
        }
    }

    fn entry(&mut self) -> Result<SymbolEntry, DecodeError> {
        let name = self.string()?;
        let segments = self.u16()?;
        let mut namespace = Vec::with_capacity(usize::from(segments).min(self.remaining() / 4));
        for _ in 0..segments {
            namespace.push(self.string()?);
        }
        let package = self.string()?;
        let package_version = self.opt_string()?;
        let assembly = self.opt_string()?;
        let rank = self.u8()?;
        let arity = self.u8()?;
        let origin_offset = self.pos;
        let origin = match self.u8()? {
            0 => SymbolOrigin::Package,
            1 => SymbolOrigin::ReferenceAssembly,
            value => {
                return Err(DecodeError::InvalidTag {
                    field: "origin",
                    value,
                    offset: origin_offset,
                });
            }
        };
        Ok(SymbolEntry {
            name,
            namespace,
            package,
            package_version,
            assembly,
            rank,
            arity,
            origin,
        })
    }
}
