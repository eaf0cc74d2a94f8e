use checksums::IntegrityError;
use thiserror::Error;

/// Reasons a patch cannot be decoded or applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatchError {
    /// The input does not start with the patch magic.
    #[error("not a patch: bad magic")]
    BadMagic,
    /// The container format revision is not understood.
    #[error("unsupported patch format {format}")]
    UnsupportedFormat {
        /// Format byte found in the header.
        format: u8,
    },
    /// The header declares a zero block length.
    #[error("patch declares a zero block length")]
    ZeroBlockLength,
    /// The input ended in the middle of a field.
    #[error("patch truncated at offset {offset}: needed {needed} more bytes")]
    Truncated {
        /// Byte offset where reading stopped.
        offset: usize,
        /// Bytes still required to finish the field.
        needed: usize,
    },
    /// A token started with an unknown opcode.
    #[error("unknown patch opcode {opcode:#04x} at offset {offset}")]
    UnknownOpcode {
        /// Opcode byte.
        opcode: u8,
        /// Offset of the opcode.
        offset: usize,
    },
    /// Bytes follow the end marker.
    #[error("{count} trailing bytes after end of patch")]
    TrailingBytes {
        /// Number of unexpected bytes.
        count: usize,
    },
    /// The patch was generated against a different base snapshot.
    #[error("patch base mismatch: expects {expected_len} byte base, local snapshot is {actual_len} bytes")]
    IncompatibleBase {
        /// Base length recorded in the patch.
        expected_len: u64,
        /// Length of the snapshot the patch was applied to.
        actual_len: u64,
    },
    /// Base lengths agree but contents differ.
    #[error("patch base checksum mismatch")]
    BaseChecksum(#[source] IntegrityError),
    /// A copy token references bytes outside the base.
    #[error("copy of block {index} ({len} bytes) exceeds {base_len} byte base")]
    CopyOutOfBounds {
        /// Block index.
        index: u64,
        /// Requested length.
        len: u32,
        /// Length of the base.
        base_len: u64,
    },
    /// Output length does not match the header.
    #[error("patch produced {actual} bytes, header declares {expected}")]
    TargetLength {
        /// Length declared in the header.
        expected: u64,
        /// Length produced, or at least produced before stopping.
        actual: u64,
    },
    /// Output contents do not match the header checksum.
    #[error("patched snapshot checksum mismatch")]
    TargetChecksum(#[source] IntegrityError),
}
