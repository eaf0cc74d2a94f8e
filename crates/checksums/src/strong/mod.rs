//! Whole-payload content checksums.
//!
//! Remote responses declare a SHA-256 of the bytes they carry; delta patches
//! pin the snapshots they apply to with the same digest. This module owns the
//! digest type, its textual forms, and the verification step.

mod sha256;

pub use sha256::{ChecksumParseError, ContentChecksum, IntegrityError, verify};
