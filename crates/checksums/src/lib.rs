//! crates/checksums/src/lib.rs
//!
//! Checksum primitives shared by the snapshot pipeline.
//!
//! # Overview
//!
//! Two families of checksum live here:
//!
//! - [`ContentChecksum`]: a SHA-256 digest of a whole payload. Remote
//!   responses carry it base64 encoded and [`verify`] compares it against the
//!   bytes actually received. The delta format embeds it to pin the base and
//!   target snapshots of a patch.
//! - [`RollingChecksum`]: the Adler-32 style weak checksum used by the patch
//!   generator to locate candidate blocks in O(1) per byte.
//!
//! # Errors
//!
//! [`verify`] reports [`IntegrityError::Mismatch`] when a declared checksum
//! does not match the computed one. Parsing a textual checksum reports
//! [`ChecksumParseError`].
//!
//! # Examples
//!
//! ```
//! use checksums::{ContentChecksum, verify};
//!
//! let payload = b"snapshot bytes";
//! let declared = ContentChecksum::compute(payload);
//! let parsed = ContentChecksum::from_base64(&declared.to_base64()).unwrap();
//! assert!(verify(payload, Some(&parsed)).is_ok());
//! assert!(verify(b"tampered", Some(&parsed)).is_err());
//! assert!(verify(b"anything", None).is_ok());
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

mod rolling;
pub mod strong;

pub use rolling::RollingChecksum;
pub use strong::{ChecksumParseError, ContentChecksum, IntegrityError, verify};
