#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `delta` turns an old snapshot into a newer one without shipping the whole
//! newer snapshot. A patch is a short header pinning the base and target
//! snapshots followed by a stream of tokens that either copy a block of the
//! base or insert literal bytes.
//!
//! # Design
//!
//! - [`script`] models the token stream ([`DeltaToken`], [`DeltaScript`]).
//! - [`format`] encodes and decodes the patch container.
//! - [`apply_patch`] is the applicator: a pure function from `(old, patch)`
//!   to new bytes.
//! - [`generate_patch`] is the producer side, matching blocks of the base
//!   with a [`checksums::RollingChecksum`] window. Feeds and tests use it;
//!   the sync engine only applies.
//!
//! # Invariants
//!
//! - Applying is deterministic: the same `(old, patch)` pair always yields the
//!   same bytes or the same error.
//! - A patch never applies to a base other than the one it was generated
//!   from. Base length and SHA-256 are checked before any token is read.
//! - A successful apply always produced exactly the target length and
//!   SHA-256 recorded in the header. Anything else is an error, never silently
//!   wrong output.
//!
//! # Errors
//!
//! Every failure is a [`PatchError`]. All variants mean the patch cannot be
//! used with this base; callers fall back to a full snapshot download.
//!
//! # Examples
//!
//! ```
//! use delta::{DEFAULT_BLOCK_LEN, apply_patch, generate_patch};
//!
//! let old: Vec<u8> = (0..20_000u32).map(|i| (i % 251) as u8).collect();
//! let mut new = old.clone();
//! new[10_000..10_016].copy_from_slice(b"sixteen new byte");
//!
//! let patch = generate_patch(&old, &new, DEFAULT_BLOCK_LEN);
//! assert!(patch.len() < new.len() / 4);
//! assert_eq!(apply_patch(&old, &patch).unwrap(), new);
//! ```

mod apply;
mod error;
pub mod format;
mod generator;
mod index;
pub mod script;

pub use apply::apply_patch;
pub use error::PatchError;
pub use format::{PatchHeader, inspect_patch};
pub use generator::{DEFAULT_BLOCK_LEN, PatchGenerator, generate_patch};
pub use index::BlockIndex;
pub use script::{DeltaScript, DeltaToken};
