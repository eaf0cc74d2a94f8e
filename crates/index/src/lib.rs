#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `index` is the read side of the symbol catalog. It decodes snapshot
//! bytes into a [`SymbolIndex`], keeps the currently adopted index in an
//! [`ActiveIndex`] holder, and answers "which packages define symbol X"
//! through the [`QueryEngine`].
//!
//! # Design
//!
//! - [`codec`] is a length-prefixed little-endian format. Decoding validates
//!   every length against the remaining input, so corrupt snapshots fail
//!   with a [`DecodeError`] instead of allocating or panicking.
//! - [`ActiveIndex`] stores an `Arc<SymbolIndex>` in an `arc-swap` cell.
//!   Readers load it without locking. Publishers serialise on a mutex and
//!   only replace the index when the candidate's version differs.
//! - [`SourceIndexes`] keeps one holder per distribution source, so sources
//!   never overwrite each other's index.
//! - [`QueryEngine`] reads an [`IndexView`] (one holder or a whole
//!   [`SourceIndexes`] set) and the [`InstalledPackages`] tracker. Matches
//!   from every index are ranked together: packages already installed
//!   elsewhere come first, then the rest by popularity until the popularity
//!   gap grows too large.
//!
//! # Invariants
//!
//! - A published [`SymbolIndex`] is immutable. Replacement swaps the whole
//!   `Arc`; readers holding the old one keep a consistent view.
//! - Queries never block on the synchronization loop. Without a published
//!   index they return nothing.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use index::{ActiveIndex, NoInstalledPackages, QueryEngine, SymbolEntry, SymbolIndex};
//!
//! let holder = Arc::new(ActiveIndex::new());
//! let engine = QueryEngine::new(Arc::clone(&holder), Arc::new(NoInstalledPackages));
//! assert_eq!(engine.search("JsonConvert").count(), 0);
//!
//! holder.publish(SymbolIndex::new(
//!     "2024.1",
//!     vec![SymbolEntry::new("JsonConvert", "Newtonsoft.Json", "Newtonsoft.Json", 9)],
//! ));
//! let hits: Vec<_> = engine.search("JsonConvert").collect();
//! assert_eq!(hits[0].package, "Newtonsoft.Json");
//! ```

pub mod codec;
mod entry;
mod holder;
mod installed;
mod query;
mod sources;
mod symbol_index;

pub use codec::{DecodeError, decode, encode};
pub use entry::{SymbolEntry, SymbolOrigin};
pub use holder::{ActiveIndex, PublishOutcome};
pub use installed::{InstalledPackages, NoInstalledPackages, StaticInstalledPackages};
pub use query::{PackageMatch, QueryEngine, RankedMatches, popularity_tier};
pub use sources::{IndexView, SourceIndexes};
pub use symbol_index::SymbolIndex;
