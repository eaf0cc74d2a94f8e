#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `store` owns the on-disk snapshot cache: one file per distribution source
//! under a root cache directory. It knows how to name that file, how to
//! replace it atomically, and how to sweep away the temporary and backup
//! artifacts an interrupted writer leaves behind.
//!
//! # Design
//!
//! - [`cache_file_name`] derives a filesystem-safe name from a source id.
//!   Underscores are doubled and every character invalid on common
//!   filesystems becomes `_<ordinal>_`, so distinct ids never collide.
//! - [`SnapshotStore::persist`] stages bytes in a `.name.XXXXXX` sibling
//!   created with `O_EXCL`, fsyncs it, and renames it over the cache file.
//!   A [`StagedFile`] deletes the sibling on every early exit.
//! - [`SnapshotStore::clean`] removes this source's orphaned temp and
//!   `.bak` files. Individual delete failures are logged and skipped;
//!   failure to create or list the directory is an error.
//!
//! # Invariants
//!
//! - The cache file is never observed partially written: readers see either
//!   the previous snapshot or the new one.
//! - Cleanup only touches files derived from the source it was asked to
//!   clean, so loops for different sources can share a directory.
//!
//! # Errors
//!
//! Every failure is a [`StoreError`] carrying the operation and path.
//! [`StoreError::disposition`] classifies it for retry decisions: storage
//! full and read-only filesystems are [`IoDisposition::Fatal`], everything
//! else is [`IoDisposition::Transient`].
//!
//! # Examples
//!
//! ```
//! use store::SnapshotStore;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let store = SnapshotStore::new(dir.path().join("cache"));
//! store.clean("nuget.org").unwrap();
//!
//! assert!(!store.exists("nuget.org"));
//! store.persist("nuget.org", b"snapshot").unwrap();
//! assert_eq!(store.read("nuget.org").unwrap().as_deref(), Some(&b"snapshot"[..]));
//! ```

mod error;
mod naming;
mod snapshot;
mod staging;

pub use error::{IoDisposition, StoreError, StoreOperation, categorize_io_error};
pub use naming::{BACKUP_EXTENSION, SNAPSHOT_EXTENSION, cache_file_name, escape_source};
pub use snapshot::{CleanReport, Rename, ReplaceFile, SnapshotStore};
pub use staging::{StagedFile, is_staging_name};
