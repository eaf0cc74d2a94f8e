//! Error categorization for snapshot store operations.
//!
//! Store errors split into transient failures, which a bounded retry may
//! outlast (a file briefly locked by a scanner, an interrupted call), and
//! fatal ones that no retry can fix (storage full, read-only filesystem).

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Store operation that failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreOperation {
    /// Creating the cache directory.
    CreateDir,
    /// Listing the cache directory.
    ListDir,
    /// Reading the cache file.
    Read,
    /// Creating or writing the staging file.
    Stage,
    /// Flushing the staging file to stable storage.
    Sync,
    /// Renaming the staging file over the cache file.
    Replace,
}

impl fmt::Display for StoreOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::CreateDir => "create cache directory",
            Self::ListDir => "list cache directory",
            Self::Read => "read snapshot",
            Self::Stage => "stage snapshot",
            Self::Sync => "sync snapshot",
            Self::Replace => "replace snapshot",
        })
    }
}

/// Whether retrying an I/O failure can succeed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IoDisposition {
    /// May succeed on a later attempt.
    Transient,
    /// Will fail again; give up immediately.
    Fatal,
}

/// Snapshot store failure.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying I/O failure.
    #[error("failed to {operation} at {}: {source}", path.display())]
    Io {
        /// Operation that failed.
        operation: StoreOperation,
        /// Path the operation targeted.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
}

impl StoreError {
    /// Wraps `source` as a failure of `operation` on `path`.
    #[must_use]
    pub fn io(operation: StoreOperation, path: &Path, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.to_path_buf(),
            source,
        }
    }

    /// Returns the failed operation.
    #[must_use]
    pub const fn operation(&self) -> StoreOperation {
        match self {
            Self::Io { operation, .. } => *operation,
        }
    }

    /// Returns the path the failed operation targeted.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Io { path, .. } => path,
        }
    }

    /// Classifies this error for retry decisions.
    #[must_use]
    pub fn disposition(&self) -> IoDisposition {
        match self {
            Self::Io { source, .. } => categorize_io_error(source),
        }
    }
}

/// Categorizes an [`io::Error`] by whether a retry may succeed.
///
/// # Examples
///
/// ```
/// use std::io;
/// use store::{IoDisposition, categorize_io_error};
///
/// let full = io::Error::from(io::ErrorKind::StorageFull);
/// assert_eq!(categorize_io_error(&full), IoDisposition::Fatal);
///
/// let denied = io::Error::from(io::ErrorKind::PermissionDenied);
/// assert_eq!(categorize_io_error(&denied), IoDisposition::Transient);
/// ```
#[must_use]
pub fn categorize_io_error(err: &io::Error) -> IoDisposition {
    use io::ErrorKind::{QuotaExceeded, ReadOnlyFilesystem, StorageFull};

    match err.kind() {
        StorageFull | QuotaExceeded | ReadOnlyFilesystem => IoDisposition::Fatal,
        // Sharing violations and scanner locks surface as PermissionDenied on
        // Windows; they clear on their own.
        _ => IoDisposition::Transient,
    }
}
