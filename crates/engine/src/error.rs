use checksums::IntegrityError;
use delta::PatchError;
use index::DecodeError;
use store::StoreError;
use thiserror::Error;

use crate::remote::RemoteError;
use crate::wire::WireError;

/// How the loop reacts to a [`SyncError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Severity {
    /// Network or disk trouble; the next cycle may succeed unchanged.
    Transient,
    /// The bytes themselves are wrong. On the patch path this triggers a full
    /// download in the same cycle.
    CorruptContent,
    /// Cancellation was requested.
    Cancelled,
}

/// Which payload an integrity check covered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Payload {
    /// Full snapshot document content.
    Snapshot,
    /// Patch document content.
    Patch,
}

impl std::fmt::Display for Payload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Snapshot => "snapshot",
            Self::Patch => "patch",
        })
    }
}

/// Failures of one synchronization cycle.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Fetching a remote document failed.
    #[error("fetching {path} failed: {source}")]
    Remote {
        /// Document path.
        path: String,
        /// Transport error.
        #[source]
        source: RemoteError,
    },
    /// A cache operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Persisting stopped after the retry budget or a fatal error.
    #[error("persisting snapshot failed after {attempts} attempt(s): {source}")]
    Persist {
        /// Attempts made.
        attempts: u32,
        /// Error of the last attempt.
        #[source]
        source: Box<SyncError>,
    },
    /// Downloaded bytes do not match their checksum.
    #[error("{payload} content failed verification: {source}")]
    Integrity {
        /// Which payload was checked.
        payload: Payload,
        /// Mismatch details.
        #[source]
        source: IntegrityError,
    },
    /// A remote document is malformed.
    #[error(transparent)]
    Wire(#[from] WireError),
    /// The patch does not apply to the local snapshot.
    #[error("patch rejected: {0}")]
    Patch(#[from] PatchError),
    /// Snapshot bytes do not decode.
    #[error("snapshot does not decode: {0}")]
    Decode(#[from] DecodeError),
    /// A blocking task panicked or was aborted.
    #[error("background task failed: {0}")]
    Task(String),
    /// Cancellation was requested.
    #[error("synchronization cancelled")]
    Cancelled,
}

impl SyncError {
    /// Classifies the error for the loop.
    #[must_use]
    pub fn severity(&self) -> Severity {
        match self {
            Self::Remote { .. } | Self::Store(_) | Self::Task(_) => Severity::Transient,
            Self::Persist { source, .. } => source.severity(),
            Self::Integrity { .. } | Self::Wire(_) | Self::Patch(_) | Self::Decode(_) => {
                Severity::CorruptContent
            }
            Self::Cancelled => Severity::Cancelled,
        }
    }

    /// Reports whether the error is a cancellation.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.severity() == Severity::Cancelled
    }
}
