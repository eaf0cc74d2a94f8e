//! Remote content sources.
//!
//! A source serves two kinds of documents per distribution source: the full
//! snapshot and patches keyed by base version (see [`crate::wire`] for the
//! paths). Content may not be published yet; sources report that as
//! [`Fetched::NotYetAvailable`] and the engine polls.

mod directory;
#[cfg(feature = "http")]
mod http;

use std::future::Future;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub use directory::DirectorySource;
#[cfg(feature = "http")]
pub use http::HttpSource;

/// Result of a successful fetch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Fetched {
    /// The document body.
    Available(Vec<u8>),
    /// The document does not exist yet; try again later.
    NotYetAvailable,
}

/// Transport failures. All of them are transient for the engine.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Reading a local mirror failed.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        /// File that could not be read.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// The request could not be built from the source id and path.
    #[error("invalid remote location {location}: {reason}")]
    InvalidLocation {
        /// Source id and path that were combined.
        location: String,
        /// What was wrong.
        reason: String,
    },
    /// The server answered with an unexpected status.
    #[error("{url} answered {status}")]
    Status {
        /// Request URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },
    /// The response body exceeded the configured limit.
    #[error("{url} sent more than {limit} bytes")]
    TooLarge {
        /// Request URL.
        url: String,
        /// Largest accepted body, in bytes.
        limit: usize,
    },
    /// The HTTP request failed.
    #[cfg(feature = "http")]
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Where the engine fetches snapshots and patches from.
///
/// `path` is relative to the distribution source, for example
/// `Symbols_V1/Latest.json`.
pub trait RemoteSource: Send + Sync {
    /// Fetches the document at `path` for `source`.
    fn fetch(
        &self,
        source: &str,
        path: &str,
    ) -> impl Future<Output = Result<Fetched, RemoteError>> + Send;
}

impl<T: RemoteSource> RemoteSource for std::sync::Arc<T> {
    fn fetch(
        &self,
        source: &str,
        path: &str,
    ) -> impl Future<Output = Result<Fetched, RemoteError>> + Send {
        (**self).fetch(source, path)
    }
}
