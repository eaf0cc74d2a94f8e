use std::future::Future;
use std::io;
use std::path::{Component, Path, PathBuf};

use store::escape_source;

use super::{Fetched, RemoteError, RemoteSource};

/// Remote source backed by a local mirror laid out as
/// `<root>/<escaped source>/<path>`.
///
/// Missing files are [`Fetched::NotYetAvailable`]. Useful for offline
/// deployments and for exercising the engine without a network.
#[derive(Clone, Debug)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    /// Creates a source reading below `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the mirror root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves the file a fetch of `path` for `source` reads.
    ///
    /// Paths that would leave the source directory are rejected.
    pub fn locate(&self, source: &str, path: &str) -> Result<PathBuf, RemoteError> {
        let relative = Path::new(path);
        let escapes = relative
            .components()
            .any(|component| !matches!(component, Component::Normal(_)));
        if escapes || path.is_empty() {
            return Err(RemoteError::InvalidLocation {
                location: format!("{source}/{path}"),
                reason: "path must be relative without `..`".to_owned(),
            });
        }
        Ok(self.root.join(escape_source(source)).join(relative))
    }
}

impl RemoteSource for DirectorySource {
    fn fetch(
        &self,
        source: &str,
        path: &str,
    ) -> impl Future<Output = Result<Fetched, RemoteError>> + Send {
        let location = self.locate(source, path);
        async move {
            let file = location?;
            match tokio::fs::read(&file).await {
                Ok(bytes) => Ok(Fetched::Available(bytes)),
                Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Fetched::NotYetAvailable),
                Err(source) => Err(RemoteError::Io { path: file, source }),
            }
        }
    }
}
