use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use logging::trace_store;

use crate::error::{StoreError, StoreOperation};
use crate::naming::{BACKUP_EXTENSION, cache_file_name};
use crate::staging::{StagedFile, is_staging_name};

/// Outcome of a cleanup pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CleanReport {
    /// Artifacts deleted.
    pub removed: Vec<PathBuf>,
    /// Artifacts that could not be deleted; retried on the next pass.
    pub failed: Vec<PathBuf>,
}

/// Moves a flushed staging file over the cache file.
pub trait ReplaceFile: fmt::Debug + Send + Sync {
    /// Replaces `dest` with `staged`.
    fn replace(&self, staged: &Path, dest: &Path) -> io::Result<()>;
}

/// [`ReplaceFile`] backed by [`fs::rename`].
#[derive(Clone, Copy, Debug, Default)]
pub struct Rename;

impl ReplaceFile for Rename {
    fn replace(&self, staged: &Path, dest: &Path) -> io::Result<()> {
        fs::rename(staged, dest)
    }
}

/// Cache directory holding one snapshot file per distribution source.
#[derive(Clone, Debug)]
pub struct SnapshotStore {
    dir: PathBuf,
    replace: Arc<dyn ReplaceFile>,
}

impl SnapshotStore {
    /// Creates a store rooted at `dir`. Nothing is touched until the first
    /// operation.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            replace: Arc::new(Rename),
        }
    }

    /// Uses `replace` for the final step of [`persist`](Self::persist).
    #[must_use]
    pub fn with_replace<F: ReplaceFile + 'static>(mut self, replace: Arc<F>) -> Self {
        self.replace = replace;
        self
    }

    /// Returns the cache directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the canonical cache file path of `source`.
    #[must_use]
    pub fn cache_path(&self, source: &str) -> PathBuf {
        self.dir.join(cache_file_name(source))
    }

    /// Reports whether a cache file exists for `source`.
    #[must_use]
    pub fn exists(&self, source: &str) -> bool {
        self.cache_path(source).is_file()
    }

    /// Reads the cache file of `source`, `None` when there is none.
    pub fn read(&self, source: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let path = self.cache_path(source);
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(StoreError::io(StoreOperation::Read, &path, err)),
        }
    }

    /// Atomically replaces the cache file of `source` with `bytes`.
    ///
    /// The bytes are written to a fresh staging sibling, flushed to stable
    /// storage and renamed over the cache file. On any failure the staging
    /// file is removed and the previous cache file is left untouched.
    pub fn persist(&self, source: &str, bytes: &[u8]) -> Result<PathBuf, StoreError> {
        let dest = self.cache_path(source);
        let mut staged = StagedFile::create(&dest)
            .map_err(|err| StoreError::io(StoreOperation::Stage, &dest, err))?;
        staged
            .write_all(bytes)
            .map_err(|err| StoreError::io(StoreOperation::Stage, staged.path(), err))?;
        staged
            .sync()
            .map_err(|err| StoreError::io(StoreOperation::Sync, staged.path(), err))?;
        staged
            .commit_with(&dest, |from, to| self.replace.replace(from, to))
            .map_err(|err| StoreError::io(StoreOperation::Replace, &dest, err))?;
        sync_dir(&self.dir);

        trace_store!(
            path = %dest.display(),
            bytes = bytes.len(),
            "snapshot persisted"
        );
        Ok(dest)
    }

    /// Ensures the cache directory exists and removes orphaned artifacts of
    /// `source`: staging siblings of its cache file and `.bak` files.
    ///
    /// Creating or listing the directory failing is an error. A single
    /// artifact that cannot be deleted is logged and reported in
    /// [`CleanReport::failed`].
    pub fn clean(&self, source: &str) -> Result<CleanReport, StoreError> {
        fs::create_dir_all(&self.dir)
            .map_err(|err| StoreError::io(StoreOperation::CreateDir, &self.dir, err))?;

        let file_name = cache_file_name(source);
        let backup_name = format!("{file_name}.{BACKUP_EXTENSION}");
        let entries = fs::read_dir(&self.dir)
            .map_err(|err| StoreError::io(StoreOperation::ListDir, &self.dir, err))?;

        let mut report = CleanReport::default();
        for entry in entries {
            let entry = entry.map_err(|err| StoreError::io(StoreOperation::ListDir, &self.dir, err))?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name != backup_name && !is_staging_name(&name, &file_name) {
                continue;
            }

            let path = entry.path();
            match fs::remove_file(&path) {
                Ok(()) => report.removed.push(path),
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => {
                    tracing::warn!(
                        target: "symdex::store",
                        path = %path.display(),
                        error = %err,
                        "could not remove stale artifact"
                    );
                    report.failed.push(path);
                }
            }
        }

        if !report.removed.is_empty() {
            trace_store!(
                source,
                removed = report.removed.len(),
                "removed stale cache artifacts"
            );
        }
        Ok(report)
    }
}

/// Flushes the directory entry after a rename.
#[cfg(unix)]
fn sync_dir(dir: &Path) {
    if let Ok(handle) = fs::File::open(dir) {
        let _ = handle.sync_all();
    }
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) {}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn store() -> (tempfile::TempDir, SnapshotStore) {
        let dir = tempdir().expect("create temp dir");
        let store = SnapshotStore::new(dir.path().join("cache"));
        store.clean("feed").expect("create cache dir");
        (dir, store)
    }

    #[test]
    fn read_missing_snapshot_is_none() {
        let (_dir, store) = store();
        assert!(store.read("feed").expect("read").is_none());
        assert!(!store.exists("feed"));
    }

    #[test]
    fn persist_then_read_round_trips() {
        let (_dir, store) = store();
        let path = store.persist("feed", b"v1").expect("persist");
        assert_eq!(path, store.cache_path("feed"));
        assert_eq!(store.read("feed").expect("read"), Some(b"v1".to_vec()));
    }

    #[test]
    fn persist_replaces_existing_file() {
        let (_dir, store) = store();
        store.persist("feed", b"old snapshot").expect("persist");
        store.persist("feed", b"new").expect("persist");
        assert_eq!(store.read("feed").expect("read"), Some(b"new".to_vec()));
    }

    #[test]
    fn persist_leaves_no_staging_files() {
        let (_dir, store) = store();
        store.persist("feed", b"bytes").expect("persist");
        let names: Vec<_> = fs::read_dir(store.dir())
            .expect("list")
            .map(|e| e.expect("entry").file_name())
            .collect();
        assert_eq!(names.len(), 1, "unexpected entries: {names:?}");
    }

    #[test]
    fn persist_without_directory_fails_and_keeps_nothing() {
        let dir = tempdir().expect("create temp dir");
        let store = SnapshotStore::new(dir.path().join("missing"));
        let err = store.persist("feed", b"bytes").expect_err("no directory");
        assert_eq!(err.operation(), StoreOperation::Stage);
        assert!(!dir.path().join("missing").exists());
    }

    #[derive(Debug)]
    struct DiskFull;

    impl ReplaceFile for DiskFull {
        fn replace(&self, _staged: &Path, _dest: &Path) -> io::Result<()> {
            Err(io::Error::from(io::ErrorKind::StorageFull))
        }
    }

    #[test]
    fn failed_replace_keeps_previous_snapshot() {
        let (_dir, store) = store();
        store.persist("feed", b"old").expect("persist");
        let store = store.with_replace(Arc::new(DiskFull));

        let err = store.persist("feed", b"new").expect_err("replace fails");

        assert_eq!(err.operation(), StoreOperation::Replace);
        assert_eq!(err.disposition(), crate::IoDisposition::Fatal);
        assert_eq!(store.read("feed").expect("read"), Some(b"old".to_vec()));
        let names: Vec<_> = fs::read_dir(store.dir())
            .expect("list")
            .map(|e| e.expect("entry").file_name())
            .collect();
        assert_eq!(names.len(), 1, "unexpected entries: {names:?}");
    }

    #[test]
    fn clean_creates_directory() {
        let dir = tempdir().expect("create temp dir");
        let store = SnapshotStore::new(dir.path().join("a/b/c"));
        let report = store.clean("feed").expect("clean");
        assert!(store.dir().is_dir());
        assert_eq!(report, CleanReport::default());
    }

    #[test]
    fn clean_removes_only_own_artifacts() {
        let (_dir, store) = store();
        let own_temp = store.dir().join(".feed.snapshot.Ab12Cd");
        let own_backup = store.dir().join("feed.snapshot.bak");
        let other_temp = store.dir().join(".other.snapshot.Ab12Cd");
        let canonical = store.cache_path("feed");
        for path in [&own_temp, &own_backup, &other_temp, &canonical] {
            fs::write(path, b"x").expect("write");
        }

        let report = store.clean("feed").expect("clean");

        assert_eq!(report.removed.len(), 2);
        assert!(!own_temp.exists());
        assert!(!own_backup.exists());
        assert!(other_temp.exists());
        assert!(canonical.exists());
    }

    #[test]
    fn clean_keeps_staging_files_of_sources_differing_in_leading_dots() {
        let (_dir, store) = store();
        assert_eq!(cache_file_name("."), "..snapshot");
        assert_eq!(cache_file_name(".."), "...snapshot");
        let one_dot = store.dir().join("...snapshot.Ab12Cd");
        let two_dots = store.dir().join("....snapshot.Ab12Cd");
        for path in [&one_dot, &two_dots] {
            fs::write(path, b"x").expect("write");
        }

        let report = store.clean(".").expect("clean");

        assert_eq!(report.removed, [one_dot.clone()]);
        assert!(!one_dot.exists());
        assert!(two_dots.exists());
    }

    #[test]
    fn clean_fails_when_directory_cannot_be_created() {
        let dir = tempdir().expect("create temp dir");
        let blocker = dir.path().join("file");
        fs::write(&blocker, b"not a dir").expect("write");
        let store = SnapshotStore::new(blocker.join("cache"));
        let err = store.clean("feed").expect_err("parent is a file");
        assert_eq!(err.operation(), StoreOperation::CreateDir);
    }
}
