//! Staging files for atomic replacement.
//!
//! A snapshot is written to a hidden sibling `.<name>.XXXXXX` of its cache
//! file, where `XXXXXX` is random and alphanumeric, then renamed into place.
//! The sibling exists only while [`StagedFile`] is alive and uncommitted.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

const SUFFIX_LEN: usize = 6;
const SUFFIX_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
const CREATE_ATTEMPTS: u32 = 16;

fn staging_prefix(file_name: &str) -> String {
    format!(".{file_name}.")
}

/// Reports whether `candidate` names a staging sibling of `file_name`.
///
/// ```
/// use store::is_staging_name;
///
/// assert!(is_staging_name(".feed.snapshot.a1B2c3", "feed.snapshot"));
/// assert!(!is_staging_name("feed.snapshot", "feed.snapshot"));
/// assert!(!is_staging_name(".feed.snapshot.a1B2c3d", "feed.snapshot"));
/// ```
#[must_use]
pub fn is_staging_name(candidate: &str, file_name: &str) -> bool {
    match candidate.strip_prefix(&staging_prefix(file_name)) {
        Some(suffix) => {
            suffix.len() == SUFFIX_LEN && suffix.bytes().all(|b| SUFFIX_ALPHABET.contains(&b))
        }
        None => false,
    }
}

/// A new file next to its destination, removed on drop unless committed.
#[derive(Debug)]
pub struct StagedFile {
    path: PathBuf,
    file: Option<fs::File>,
    committed: bool,
}

impl StagedFile {
    /// Creates a fresh staging sibling of `dest` with `O_EXCL` semantics.
    ///
    /// The parent directory of `dest` must exist.
    pub fn create(dest: &Path) -> io::Result<Self> {
        let file_name = dest
            .file_name()
            .map_or_else(|| "snapshot".into(), |name| name.to_string_lossy());
        let dir = dest.parent().unwrap_or_else(|| Path::new("."));
        let prefix = staging_prefix(&file_name);

        for _ in 0..CREATE_ATTEMPTS {
            let path = dir.join(format!("{prefix}{}", random_suffix()?));
            match fs::OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => {
                    return Ok(Self {
                        path,
                        file: Some(file),
                        committed: false,
                    });
                }
                Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {}
                Err(err) => return Err(err),
            }
        }
        Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("no free staging name for {} after {CREATE_ATTEMPTS} attempts", dest.display()),
        ))
    }

    /// Path of the staging file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends `bytes`.
    pub fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.handle()?.write_all(bytes)
    }

    /// Flushes contents and metadata to stable storage.
    pub fn sync(&mut self) -> io::Result<()> {
        self.handle()?.sync_all()
    }

    /// Closes the file and renames it over `dest`. On failure the staging
    /// file is removed and `dest` is untouched.
    pub fn commit(self, dest: &Path) -> io::Result<()> {
        self.commit_with(dest, |staged, dest| fs::rename(staged, dest))
    }

    /// Like [`commit`](Self::commit), moving the file with `replace`.
    pub fn commit_with<F>(mut self, dest: &Path, replace: F) -> io::Result<()>
    where
        F: FnOnce(&Path, &Path) -> io::Result<()>,
    {
        drop(self.file.take());
        replace(&self.path, dest)?;
        self.committed = true;
        Ok(())
    }

    fn handle(&mut self) -> io::Result<&mut fs::File> {
        self.file
            .as_mut()
            .ok_or_else(|| io::Error::other("staging file already closed"))
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if !self.committed {
            drop(self.file.take());
            // Already gone is fine; nothing to report from drop.
            let _ = fs::remove_file(&self.path);
        }
    }
}

fn random_suffix() -> io::Result<String> {
    let mut bytes = [0u8; SUFFIX_LEN];
    getrandom::fill(&mut bytes).map_err(io::Error::other)?;
    Ok(bytes
        .iter()
        .map(|&b| char::from(SUFFIX_ALPHABET[usize::from(b) % SUFFIX_ALPHABET.len()]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn names_in(dir: &Path) -> Vec<String> {
        fs::read_dir(dir)
            .expect("list")
            .map(|entry| entry.expect("entry").file_name().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn staged_file_is_hidden_sibling() {
        let dir = tempdir().expect("create temp dir");
        let staged = StagedFile::create(&dir.path().join("feed.snapshot")).expect("stage");

        assert_eq!(staged.path().parent(), Some(dir.path()));
        let name = staged.path().file_name().expect("name").to_string_lossy();
        assert!(is_staging_name(&name, "feed.snapshot"), "got: {name}");
    }

    #[test]
    fn dropped_stage_leaves_nothing() {
        let dir = tempdir().expect("create temp dir");
        {
            let mut staged = StagedFile::create(&dir.path().join("feed.snapshot")).expect("stage");
            staged.write_all(b"partial").expect("write");
        }
        assert!(names_in(dir.path()).is_empty());
    }

    #[test]
    fn commit_moves_contents_into_place() {
        let dir = tempdir().expect("create temp dir");
        let dest = dir.path().join("feed.snapshot");
        fs::write(&dest, b"old").expect("seed");

        let mut staged = StagedFile::create(&dest).expect("stage");
        staged.write_all(b"new contents").expect("write");
        staged.sync().expect("sync");
        staged.commit(&dest).expect("commit");

        assert_eq!(fs::read(&dest).expect("read"), b"new contents");
        assert_eq!(names_in(dir.path()), ["feed.snapshot"]);
    }

    #[test]
    fn failed_commit_removes_stage() {
        let dir = tempdir().expect("create temp dir");
        let dest = dir.path().join("feed.snapshot");
        let staged = StagedFile::create(&dest).expect("stage");
        let staged_path = staged.path().to_path_buf();

        let err = staged
            .commit(&dir.path().join("absent/feed.snapshot"))
            .expect_err("target directory missing");
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(!staged_path.exists());
    }

    #[test]
    fn concurrent_stages_get_distinct_names() {
        let dir = tempdir().expect("create temp dir");
        let dest = dir.path().join("feed.snapshot");
        let first = StagedFile::create(&dest).expect("first");
        let second = StagedFile::create(&dest).expect("second");
        assert_ne!(first.path(), second.path());
    }

    #[test]
    fn dotfile_destination_gets_its_own_prefix() {
        let dir = tempdir().expect("create temp dir");
        let staged = StagedFile::create(&dir.path().join(".hidden")).expect("stage");
        let name = staged.path().file_name().expect("name").to_string_lossy();
        assert!(name.starts_with("..hidden."), "got: {name}");
        assert!(is_staging_name(&name, ".hidden"));
        assert!(!is_staging_name(&name, "hidden"));
    }

    #[test]
    fn leading_dots_keep_staging_names_apart() {
        for (own, other) in [
            ("..snapshot", "...snapshot"),
            ("...snapshot", "..snapshot"),
            ("x.snapshot", ".x.snapshot"),
            (".x.snapshot", "x.snapshot"),
        ] {
            let dir = tempdir().expect("create temp dir");
            let staged = StagedFile::create(&dir.path().join(own)).expect("stage");
            let name = staged.path().file_name().expect("name").to_string_lossy();
            assert!(is_staging_name(&name, own), "{name} for {own}");
            assert!(!is_staging_name(&name, other), "{name} claimed by {other}");
        }
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempdir().expect("create temp dir");
        let err = StagedFile::create(&dir.path().join("absent/feed.snapshot")).expect_err("no dir");
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn foreign_names_are_not_staging_names() {
        assert!(!is_staging_name(".other.snapshot.abcdef", "feed.snapshot"));
        assert!(!is_staging_name(".feed.snapshot.abc-ef", "feed.snapshot"));
        assert!(!is_staging_name("feed.snapshot.bak", "feed.snapshot"));
    }
}
