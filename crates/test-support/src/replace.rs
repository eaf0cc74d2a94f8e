use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use store::{Rename, ReplaceFile};

/// [`ReplaceFile`] failing its first calls with a fixed error kind, then
/// renaming.
#[derive(Debug)]
pub struct FailingReplace {
    kind: io::ErrorKind,
    failures: usize,
    calls: AtomicUsize,
}

impl FailingReplace {
    /// Fails every call with `kind`.
    #[must_use]
    pub fn always(kind: io::ErrorKind) -> Self {
        Self::times(kind, usize::MAX)
    }

    /// Fails the first `failures` calls with `kind`.
    #[must_use]
    pub fn times(kind: io::ErrorKind, failures: usize) -> Self {
        Self {
            kind,
            failures,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of replace attempts so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ReplaceFile for FailingReplace {
    fn replace(&self, staged: &Path, dest: &Path) -> io::Result<()> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            return Err(io::Error::from(self.kind));
        }
        Rename.replace(staged, dest)
    }
}
