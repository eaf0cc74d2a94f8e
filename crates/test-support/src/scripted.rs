use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::{Mutex, PoisonError};

use engine::{Fetched, RemoteError, RemoteSource};

/// One scripted answer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Scripted {
    /// Serve this body.
    Body(Vec<u8>),
    /// Report the document as not yet published.
    NotYet,
    /// Fail with this HTTP-like status.
    Fail(u16),
    /// Never answer; only cancellation ends the fetch.
    Hang,
}

/// Remote source answering from per-path queues.
///
/// Each fetch pops the next answer queued for its path; the last answer of
/// a queue repeats. Paths without a script fail with status 599 so a
/// misconfigured test fails fast instead of polling forever.
#[derive(Debug, Default)]
pub struct ScriptedRemote {
    scripts: Mutex<HashMap<String, VecDeque<Scripted>>>,
    requests: Mutex<Vec<String>>,
}

impl ScriptedRemote {
    /// Creates a remote with no scripts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `answer` for `path`.
    pub fn push(&self, path: &str, answer: Scripted) -> &Self {
        self.scripts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(path.to_owned())
            .or_default()
            .push_back(answer);
        self
    }

    /// Queues a body for `path`.
    pub fn serve(&self, path: &str, body: Vec<u8>) -> &Self {
        self.push(path, Scripted::Body(body))
    }

    /// Drops every queued answer for `path`.
    pub fn clear(&self, path: &str) {
        self.scripts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(path);
    }

    /// Paths fetched so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of fetches of `path` so far.
    #[must_use]
    pub fn request_count(&self, path: &str) -> usize {
        self.requests().iter().filter(|requested| *requested == path).count()
    }

    fn next_answer(&self, path: &str) -> Option<Scripted> {
        let mut scripts = self.scripts.lock().unwrap_or_else(PoisonError::into_inner);
        let queue = scripts.get_mut(path)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

impl RemoteSource for ScriptedRemote {
    fn fetch(
        &self,
        _source: &str,
        path: &str,
    ) -> impl Future<Output = Result<Fetched, RemoteError>> + Send {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(path.to_owned());
        let answer = self.next_answer(path);
        let url = format!("scripted://{path}");
        async move {
            match answer {
                Some(Scripted::Body(body)) => Ok(Fetched::Available(body)),
                Some(Scripted::NotYet) => Ok(Fetched::NotYetAvailable),
                Some(Scripted::Fail(status)) => Err(RemoteError::Status { url, status }),
                Some(Scripted::Hang) => std::future::pending().await,
                None => Err(RemoteError::Status { url, status: 599 }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block_on<F: Future>(future: F) -> F::Output {
        let mut future = std::pin::pin!(future);
        let waker = std::task::Waker::noop();
        let mut cx = std::task::Context::from_waker(waker);
        loop {
            if let std::task::Poll::Ready(value) = future.as_mut().poll(&mut cx) {
                return value;
            }
        }
    }

    #[test]
    fn last_answer_repeats() {
        let remote = ScriptedRemote::new();
        remote.push("a", Scripted::NotYet).serve("a", b"body".to_vec());
        assert_eq!(block_on(remote.fetch("s", "a")).expect("fetch"), Fetched::NotYetAvailable);
        for _ in 0..2 {
            assert_eq!(
                block_on(remote.fetch("s", "a")).expect("fetch"),
                Fetched::Available(b"body".to_vec())
            );
        }
        assert_eq!(remote.request_count("a"), 3);
    }

    #[test]
    fn unscripted_paths_fail() {
        let remote = ScriptedRemote::new();
        assert!(matches!(
            block_on(remote.fetch("s", "missing")),
            Err(RemoteError::Status { status: 599, .. })
        ));
    }
}
