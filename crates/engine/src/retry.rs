//! crates/engine/src/retry.rs
//!
//! Bounded, cancellable retry of an async operation.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// How many times to try and how long to wait in between.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Zero behaves like one.
    pub attempts: u32,
    /// Wait between attempts.
    pub delay: Duration,
}

impl RetryPolicy {
    /// Creates a policy.
    #[must_use]
    pub const fn new(attempts: u32, delay: Duration) -> Self {
        Self { attempts, delay }
    }
}

/// Classifier verdict for a failed attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Disposition {
    /// Try again after the policy delay.
    Retry,
    /// Stop and surface the error.
    Abort,
}

/// Final result of [`retry_async`].
#[derive(Debug)]
pub enum RetryOutcome<T, E> {
    /// An attempt succeeded.
    Success {
        /// Value returned by the successful attempt.
        value: T,
        /// Attempts made, including the successful one.
        attempts: u32,
    },
    /// Every attempt failed with a retryable error.
    Exhausted {
        /// Error of the last attempt.
        error: E,
        /// Attempts made.
        attempts: u32,
    },
    /// The classifier refused to retry.
    Aborted {
        /// Error that was not retried.
        error: E,
        /// Attempts made.
        attempts: u32,
    },
    /// Cancellation was requested before an attempt or during a wait.
    Cancelled {
        /// Attempts made before cancellation.
        attempts: u32,
    },
}

impl<T, E> RetryOutcome<T, E> {
    /// Number of attempts made.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        match self {
            Self::Success { attempts, .. }
            | Self::Exhausted { attempts, .. }
            | Self::Aborted { attempts, .. }
            | Self::Cancelled { attempts } => *attempts,
        }
    }
}

/// Runs `operation` until it succeeds, the classifier aborts, the policy is
/// exhausted, or `cancel` fires.
///
/// `operation` receives the 1-based attempt number. Cancellation is checked
/// before every attempt and raced against every wait; a running attempt is
/// never interrupted.
pub async fn retry_async<T, E, F, Fut, C>(
    policy: RetryPolicy,
    cancel: &CancellationToken,
    mut operation: F,
    classify: C,
) -> RetryOutcome<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    C: Fn(&E) -> Disposition,
{
    let limit = policy.attempts.max(1);
    let mut attempt = 0;
    loop {
        if cancel.is_cancelled() {
            return RetryOutcome::Cancelled { attempts: attempt };
        }
        attempt += 1;

        let error = match operation(attempt).await {
            Ok(value) => {
                return RetryOutcome::Success {
                    value,
                    attempts: attempt,
                };
            }
            Err(error) => error,
        };

        if classify(&error) == Disposition::Abort {
            return RetryOutcome::Aborted {
                error,
                attempts: attempt,
            };
        }
        if attempt >= limit {
            return RetryOutcome::Exhausted {
                error,
                attempts: attempt,
            };
        }

        tokio::select! {
            biased;
            () = cancel.cancelled() => return RetryOutcome::Cancelled { attempts: attempt },
            () = tokio::time::sleep(policy.delay) => {}
        }
    }
}
