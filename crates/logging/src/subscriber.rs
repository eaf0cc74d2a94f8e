//! crates/logging/src/subscriber.rs
//! Process-wide subscriber installation.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::Verbosity;

/// Environment variable holding an `EnvFilter` directive that overrides the
/// requested verbosity.
pub const LOG_ENV_VAR: &str = "SYMDEX_LOG";

/// Result of a subscriber installation attempt.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InitOutcome {
    /// This call installed the global subscriber.
    Installed,
    /// A global subscriber was already present; nothing changed.
    AlreadyInstalled,
}

/// Installs a fmt subscriber writing to stderr.
///
/// The filter comes from [`LOG_ENV_VAR`] when it is set and parses, and from
/// `verbosity` otherwise.
///
/// # Example
///
/// ```rust
/// use logging::{InitOutcome, Verbosity, init_tracing};
///
/// let first = init_tracing(Verbosity::Debug);
/// assert_eq!(init_tracing(Verbosity::Debug), InitOutcome::AlreadyInstalled);
/// # let _ = first;
/// ```
pub fn init_tracing(verbosity: Verbosity) -> InitOutcome {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(verbosity.directive()));
    init_tracing_with_filter(filter)
}

/// Installs a fmt subscriber behind a caller supplied filter layer.
///
/// # Example
///
/// ```rust,ignore
/// use logging::init_tracing_with_filter;
/// use tracing_subscriber::EnvFilter;
///
/// init_tracing_with_filter(EnvFilter::new("symdex::sync=trace"));
/// ```
pub fn init_tracing_with_filter<F>(filter: F) -> InitOutcome
where
    F: Layer<tracing_subscriber::Registry> + Send + Sync + 'static,
{
    let fmt = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);

    match tracing_subscriber::registry().with(filter).with(fmt).try_init() {
        Ok(()) => InitOutcome::Installed,
        Err(_) => InitOutcome::AlreadyInstalled,
    }
}
