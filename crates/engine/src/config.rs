//! crates/engine/src/config.rs
//!
//! Synchronization loop configuration.
//!
//! Durations are (de)serialised as fractional seconds so configuration files
//! read naturally:
//!
//! ```json
//! { "cacheDir": "/var/cache/symdex", "succeededDelay": 86400, "pollInterval": 30 }
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default wait after a successful cycle.
pub const DEFAULT_SUCCEEDED_DELAY: Duration = Duration::from_secs(24 * 60 * 60);
/// Default wait after a failed cycle.
pub const DEFAULT_FAILED_DELAY: Duration = Duration::from_secs(60);
/// Default wait between polls for content that is not yet available.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);
/// Default number of persist attempts.
pub const DEFAULT_PERSIST_ATTEMPTS: u32 = 6;
/// Default wait between persist attempts.
pub const DEFAULT_PERSIST_RETRY_DELAY: Duration = Duration::from_secs(2);
/// Default ceiling on an inflated snapshot.
pub const DEFAULT_MAX_SNAPSHOT_BYTES: usize = 512 * 1024 * 1024;

/// Name of the directory created under the platform cache directory.
const CACHE_DIR_NAME: &str = "symdex";

/// Tunables for one synchronization loop.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct SyncConfig {
    /// Directory holding one snapshot file per source.
    pub cache_dir: PathBuf,
    /// Wait after a successful cycle.
    #[serde(with = "duration_secs")]
    pub succeeded_delay: Duration,
    /// Wait after a failed cycle.
    #[serde(with = "duration_secs")]
    pub failed_delay: Duration,
    /// Wait between polls while the remote reports content not yet available.
    #[serde(with = "duration_secs")]
    pub poll_interval: Duration,
    /// Persist attempts before giving up on a transient I/O error.
    pub persist_attempts: u32,
    /// Wait between persist attempts.
    #[serde(with = "duration_secs")]
    pub persist_retry_delay: Duration,
    /// Largest inflated snapshot accepted; larger content is treated as corrupt.
    pub max_snapshot_bytes: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncConfig {
    /// Creates a configuration with default settings and the platform cache
    /// directory.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            succeeded_delay: DEFAULT_SUCCEEDED_DELAY,
            failed_delay: DEFAULT_FAILED_DELAY,
            poll_interval: DEFAULT_POLL_INTERVAL,
            persist_attempts: DEFAULT_PERSIST_ATTEMPTS,
            persist_retry_delay: DEFAULT_PERSIST_RETRY_DELAY,
            max_snapshot_bytes: DEFAULT_MAX_SNAPSHOT_BYTES,
        }
    }

    /// Parses and validates a JSON configuration document. Missing fields
    /// take their defaults.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the invariants the loop relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.persist_attempts == 0 {
            return Err(ConfigError::Invalid {
                field: "persistAttempts",
                reason: "must be at least 1",
            });
        }
        if self.poll_interval.is_zero() {
            return Err(ConfigError::Invalid {
                field: "pollInterval",
                reason: "must be positive",
            });
        }
        if self.max_snapshot_bytes == 0 {
            return Err(ConfigError::Invalid {
                field: "maxSnapshotBytes",
                reason: "must be positive",
            });
        }
        Ok(())
    }

    /// Sets the cache directory.
    #[must_use]
    pub fn cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    /// Sets the wait after a successful cycle.
    #[must_use]
    pub fn succeeded_delay(mut self, delay: Duration) -> Self {
        self.succeeded_delay = delay;
        self
    }

    /// Sets the wait after a failed cycle.
    #[must_use]
    pub fn failed_delay(mut self, delay: Duration) -> Self {
        self.failed_delay = delay;
        self
    }

    /// Sets the poll interval. Zero is raised to one millisecond.
    #[must_use]
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(Duration::from_millis(1));
        self
    }

    /// Sets the number of persist attempts (at least one).
    #[must_use]
    pub fn persist_attempts(mut self, attempts: u32) -> Self {
        self.persist_attempts = attempts.max(1);
        self
    }

    /// Sets the wait between persist attempts.
    #[must_use]
    pub fn persist_retry_delay(mut self, delay: Duration) -> Self {
        self.persist_retry_delay = delay;
        self
    }

    /// Sets the inflated snapshot ceiling (at least one byte).
    #[must_use]
    pub fn max_snapshot_bytes(mut self, max: usize) -> Self {
        self.max_snapshot_bytes = max.max(1);
        self
    }
}

/// `<platform cache dir>/symdex`, or under the temp directory when the
/// platform has no cache directory.
#[must_use]
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(CACHE_DIR_NAME)
}

/// Configuration parsing failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The document is not valid JSON for [`SyncConfig`].
    #[error("invalid sync configuration: {0}")]
    Json(#[from] serde_json::Error),
    /// A field has an unusable value.
    #[error("invalid sync configuration: {field} {reason}")]
    Invalid {
        /// Offending field, as spelled in JSON.
        field: &'static str,
        /// What is wrong with it.
        reason: &'static str,
    },
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer, de};

    pub(super) fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SyncConfig::new();
        assert_eq!(config.succeeded_delay, Duration::from_secs(86_400));
        assert_eq!(config.failed_delay, Duration::from_secs(60));
        assert_eq!(config.poll_interval, Duration::from_secs(60));
        assert_eq!(config.persist_attempts, 6);
        assert_eq!(config.persist_retry_delay, Duration::from_secs(2));
        assert_eq!(config.max_snapshot_bytes, 512 * 1024 * 1024);
        assert!(config.cache_dir.ends_with("symdex"));
    }

    #[test]
    fn json_overrides_only_named_fields() {
        let config = SyncConfig::from_json(
            r#"{ "cacheDir": "/tmp/symdex-test", "failedDelay": 1.5, "persistAttempts": 2 }"#,
        )
        .expect("parse");
        assert_eq!(config.cache_dir, PathBuf::from("/tmp/symdex-test"));
        assert_eq!(config.failed_delay, Duration::from_millis(1500));
        assert_eq!(config.persist_attempts, 2);
        assert_eq!(config.succeeded_delay, DEFAULT_SUCCEEDED_DELAY);
    }

    #[test]
    fn json_rejects_unknown_fields() {
        assert!(matches!(
            SyncConfig::from_json(r#"{ "cacheDirectory": "/tmp" }"#),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn json_rejects_negative_durations() {
        assert!(SyncConfig::from_json(r#"{ "pollInterval": -1 }"#).is_err());
    }

    #[test]
    fn json_rejects_zero_attempts() {
        assert!(matches!(
            SyncConfig::from_json(r#"{ "persistAttempts": 0 }"#),
            Err(ConfigError::Invalid {
                field: "persistAttempts",
                ..
            })
        ));
    }

    #[test]
    fn serialised_form_parses_back() {
        let config = SyncConfig::new()
            .cache_dir("/srv/cache")
            .poll_interval(Duration::from_millis(250));
        let text = serde_json::to_string(&config).expect("serialise");
        assert_eq!(SyncConfig::from_json(&text).expect("parse"), config);
    }

    #[test]
    fn builder_clamps_degenerate_values() {
        let config = SyncConfig::new()
            .persist_attempts(0)
            .poll_interval(Duration::ZERO)
            .max_snapshot_bytes(0);
        assert!(config.validate().is_ok());
    }
}
