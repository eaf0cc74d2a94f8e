//! crates/logging/src/levels.rs
//! Subsystem targets and verbosity levels.

use std::fmt;

/// Subsystems that emit diagnostics.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Subsystem {
    /// Synchronization loop decisions, delays and failures.
    Sync,
    /// Cache directory maintenance and snapshot persistence.
    Store,
    /// Patch application and generation.
    Delta,
    /// Active index publication and searches.
    Query,
    /// Per-source loop registration.
    Registry,
}

impl Subsystem {
    /// All subsystems in declaration order.
    pub const ALL: [Self; 5] = [
        Self::Sync,
        Self::Store,
        Self::Delta,
        Self::Query,
        Self::Registry,
    ];

    /// Returns the tracing target events of this subsystem are emitted under.
    #[must_use]
    pub const fn target(self) -> &'static str {
        match self {
            Self::Sync => "symdex::sync",
            Self::Store => "symdex::store",
            Self::Delta => "symdex::delta",
            Self::Query => "symdex::query",
            Self::Registry => "symdex::registry",
        }
    }

    /// Maps a tracing target back to its subsystem.
    #[must_use]
    pub fn from_target(target: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.target() == target)
    }
}

impl fmt::Display for Subsystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.target())
    }
}

/// Coarse verbosity applied to every `symdex::*` target.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    /// Errors only.
    Quiet,
    /// Warnings and lifecycle events.
    #[default]
    Normal,
    /// Per-cycle decisions.
    Debug,
    /// Everything, including per-attempt retries.
    Trace,
}

impl Verbosity {
    /// Maps a `-v` style repetition count onto a verbosity.
    ///
    /// `0` is [`Normal`](Self::Normal); counts past the last level saturate.
    #[must_use]
    pub const fn from_verbose_level(level: u8) -> Self {
        match level {
            0 => Self::Normal,
            1 | 2 => Self::Debug,
            _ => Self::Trace,
        }
    }

    /// Returns the `EnvFilter` directive enabling this verbosity.
    #[must_use]
    pub const fn directive(self) -> &'static str {
        match self {
            Self::Quiet => "symdex=error",
            Self::Normal => "symdex=info",
            Self::Debug => "symdex=debug",
            Self::Trace => "symdex=trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn targets_share_prefix() {
        for subsystem in Subsystem::ALL {
            assert!(subsystem.target().starts_with("symdex::"));
        }
    }

    #[test]
    fn from_target_inverts_target() {
        for subsystem in Subsystem::ALL {
            assert_eq!(Subsystem::from_target(subsystem.target()), Some(subsystem));
        }
        assert_eq!(Subsystem::from_target("other::copy"), None);
    }

    #[test]
    fn verbose_levels_saturate() {
        assert_eq!(Verbosity::from_verbose_level(0), Verbosity::Normal);
        assert_eq!(Verbosity::from_verbose_level(1), Verbosity::Debug);
        assert_eq!(Verbosity::from_verbose_level(3), Verbosity::Trace);
        assert_eq!(Verbosity::from_verbose_level(u8::MAX), Verbosity::Trace);
    }

    #[test]
    fn verbosity_orders_by_detail() {
        assert!(Verbosity::Quiet < Verbosity::Normal);
        assert!(Verbosity::Debug < Verbosity::Trace);
    }
}
