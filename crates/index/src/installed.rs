//! crates/index/src/installed.rs
//! Signal source for "package already used elsewhere".

use std::collections::{BTreeMap, BTreeSet};
use std::sync::RwLock;
use std::sync::PoisonError;

/// Reports which versions of a package the consuming environment already
/// uses. Only the query ranking consults it.
pub trait InstalledPackages: Send + Sync {
    /// Returns the installed versions of `package`; empty when not installed.
    fn installed_versions(&self, package: &str) -> BTreeSet<String>;

    /// Reports whether any version of `package` is installed.
    fn is_installed(&self, package: &str) -> bool {
        !self.installed_versions(package).is_empty()
    }
}

/// Tracker for environments without package information.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoInstalledPackages;

impl InstalledPackages for NoInstalledPackages {
    fn installed_versions(&self, _package: &str) -> BTreeSet<String> {
        BTreeSet::new()
    }
}

/// In-memory tracker whose contents the host updates as projects change.
#[derive(Debug, Default)]
pub struct StaticInstalledPackages {
    packages: RwLock<BTreeMap<String, BTreeSet<String>>>,
}

impl StaticInstalledPackages {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `version` of `package` as installed.
    pub fn install(&self, package: &str, version: &str) {
        self.packages
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(package.to_owned())
            .or_default()
            .insert(version.to_owned());
    }

    /// Forgets every version of `package`.
    pub fn uninstall(&self, package: &str) {
        self.packages
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(package);
    }
}

impl<P, V> FromIterator<(P, V)> for StaticInstalledPackages
where
    P: AsRef<str>,
    V: AsRef<str>,
{
    fn from_iter<I: IntoIterator<Item = (P, V)>>(iter: I) -> Self {
        let tracker = Self::new();
        for (package, version) in iter {
            tracker.install(package.as_ref(), version.as_ref());
        }
        tracker
    }
}

impl InstalledPackages for StaticInstalledPackages {
    fn installed_versions(&self, package: &str) -> BTreeSet<String> {
        self.packages
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(package)
            .cloned()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_reports_nothing() {
        assert!(!NoInstalledPackages.is_installed("anything"));
    }

    #[test]
    fn static_tracker_collects_versions() {
        let tracker: StaticInstalledPackages =
            [("A", "1.0"), ("A", "2.0"), ("B", "0.1")].into_iter().collect();
        assert_eq!(
            tracker.installed_versions("A").into_iter().collect::<Vec<_>>(),
            ["1.0", "2.0"]
        );
        assert!(tracker.is_installed("B"));
        assert!(!tracker.is_installed("C"));
    }

    #[test]
    fn uninstall_removes_all_versions() {
        let tracker = StaticInstalledPackages::new();
        tracker.install("A", "1.0");
        tracker.uninstall("A");
        assert!(!tracker.is_installed("A"));
    }
}
