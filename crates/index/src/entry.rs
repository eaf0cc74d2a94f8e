//! crates/index/src/entry.rs
//! The query result unit.

use std::fmt;

/// Where a symbol entry comes from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SymbolOrigin {
    /// A type shipped by a package.
    #[default]
    Package,
    /// A type shipped by a framework reference assembly.
    ReferenceAssembly,
}

/// One symbol definition in the catalog.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SymbolEntry {
    /// Short name, e.g. `JsonConvert`.
    pub name: String,
    /// Containing namespace segments, outermost first.
    pub namespace: Vec<String>,
    /// Owning package identifier (or reference assembly name).
    pub package: String,
    /// Package version the entry was indexed from, when known.
    pub package_version: Option<String>,
    /// Defining assembly, when known.
    pub assembly: Option<String>,
    /// Popularity rank. Larger is more popular.
    pub rank: u8,
    /// Generic arity of the type.
    pub arity: u8,
    /// Package or reference assembly.
    pub origin: SymbolOrigin,
}

impl SymbolEntry {
    /// Creates a package entry. `namespace` is dotted; empty means global.
    #[must_use]
    pub fn new(name: &str, namespace: &str, package: &str, rank: u8) -> Self {
        Self {
            name: name.to_owned(),
            namespace: split_namespace(namespace),
            package: package.to_owned(),
            package_version: None,
            assembly: None,
            rank,
            arity: 0,
            origin: SymbolOrigin::Package,
        }
    }

    /// Sets the generic arity.
    #[must_use]
    pub fn with_arity(mut self, arity: u8) -> Self {
        self.arity = arity;
        self
    }

    /// Sets the package version.
    #[must_use]
    pub fn with_package_version(mut self, version: &str) -> Self {
        self.package_version = Some(version.to_owned());
        self
    }

    /// Sets the defining assembly.
    #[must_use]
    pub fn with_assembly(mut self, assembly: &str) -> Self {
        self.assembly = Some(assembly.to_owned());
        self
    }

    /// Marks the entry as coming from a reference assembly.
    #[must_use]
    pub fn in_reference_assembly(mut self) -> Self {
        self.origin = SymbolOrigin::ReferenceAssembly;
        self
    }

    /// Returns the dotted namespace.
    #[must_use]
    pub fn namespace_path(&self) -> String {
        self.namespace.join(".")
    }

    /// Returns the dotted fully qualified name.
    #[must_use]
    pub fn full_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace_path(), self.name)
        }
    }

    /// Reports whether the namespace ends with `suffix`.
    #[must_use]
    pub fn namespace_ends_with(&self, suffix: &[&str]) -> bool {
        suffix.len() <= self.namespace.len()
            && self.namespace[self.namespace.len() - suffix.len()..]
                .iter()
                .zip(suffix)
                .all(|(have, want)| have == want)
    }
}

impl fmt::Display for SymbolEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name())?;
        if self.arity > 0 {
            write!(f, "`{}", self.arity)?;
        }
        write!(f, " ({})", self.package)
    }
}

pub(crate) fn split_namespace(dotted: &str) -> Vec<String> {
    dotted
        .split('.')
        .filter(|segment| !segment.is_empty())
        .map(str::to_owned)
        .collect()
}
