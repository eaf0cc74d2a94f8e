//! Ranking policy observed through the public query surface.

use std::sync::Arc;

use index::{
    ActiveIndex, InstalledPackages, NoInstalledPackages, QueryEngine, StaticInstalledPackages,
    SymbolEntry, SymbolIndex,
};

fn engine(entries: Vec<SymbolEntry>, installed: Arc<dyn InstalledPackages>) -> QueryEngine {
    let holder = Arc::new(ActiveIndex::new());
    holder.publish(SymbolIndex::new("2024.06", entries));
    QueryEngine::new(holder, installed)
}

fn names(engine: &QueryEngine, query: &str) -> Vec<String> {
    engine.search(query).map(|entry| entry.package).collect()
}

// ============================================================================
// Installed packages and popularity tiers
// ============================================================================

#[test]
fn installed_package_leads_and_weak_tail_is_cut() {
    let installed = Arc::new(StaticInstalledPackages::new());
    installed.install("A", "5.0.1");
    let engine = engine(
        vec![
            SymbolEntry::new("Widget", "Ui", "B", 5),
            SymbolEntry::new("Widget", "Ui", "D", 1),
            SymbolEntry::new("Widget", "Ui", "A", 5),
            SymbolEntry::new("Widget", "Ui", "C", 3),
        ],
        installed,
    );
    assert_eq!(names(&engine, "Widget"), ["A", "B", "C"]);
}

#[test]
fn tracker_changes_apply_to_next_query() {
    let installed = Arc::new(StaticInstalledPackages::new());
    let engine = engine(
        vec![
            SymbolEntry::new("Widget", "Ui", "popular", 200),
            SymbolEntry::new("Widget", "Ui", "niche", 2),
        ],
        installed.clone(),
    );
    assert_eq!(names(&engine, "Widget"), ["popular"]);

    installed.install("niche", "0.1.0");
    assert_eq!(names(&engine, "Widget"), ["niche", "popular"]);
}

#[test]
fn all_installed_matches_are_returned() {
    let installed: Arc<StaticInstalledPackages> =
        Arc::new([("x", "1"), ("y", "1"), ("z", "1")].into_iter().collect());
    let engine = engine(
        vec![
            SymbolEntry::new("T", "N", "x", 255),
            SymbolEntry::new("T", "N", "y", 1),
            SymbolEntry::new("T", "N", "z", 0),
        ],
        installed,
    );
    assert_eq!(names(&engine, "T"), ["x", "y", "z"]);
}

// ============================================================================
// Name matching
// ============================================================================

#[test]
fn qualified_queries_narrow_by_namespace_suffix() {
    let engine = engine(
        vec![
            SymbolEntry::new("Task", "System.Threading.Tasks", "runtime", 200),
            SymbolEntry::new("Task", "Build.Framework", "msbuild", 150),
        ],
        Arc::new(NoInstalledPackages),
    );
    assert_eq!(names(&engine, "Task"), ["runtime", "msbuild"]);
    assert_eq!(names(&engine, "Tasks.Task"), ["runtime"]);
    assert_eq!(names(&engine, "Framework.Task"), ["msbuild"]);
    assert!(names(&engine, "Threading.Task").is_empty());
}

#[test]
fn results_reflect_latest_publish() {
    let holder = Arc::new(ActiveIndex::new());
    let engine = QueryEngine::new(Arc::clone(&holder), Arc::new(NoInstalledPackages));
    assert!(engine.search("Widget").next().is_none());

    holder.publish(SymbolIndex::new("1", vec![SymbolEntry::new("Widget", "Ui", "first", 9)]));
    holder.publish(SymbolIndex::new("2", vec![SymbolEntry::new("Widget", "Ui", "second", 9)]));
    assert_eq!(names(&engine, "Widget"), ["second"]);
}
