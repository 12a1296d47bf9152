#![allow(dead_code)]

use std::sync::Arc;

use dirwatcher::fs::mock::MockFileSystem;
use dirwatcher::watch::Watcher;

pub use dirwatcher_test_utils::*;

/// A watcher over the mock reference tree, with an attached event log.
pub fn tree1_watcher(matches: &[&str], ignores: &[&str]) -> (Watcher, EventLog) {
    watcher_on(mock_tree1(), &["/tree1"], matches, ignores)
}

pub fn watcher_on(
    fs: MockFileSystem,
    roots: &[&str],
    matches: &[&str],
    ignores: &[&str],
) -> (Watcher, EventLog) {
    let watcher = Watcher::builder(roots.iter().copied())
        .matches(matches)
        .ignores(ignores)
        .filesystem(Arc::new(fs))
        .build()
        .expect("valid watcher");
    let log = EventLog::attach(&watcher);
    (watcher, log)
}

/// `/tree1/<rel>` for each relative path.
pub fn under_tree1(rels: &[&str]) -> Vec<std::path::PathBuf> {
    rels.iter()
        .map(|rel| std::path::Path::new("/tree1").join(rel))
        .collect()
}
