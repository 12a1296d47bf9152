use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use dirwatcher::errors::{Result, WatcherError};
use dirwatcher::watch::DirectoryMonitor;

#[derive(Debug, Default)]
struct State {
    calls: Vec<String>,
    failing: HashSet<PathBuf>,
}

/// A monitor backend that:
/// - records every watch / unwatch call
/// - fails `watch` for paths registered with [`FakeMonitor::fail_on`].
///
/// Clones share state, so keep one clone for assertions and hand the other
/// to the watcher.
#[derive(Debug, Clone, Default)]
pub struct FakeMonitor {
    state: Arc<Mutex<State>>,
}

impl FakeMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_on(&self, path: impl Into<PathBuf>) {
        self.state.lock().unwrap().failing.insert(path.into());
    }

    /// Calls in order, e.g. `"watch /tree1"`.
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn boxed(&self) -> Box<dyn DirectoryMonitor> {
        Box::new(self.clone())
    }
}

impl DirectoryMonitor for FakeMonitor {
    fn watch(&mut self, path: &Path) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.failing.contains(path) {
            return Err(WatcherError::Io {
                path: path.to_path_buf(),
                source: io::Error::other("watch limit reached"),
            });
        }
        state.calls.push(format!("watch {}", path.display()));
        Ok(())
    }

    fn unwatch(&mut self, path: &Path) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("unwatch {}", path.display()));
        Ok(())
    }
}
