// src/watch/registry.rs

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info};

use crate::errors::{Result, WatcherError};
use crate::fs::FileSystem;
use crate::types::PATH_MAX;
use crate::watch::monitor::DirectoryMonitor;

struct RegistryState {
    /// `None` when monitoring is disabled.
    monitor: Option<Box<dyn DirectoryMonitor>>,
    watched: HashSet<PathBuf>,
}

/// Set of directories with an active change monitor.
///
/// Both the scan worker and the change dispatcher go through here; all
/// map operations and the backend calls that go with them happen under a
/// single lock, so a directory is never watched twice.
pub struct MonitorRegistry {
    fs: Arc<dyn FileSystem>,
    state: Mutex<RegistryState>,
}

impl fmt::Debug for MonitorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("MonitorRegistry")
            .field("enabled", &state.monitor.is_some())
            .field("watched", &state.watched.len())
            .finish()
    }
}

impl MonitorRegistry {
    pub fn new(fs: Arc<dyn FileSystem>, monitor: Option<Box<dyn DirectoryMonitor>>) -> Self {
        Self {
            fs,
            state: Mutex::new(RegistryState {
                monitor,
                watched: HashSet::new(),
            }),
        }
    }

    /// A registry that never installs anything.
    pub fn disabled(fs: Arc<dyn FileSystem>) -> Self {
        Self::new(fs, None)
    }

    pub fn is_enabled(&self) -> bool {
        self.lock().monitor.is_some()
    }

    /// Start monitoring `path`.
    ///
    /// Succeeds without doing anything when monitoring is disabled or the
    /// directory is already monitored.
    pub fn install(&self, path: &Path) -> Result<()> {
        let mut guard = self.lock();
        let RegistryState { monitor, watched } = &mut *guard;

        let Some(monitor) = monitor.as_mut() else {
            return Ok(());
        };
        if watched.contains(path) {
            return Ok(());
        }
        if path.as_os_str().len() > PATH_MAX {
            return Err(WatcherError::PathTooLong(path.to_path_buf()));
        }

        self.fs
            .verify_readable_dir(path)
            .map_err(|e| WatcherError::from_io(path, e))?;
        monitor.watch(path)?;
        watched.insert(path.to_path_buf());

        debug!(?path, "installed monitor");
        Ok(())
    }

    /// Stop monitoring `path`. Returns whether it was monitored.
    pub fn remove(&self, path: &Path) -> bool {
        let mut guard = self.lock();
        let RegistryState { monitor, watched } = &mut *guard;

        if !watched.remove(path) {
            return false;
        }
        if let Some(monitor) = monitor.as_mut() {
            // The OS usually drops the watch itself when the directory goes.
            if let Err(err) = monitor.unwatch(path) {
                debug!(?path, error = %err, "unwatch failed");
            }
        }
        debug!(?path, "removed monitor");
        true
    }

    /// Drop every monitor.
    pub fn teardown(&self) {
        let mut guard = self.lock();
        let RegistryState { monitor, watched } = &mut *guard;

        if watched.is_empty() {
            return;
        }
        if let Some(monitor) = monitor.as_mut() {
            for path in watched.iter() {
                if let Err(err) = monitor.unwatch(path) {
                    debug!(?path, error = %err, "unwatch failed");
                }
            }
        }
        info!(count = watched.len(), "tore down directory monitors");
        watched.clear();
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.lock().watched.contains(path)
    }

    pub fn len(&self) -> usize {
        self.lock().watched.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Monitored directories, sorted.
    pub fn paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.lock().watched.iter().cloned().collect();
        paths.sort();
        paths
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
