// src/watch/monitor.rs

//! Per-directory change monitors.

use std::fmt;
use std::path::Path;

use anyhow::Context;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::errors::{Result, WatcherError};

/// Raw notification as produced by the OS watcher.
pub type RawEvent = notify::Result<Event>;

/// Something that can watch single directories (non-recursively) for
/// changes to their direct children.
///
/// The implementation owns the underlying OS handles; the
/// [`MonitorRegistry`](crate::watch::registry::MonitorRegistry) decides when
/// to add and drop them.
pub trait DirectoryMonitor: Send {
    fn watch(&mut self, path: &Path) -> Result<()>;
    fn unwatch(&mut self, path: &Path) -> Result<()>;
}

/// `notify`-backed monitor.
///
/// A single OS watcher carries all directory watches; its callback only
/// forwards raw events into a channel. Events must be handled elsewhere:
/// adding a watch from inside the callback would block the notifier.
pub struct NotifyMonitor {
    inner: RecommendedWatcher,
}

impl fmt::Debug for NotifyMonitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotifyMonitor").finish_non_exhaustive()
    }
}

impl NotifyMonitor {
    pub fn new(raw_tx: mpsc::UnboundedSender<RawEvent>) -> Result<Self> {
        let inner = RecommendedWatcher::new(
            move |res: RawEvent| {
                // Receiver gone means the watcher is shutting down.
                let _ = raw_tx.send(res);
            },
            Config::default(),
        )
        .context("creating filesystem watcher")?;
        Ok(Self { inner })
    }
}

impl DirectoryMonitor for NotifyMonitor {
    fn watch(&mut self, path: &Path) -> Result<()> {
        self.inner
            .watch(path, RecursiveMode::NonRecursive)
            .map_err(|source| WatcherError::Monitor {
                path: path.to_path_buf(),
                source,
            })
    }

    fn unwatch(&mut self, path: &Path) -> Result<()> {
        self.inner
            .unwatch(path)
            .map_err(|source| WatcherError::Monitor {
                path: path.to_path_buf(),
                source,
            })
    }
}
