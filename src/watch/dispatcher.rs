// src/watch/dispatcher.rs

//! Turns raw change notifications into [`UpdateEvent`]s.

use std::path::{Path, PathBuf};

use notify::event::{EventKind as NotifyKind, ModifyKind, RenameMode};
use tracing::{debug, trace, warn};

use crate::fs::FileSystem;
use crate::types::{EventKind, FileKind};
use crate::watch::event::{EventBus, UpdateEvent};
use crate::watch::filter::PathFilter;
use crate::watch::monitor::RawEvent;
use crate::watch::registry::MonitorRegistry;

/// Handles notifications coming from installed monitors.
///
/// Failures here never stop the watcher: they are logged and the
/// notification is still passed on when it makes sense.
pub struct ChangeDispatcher<'a> {
    fs: &'a dyn FileSystem,
    filter: &'a PathFilter,
    registry: &'a MonitorRegistry,
    bus: &'a EventBus,
}

impl<'a> ChangeDispatcher<'a> {
    pub fn new(
        fs: &'a dyn FileSystem,
        filter: &'a PathFilter,
        registry: &'a MonitorRegistry,
        bus: &'a EventBus,
    ) -> Self {
        Self {
            fs,
            filter,
            registry,
            bus,
        }
    }

    /// Handle one notification as delivered by `notify`.
    pub fn dispatch_raw(&self, raw: RawEvent) {
        match raw {
            Ok(event) => {
                trace!(?event, "received notify event");
                for (kind, path) in self.translate(event.kind, event.paths) {
                    self.dispatch(kind, &path);
                }
            }
            Err(err) => warn!("file watch error: {err}"),
        }
    }

    /// Filter, keep the registry in step, and re-emit.
    pub fn dispatch(&self, kind: EventKind, path: &Path) {
        if !self.filter.is_matched(path) || self.filter.is_ignored(path) {
            trace!(?path, %kind, "dropping uninteresting change");
            return;
        }

        // A deleted path cannot be looked up anymore.
        let file_kind = match kind {
            EventKind::Deleted => FileKind::Unknown,
            _ => self.fs.file_kind(path),
        };

        match kind {
            EventKind::Created if file_kind == FileKind::Directory => {
                if let Err(err) = self.registry.install(path) {
                    warn!(?path, error = %err, "failed to install monitor");
                }
            }
            EventKind::Deleted => {
                if self.registry.remove(path) {
                    debug!(?path, "monitored directory deleted");
                }
            }
            _ => {}
        }

        self.bus.emit(&UpdateEvent::new(kind, file_kind, path));
    }

    /// Map a `notify` event onto zero or more (kind, path) notifications.
    ///
    /// Renames become a deletion of the old name and a creation of the new
    /// one. Access and metadata-only notifications are dropped.
    ///
    /// A paired `Both` rename always follows its own `From` and `To`
    /// halves, so it carries nothing new and is dropped as well.
    fn translate(&self, kind: NotifyKind, paths: Vec<PathBuf>) -> Vec<(EventKind, PathBuf)> {
        let all = |k: EventKind, paths: Vec<PathBuf>| -> Vec<(EventKind, PathBuf)> {
            paths.into_iter().map(|p| (k, p)).collect()
        };

        match kind {
            NotifyKind::Create(_) => all(EventKind::Created, paths),
            NotifyKind::Remove(_) => all(EventKind::Deleted, paths),
            NotifyKind::Modify(ModifyKind::Name(mode)) => match mode {
                RenameMode::From => all(EventKind::Deleted, paths),
                RenameMode::To => all(EventKind::Created, paths),
                RenameMode::Both => Vec::new(),
                // Backend could not tell which side this is; look.
                _ => paths
                    .into_iter()
                    .map(|p| {
                        let kind = if self.fs.exists(&p) {
                            EventKind::Created
                        } else {
                            EventKind::Deleted
                        };
                        (kind, p)
                    })
                    .collect(),
            },
            NotifyKind::Modify(ModifyKind::Metadata(_)) => Vec::new(),
            NotifyKind::Modify(_) => all(EventKind::Changed, paths),
            NotifyKind::Access(_) | NotifyKind::Any | NotifyKind::Other => Vec::new(),
        }
    }
}
