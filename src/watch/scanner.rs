// src/watch/scanner.rs

//! Recursive directory walk.
//!
//! The walk is depth-first and pre-order: a directory's `Created` event is
//! emitted before anything inside it. It stops at the first fatal error
//! (for any of the roots) and checks for cancellation at the top of every
//! directory and before every entry.

use std::io;
use std::path::{Path, PathBuf};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use crate::errors::{Result, WatcherError};
use crate::fs::{DirEntry, EntryType, FileSystem};
use crate::types::{EventKind, FileKind, PATH_MAX};
use crate::watch::event::{EventBus, UpdateEvent};
use crate::watch::filter::PathFilter;
use crate::watch::registry::MonitorRegistry;

/// What a successful scan emitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// Directory `Created` events.
    pub directories: usize,
    /// Regular-file `Created` events.
    pub files: usize,
}

/// One walk over a set of roots.
pub struct ScanEngine<'a> {
    fs: &'a dyn FileSystem,
    filter: &'a PathFilter,
    registry: &'a MonitorRegistry,
    bus: &'a EventBus,
    cancel: &'a CancellationToken,
    summary: ScanSummary,
}

impl<'a> ScanEngine<'a> {
    pub fn new(
        fs: &'a dyn FileSystem,
        filter: &'a PathFilter,
        registry: &'a MonitorRegistry,
        bus: &'a EventBus,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            fs,
            filter,
            registry,
            bus,
            cancel,
            summary: ScanSummary::default(),
        }
    }

    /// Walk every root in order.
    pub fn run(mut self, roots: &[PathBuf]) -> Result<ScanSummary> {
        info!(?roots, "scan started");
        for root in roots {
            self.process_dir(root)?;
        }
        info!(
            directories = self.summary.directories,
            files = self.summary.files,
            "scan finished"
        );
        Ok(self.summary)
    }

    fn check_cancelled(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(WatcherError::Cancelled);
        }
        Ok(())
    }

    fn process_dir(&mut self, dir: &Path) -> Result<()> {
        self.check_cancelled()?;

        if self.filter.is_ignored(dir) {
            debug!(?dir, "ignoring directory");
            return Ok(());
        }

        let listing = self
            .fs
            .read_dir(dir)
            .map_err(|e| WatcherError::from_io(dir, e))?;

        self.emit(EventKind::Created, FileKind::Directory, dir);
        self.summary.directories += 1;

        self.registry.install(dir)?;

        let mut entries = Vec::new();
        for entry in listing {
            self.check_cancelled()?;
            entries.push(entry.map_err(|source| WatcherError::Io {
                path: dir.to_path_buf(),
                source,
            })?);
        }
        sort_by_inode(&mut entries);

        for entry in &entries {
            self.process_entry(dir, entry)?;
        }
        Ok(())
    }

    fn process_entry(&mut self, dir: &Path, entry: &DirEntry) -> Result<()> {
        self.check_cancelled()?;

        if entry.name == "." || entry.name == ".." {
            return Ok(());
        }

        let path = dir.join(&entry.name);
        if path.as_os_str().len() > PATH_MAX {
            return Err(WatcherError::PathTooLong(path));
        }

        let Some(entry_type) = self.classify(&path, entry.entry_type)? else {
            trace!(?path, "entry vanished while scanning");
            return Ok(());
        };

        match entry_type {
            EntryType::Regular => {
                if self.filter.is_matched(&path) {
                    self.emit(EventKind::Created, FileKind::Regular, &path);
                    self.summary.files += 1;
                }
            }
            EntryType::Directory => self.process_dir(&path)?,
            other => trace!(?path, ?other, "skipping entry"),
        }
        Ok(())
    }

    /// Resolve the entry type, looking the path up when the listing did not
    /// say. `None` means the entry was deleted under our feet.
    fn classify(&self, path: &Path, hint: EntryType) -> Result<Option<EntryType>> {
        if hint != EntryType::Unknown {
            return Ok(Some(hint));
        }
        match self.fs.symlink_type(path) {
            Ok(t) => Ok(Some(t)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(_) if !self.fs.exists(path) => Ok(None),
            Err(source) => Err(WatcherError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    fn emit(&self, kind: EventKind, file_kind: FileKind, path: &Path) {
        self.bus.emit(&UpdateEvent::new(kind, file_kind, path));
    }
}

/// Inode order is much friendlier to the filesystem cache than name or
/// listing order. Only applied when every entry has one.
fn sort_by_inode(entries: &mut [DirEntry]) {
    if entries.iter().all(|e| e.ino.is_some()) {
        entries.sort_by_key(|e| e.ino);
    }
}
