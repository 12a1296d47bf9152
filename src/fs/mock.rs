// src/fs/mock.rs

//! In-memory filesystem for tests.
//!
//! Besides plain files and directories it can simulate the awkward cases a
//! real tree throws at a scanner: listings without type information,
//! entries that disappear between listing and lookup, unreadable
//! directories and failing lookups.

use std::collections::HashMap;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{DirEntry, DirListing, EntryType, FileSystem};
use crate::types::FileKind;

#[derive(Debug, Clone)]
pub enum MockEntry {
    File,
    Dir(Vec<String>), // List of child names
    Symlink,
    Fifo,
}

#[derive(Debug, Clone)]
struct MockNode {
    entry: MockEntry,
    ino: u64,
    hide_type: bool,
    open_error: Option<io::ErrorKind>,
    lookup_error: Option<io::ErrorKind>,
}

#[derive(Debug, Default)]
struct MockState {
    nodes: HashMap<PathBuf, MockNode>,
    next_ino: u64,
}

#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    state: Arc<Mutex<MockState>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        let fs = Self::default();
        fs.insert(Path::new("/"), MockEntry::Dir(Vec::new()));
        fs
    }

    pub fn add_file(&self, path: impl AsRef<Path>) {
        self.insert(path.as_ref(), MockEntry::File);
    }

    /// Existing directories are left as they are.
    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        let exists = matches!(
            self.lock().nodes.get(path),
            Some(MockNode {
                entry: MockEntry::Dir(_),
                ..
            })
        );
        if !exists {
            self.insert(path, MockEntry::Dir(Vec::new()));
        }
    }

    pub fn add_symlink(&self, path: impl AsRef<Path>) {
        self.insert(path.as_ref(), MockEntry::Symlink);
    }

    pub fn add_fifo(&self, path: impl AsRef<Path>) {
        self.insert(path.as_ref(), MockEntry::Fifo);
    }

    /// Make listings report [`EntryType::Unknown`] for `path`.
    pub fn hide_type(&self, path: impl AsRef<Path>) {
        self.with_node(path.as_ref(), |n| n.hide_type = true);
    }

    /// Make opening `path` (as a directory) fail with `kind`.
    pub fn fail_open(&self, path: impl AsRef<Path>, kind: io::ErrorKind) {
        self.with_node(path.as_ref(), |n| n.open_error = Some(kind));
    }

    /// Make type lookups of `path` fail with `kind` while it still exists.
    pub fn fail_lookup(&self, path: impl AsRef<Path>, kind: io::ErrorKind) {
        self.with_node(path.as_ref(), |n| n.lookup_error = Some(kind));
    }

    pub fn set_inode(&self, path: impl AsRef<Path>, ino: u64) {
        self.with_node(path.as_ref(), |n| n.ino = ino);
    }

    /// Drop `path` itself but leave its name in the parent's listing, as if
    /// it was deleted right after the parent was read.
    pub fn vanish(&self, path: impl AsRef<Path>) {
        let mut state = self.lock();
        state.nodes.remove(path.as_ref());
    }

    /// Put a bare `name` into the listing of `dir` with nothing behind it.
    pub fn add_listing_name(&self, dir: impl AsRef<Path>, name: &str) {
        let mut state = self.lock();
        if let Some(MockNode {
            entry: MockEntry::Dir(children),
            ..
        }) = state.nodes.get_mut(dir.as_ref())
        {
            children.push(name.to_string());
        }
    }

    /// Remove `path` (and everything below it) completely.
    pub fn remove(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        let mut state = self.lock();
        state.nodes.retain(|p, _| !p.starts_with(path));
        if let (Some(parent), Some(name)) = (path.parent(), file_name(path)) {
            if let Some(MockNode {
                entry: MockEntry::Dir(children),
                ..
            }) = state.nodes.get_mut(parent)
            {
                children.retain(|c| *c != name);
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_node(&self, path: &Path, f: impl FnOnce(&mut MockNode)) {
        let mut state = self.lock();
        if let Some(node) = state.nodes.get_mut(path) {
            f(node);
        }
    }

    fn insert(&self, path: &Path, entry: MockEntry) {
        let mut state = self.lock();
        if let Some(parent) = path.parent() {
            Self::ensure_dir_entry(&mut state, parent);
            Self::link_child(&mut state, parent, path);
        }
        let ino = Self::next_ino(&mut state);
        state.nodes.insert(
            path.to_path_buf(),
            MockNode {
                entry,
                ino,
                hide_type: false,
                open_error: None,
                lookup_error: None,
            },
        );
    }

    fn ensure_dir_entry(state: &mut MockState, path: &Path) {
        if state.nodes.contains_key(path) {
            return;
        }
        if let Some(parent) = path.parent() {
            Self::ensure_dir_entry(state, parent);
            Self::link_child(state, parent, path);
        }
        let ino = Self::next_ino(state);
        state.nodes.insert(
            path.to_path_buf(),
            MockNode {
                entry: MockEntry::Dir(Vec::new()),
                ino,
                hide_type: false,
                open_error: None,
                lookup_error: None,
            },
        );
    }

    fn link_child(state: &mut MockState, parent: &Path, child: &Path) {
        let Some(name) = file_name(child) else {
            return;
        };
        if let Some(MockNode {
            entry: MockEntry::Dir(children),
            ..
        }) = state.nodes.get_mut(parent)
        {
            if !children.contains(&name) {
                children.push(name);
            }
        }
    }

    fn next_ino(state: &mut MockState) -> u64 {
        state.next_ino += 1;
        state.next_ino
    }
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().into_owned())
}

fn entry_type(entry: &MockEntry) -> EntryType {
    match entry {
        MockEntry::File => EntryType::Regular,
        MockEntry::Dir(_) => EntryType::Directory,
        MockEntry::Symlink => EntryType::Symlink,
        MockEntry::Fifo => EntryType::Other,
    }
}

impl FileSystem for MockFileSystem {
    fn read_dir(&self, path: &Path) -> io::Result<DirListing> {
        let state = self.lock();
        let node = state
            .nodes
            .get(path)
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))?;
        if let Some(kind) = node.open_error {
            return Err(io::Error::from(kind));
        }
        let MockEntry::Dir(children) = &node.entry else {
            return Err(io::Error::from(io::ErrorKind::NotADirectory));
        };

        let entries: Vec<io::Result<DirEntry>> = children
            .iter()
            .map(|name| {
                let child = state.nodes.get(&path.join(name));
                Ok(DirEntry {
                    name: OsString::from(name),
                    ino: child.map(|c| c.ino),
                    entry_type: match child {
                        Some(c) if !c.hide_type => entry_type(&c.entry),
                        _ => EntryType::Unknown,
                    },
                })
            })
            .collect();
        Ok(Box::new(entries.into_iter()))
    }

    fn symlink_type(&self, path: &Path) -> io::Result<EntryType> {
        let state = self.lock();
        match state.nodes.get(path) {
            Some(node) => match node.lookup_error {
                Some(kind) => Err(io::Error::from(kind)),
                None => Ok(entry_type(&node.entry)),
            },
            None => Err(io::Error::from(io::ErrorKind::NotFound)),
        }
    }

    fn file_kind(&self, path: &Path) -> FileKind {
        let state = self.lock();
        match state.nodes.get(path).map(|n| &n.entry) {
            Some(MockEntry::File) => FileKind::Regular,
            Some(MockEntry::Dir(_)) => FileKind::Directory,
            _ => FileKind::Unknown,
        }
    }

    fn exists(&self, path: &Path) -> bool {
        self.lock().nodes.contains_key(path)
    }

    fn verify_readable_dir(&self, path: &Path) -> io::Result<()> {
        let state = self.lock();
        match state.nodes.get(path) {
            None => Err(io::Error::from(io::ErrorKind::NotFound)),
            Some(node) => match (&node.entry, node.open_error) {
                (_, Some(kind)) => Err(io::Error::from(kind)),
                (MockEntry::Dir(_), None) => Ok(()),
                _ => Err(io::Error::from(io::ErrorKind::NotADirectory)),
            },
        }
    }
}
