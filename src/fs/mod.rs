// src/fs/mod.rs

use std::ffi::OsString;
use std::fmt::Debug;
use std::fs;
use std::io;
use std::path::Path;

use crate::types::FileKind;

pub mod mock;

/// Type of a directory entry as far as the scanner cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryType {
    Regular,
    Directory,
    Symlink,
    /// Sockets, fifos, devices.
    Other,
    /// The listing did not say; the caller has to look the path up.
    Unknown,
}

impl From<fs::FileType> for EntryType {
    fn from(ft: fs::FileType) -> Self {
        if ft.is_symlink() {
            EntryType::Symlink
        } else if ft.is_dir() {
            EntryType::Directory
        } else if ft.is_file() {
            EntryType::Regular
        } else {
            EntryType::Other
        }
    }
}

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// File name relative to the listed directory.
    pub name: OsString,
    /// On-disk identity (inode number) where the platform exposes it.
    pub ino: Option<u64>,
    /// Type hint from the listing itself.
    pub entry_type: EntryType,
}

/// Lazily produced entries of an opened directory.
pub type DirListing = Box<dyn Iterator<Item = io::Result<DirEntry>> + Send>;

/// Abstract filesystem interface used by the scanner, the monitor registry
/// and the change dispatcher.
pub trait FileSystem: Send + Sync + Debug {
    /// Open `path` for listing. Opening errors are returned immediately;
    /// listing errors are yielded by the iterator.
    fn read_dir(&self, path: &Path) -> io::Result<DirListing>;

    /// Classify `path` without following symlinks. This is the slow path
    /// used when a listing reports [`EntryType::Unknown`].
    fn symlink_type(&self, path: &Path) -> io::Result<EntryType>;

    /// Best-effort type of `path`, following symlinks.
    fn file_kind(&self, path: &Path) -> FileKind;

    /// Whether anything (including a dangling symlink) exists at `path`.
    fn exists(&self, path: &Path) -> bool;

    /// Succeeds if `path` exists, is a directory and can be opened for
    /// listing.
    fn verify_readable_dir(&self, path: &Path) -> io::Result<()>;
}

/// Implementation that uses `std::fs`.
#[derive(Debug, Clone, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_dir(&self, path: &Path) -> io::Result<DirListing> {
        let listing = fs::read_dir(path)?;
        Ok(Box::new(listing.map(|res| res.map(|entry| to_dir_entry(&entry)))))
    }

    fn symlink_type(&self, path: &Path) -> io::Result<EntryType> {
        fs::symlink_metadata(path).map(|m| m.file_type().into())
    }

    fn file_kind(&self, path: &Path) -> FileKind {
        match fs::metadata(path) {
            Ok(m) if m.is_dir() => FileKind::Directory,
            Ok(m) if m.is_file() => FileKind::Regular,
            _ => FileKind::Unknown,
        }
    }

    fn exists(&self, path: &Path) -> bool {
        fs::symlink_metadata(path).is_ok()
    }

    fn verify_readable_dir(&self, path: &Path) -> io::Result<()> {
        if !fs::metadata(path)?.is_dir() {
            return Err(io::Error::from(io::ErrorKind::NotADirectory));
        }
        fs::read_dir(path).map(|_| ())
    }
}

fn to_dir_entry(entry: &fs::DirEntry) -> DirEntry {
    DirEntry {
        name: entry.file_name(),
        ino: inode_of(entry),
        // `file_type` already falls back to lstat on filesystems that do not
        // fill in d_type; an error here means that lookup failed too.
        entry_type: entry
            .file_type()
            .map(EntryType::from)
            .unwrap_or(EntryType::Unknown),
    }
}

#[cfg(unix)]
fn inode_of(entry: &fs::DirEntry) -> Option<u64> {
    use std::os::unix::fs::DirEntryExt;
    Some(entry.ino())
}

#[cfg(not(unix))]
fn inode_of(_entry: &fs::DirEntry) -> Option<u64> {
    None
}
