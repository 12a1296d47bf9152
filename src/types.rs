// src/types.rs

use std::fmt;

/// Longest path (in bytes) the scanner will construct.
#[cfg(target_os = "linux")]
pub const PATH_MAX: usize = 4096;
#[cfg(all(unix, not(target_os = "linux")))]
pub const PATH_MAX: usize = 1024;
#[cfg(not(unix))]
pub const PATH_MAX: usize = 260;

/// What happened to a path.
///
/// - `Created`: the path appeared (every entry found by a scan is reported
///   as created, since it is new from the scanner's point of view).
/// - `Deleted`: the path is gone.
/// - `Changed`: the contents of the path changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Created,
    Deleted,
    Changed,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EventKind::Created => "created",
            EventKind::Deleted => "deleted",
            EventKind::Changed => "changed",
        };
        f.write_str(s)
    }
}

/// Type of the file an event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    Regular,
    Directory,
    Unknown,
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FileKind::Regular => "file",
            FileKind::Directory => "dir",
            FileKind::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Flags that influence watcher behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WatchFlags {
    /// Install a change monitor on every interesting directory found while
    /// scanning (and on directories created later).
    pub monitor: bool,
}

impl WatchFlags {
    pub const NONE: WatchFlags = WatchFlags { monitor: false };
    pub const MONITOR: WatchFlags = WatchFlags { monitor: true };
}
