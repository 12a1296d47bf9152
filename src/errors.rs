// src/errors.rs

//! Crate-wide error type and helpers.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WatcherError {
    #[error("invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("not found: {0:?}")]
    NotFound(PathBuf),

    #[error("permission denied: {0:?}")]
    PermissionDenied(PathBuf),

    #[error("not a directory: {0:?}")]
    NotDirectory(PathBuf),

    #[error("path too long: {0:?}")]
    PathTooLong(PathBuf),

    #[error("cannot access {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to monitor {path:?}: {source}")]
    Monitor {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    #[error("already scanning")]
    Busy,

    #[error("scan cancelled")]
    Cancelled,

    #[error("at least one root directory is required")]
    NoRoots,

    #[error("scanning requires a Tokio runtime: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl WatcherError {
    /// Classify an OS error that occurred while touching `path`.
    pub fn from_io(path: impl AsRef<Path>, err: io::Error) -> Self {
        let path = path.as_ref().to_path_buf();
        match err.kind() {
            io::ErrorKind::NotFound => WatcherError::NotFound(path),
            io::ErrorKind::PermissionDenied => WatcherError::PermissionDenied(path),
            io::ErrorKind::NotADirectory => WatcherError::NotDirectory(path),
            _ => WatcherError::Io { path, source: err },
        }
    }

    /// True for the cooperative cancellation outcome of a scan.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, WatcherError::Cancelled)
    }

    /// The path involved in a filesystem failure, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            WatcherError::NotFound(p)
            | WatcherError::PermissionDenied(p)
            | WatcherError::NotDirectory(p)
            | WatcherError::PathTooLong(p) => Some(p),
            WatcherError::Io { path, .. } | WatcherError::Monitor { path, .. } => Some(path),
            _ => None,
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, WatcherError>;
