// src/config/model.rs

use std::path::PathBuf;

use serde::Deserialize;

use crate::types::WatchFlags;

/// Configuration as read from a TOML file.
///
/// ```toml
/// roots = ["/home/user/Maildir"]
/// matches = ['\.eml$']
/// ignores = ['/\.git$']
/// monitor = true
/// ```
///
/// Everything but `roots` is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub roots: Vec<PathBuf>,

    /// Regular expressions a file path must match to be reported.
    #[serde(default)]
    pub matches: Vec<String>,

    /// Regular expressions excluding files and whole subtrees.
    #[serde(default)]
    pub ignores: Vec<String>,

    /// Keep watching scanned directories for changes.
    #[serde(default)]
    pub monitor: bool,
}

/// Validated configuration. Only obtainable through `TryFrom<RawConfigFile>`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub roots: Vec<PathBuf>,
    pub matches: Vec<String>,
    pub ignores: Vec<String>,
    pub monitor: bool,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            roots: raw.roots,
            matches: raw.matches,
            ignores: raw.ignores,
            monitor: raw.monitor,
        }
    }

    pub fn flags(&self) -> WatchFlags {
        WatchFlags {
            monitor: self.monitor,
        }
    }
}
