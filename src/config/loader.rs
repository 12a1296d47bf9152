// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, WatcherError};

/// Load a configuration file and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization. Use [`load_and_validate`] for
/// the checked form.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|e| WatcherError::from_io(path, e))?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file and validate it.
///
/// Relative roots are taken relative to the directory holding the file.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    let mut raw_config = load_from_path(path)?;

    let base = config_dir(path);
    for root in raw_config.roots.iter_mut() {
        if root.is_relative() && !root.as_os_str().is_empty() {
            *root = base.join(&*root);
        }
    }

    let config = ConfigFile::try_from(raw_config)?;
    debug!(?path, roots = ?config.roots, "loaded config");
    Ok(config)
}

/// `Dirwatcher.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Dirwatcher.toml")
}

fn config_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
