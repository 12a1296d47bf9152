// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, WatcherError};
use crate::watch::patterns::PatternSet;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = WatcherError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_roots(cfg)?;
    validate_patterns("matches", &cfg.matches)?;
    validate_patterns("ignores", &cfg.ignores)?;
    Ok(())
}

fn ensure_has_roots(cfg: &RawConfigFile) -> Result<()> {
    if cfg.roots.is_empty() {
        return Err(WatcherError::ConfigError(
            "config must list at least one directory in `roots`".to_string(),
        ));
    }
    if let Some(empty) = cfg.roots.iter().position(|r| r.as_os_str().is_empty()) {
        return Err(WatcherError::ConfigError(format!(
            "`roots` entry {empty} is empty"
        )));
    }
    Ok(())
}

fn validate_patterns(field: &str, patterns: &[String]) -> Result<()> {
    PatternSet::compile(patterns).map_err(|err| match err {
        WatcherError::InvalidPattern { pattern, source } => {
            WatcherError::ConfigError(format!("invalid pattern '{pattern}' in `{field}`: {source}"))
        }
        other => other,
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn raw(roots: &[&str], matches: &[&str], ignores: &[&str]) -> RawConfigFile {
        RawConfigFile {
            roots: roots.iter().map(PathBuf::from).collect(),
            matches: matches.iter().map(|s| s.to_string()).collect(),
            ignores: ignores.iter().map(|s| s.to_string()).collect(),
            monitor: false,
        }
    }

    #[test]
    fn valid_config_passes() {
        let cfg = ConfigFile::try_from(raw(&["/tree1"], &[r"\.foo$"], &["dir1"])).unwrap();
        assert_eq!(cfg.roots, vec![PathBuf::from("/tree1")]);
        assert!(!cfg.flags().monitor);
    }

    #[test]
    fn missing_roots_are_rejected() {
        let err = ConfigFile::try_from(raw(&[], &[], &[])).unwrap_err();
        assert!(matches!(err, WatcherError::ConfigError(msg) if msg.contains("roots")));
    }

    #[test]
    fn bad_patterns_name_the_field() {
        let err = ConfigFile::try_from(raw(&["/t"], &[], &["(unclosed"])).unwrap_err();
        match err {
            WatcherError::ConfigError(msg) => {
                assert!(msg.contains("`ignores`"), "{msg}");
                assert!(msg.contains("(unclosed"), "{msg}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
