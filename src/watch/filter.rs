// src/watch/filter.rs

//! The `matches` / `ignores` pair shared between the API, the scan worker
//! and the change dispatcher.

use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use crate::errors::Result;
use crate::watch::patterns::PatternSet;

/// Inclusion and exclusion rules for a watcher.
///
/// Each side sits behind its own lock and is swapped as a whole, so a
/// reader on another thread sees either the old or the new set. Readers
/// take a snapshot and match outside the lock.
#[derive(Debug, Default)]
pub struct PathFilter {
    matches: Mutex<Arc<PatternSet>>,
    ignores: Mutex<Arc<PatternSet>>,
}

impl PathFilter {
    pub fn new(matches: PatternSet, ignores: PatternSet) -> Self {
        Self {
            matches: Mutex::new(Arc::new(matches)),
            ignores: Mutex::new(Arc::new(ignores)),
        }
    }

    /// Whether `path` is interesting. No match rules means everything is.
    pub fn is_matched(&self, path: &Path) -> bool {
        let set = snapshot(&self.matches);
        set.is_empty() || set.matches_any(&path.to_string_lossy())
    }

    /// Whether `path` should be skipped. No ignore rules means nothing is.
    pub fn is_ignored(&self, path: &Path) -> bool {
        snapshot(&self.ignores).matches_any(&path.to_string_lossy())
    }

    /// Compile `patterns` and make them the new match rules. On error the
    /// current rules stay in place.
    pub fn set_matches<S: AsRef<str>>(&self, patterns: &[S]) -> Result<()> {
        let set = PatternSet::compile(patterns)?;
        debug!(patterns = ?set, "replacing match patterns");
        swap(&self.matches, set);
        Ok(())
    }

    /// Compile `patterns` and make them the new ignore rules. On error the
    /// current rules stay in place.
    pub fn set_ignores<S: AsRef<str>>(&self, patterns: &[S]) -> Result<()> {
        let set = PatternSet::compile(patterns)?;
        debug!(patterns = ?set, "replacing ignore patterns");
        swap(&self.ignores, set);
        Ok(())
    }

    pub fn matches(&self) -> Vec<String> {
        snapshot(&self.matches).to_strings()
    }

    pub fn ignores(&self) -> Vec<String> {
        snapshot(&self.ignores).to_strings()
    }
}

fn snapshot(slot: &Mutex<Arc<PatternSet>>) -> Arc<PatternSet> {
    Arc::clone(&slot.lock().unwrap_or_else(PoisonError::into_inner))
}

fn swap(slot: &Mutex<Arc<PatternSet>>, set: PatternSet) {
    *slot.lock().unwrap_or_else(PoisonError::into_inner) = Arc::new(set);
}
