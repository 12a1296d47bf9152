// src/watch/patterns.rs

use std::fmt;

use regex::Regex;

use crate::errors::{Result, WatcherError};

/// Ordered set of compiled regular expressions, matched against full
/// path strings.
///
/// The set carries no policy about emptiness: an empty set matches
/// nothing. Callers that want "empty means everything" (the `matches`
/// side of a watcher) decide that themselves, see
/// [`PathFilter`](crate::watch::filter::PathFilter).
#[derive(Clone, Default)]
pub struct PatternSet {
    rules: Vec<Regex>,
}

impl fmt::Debug for PatternSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.rules.iter().map(Regex::as_str))
            .finish()
    }
}

impl PatternSet {
    /// Compile every pattern, in order. The first invalid pattern aborts
    /// compilation and nothing of the partial set survives.
    pub fn compile<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rules = patterns
            .into_iter()
            .map(|pat| {
                let pat = pat.as_ref();
                Regex::new(pat).map_err(|source| WatcherError::InvalidPattern {
                    pattern: pat.to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    /// True if at least one rule matches somewhere in `path`.
    pub fn matches_any(&self, path: &str) -> bool {
        self.rules.iter().any(|rx| rx.is_match(path))
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// The source patterns, in the order they were given.
    pub fn to_strings(&self) -> Vec<String> {
        self.rules.iter().map(|rx| rx.as_str().to_string()).collect()
    }
}
