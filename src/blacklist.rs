//! Library-name blacklist.
//!
//! Libraries assumed present on every target system (libc, the loader,
//! pthreads and friends) must not be packed into the bundle. The patterns
//! are matched as substrings anywhere in the resolved name, exactly like
//! the ldd output they are scraped from.

use anyhow::{Context, Result};
use regex::Regex;
use std::collections::BTreeSet;
use tracing::debug;

/// A compiled set of exclusion patterns.
///
/// Patterns are joined into a single alternation and searched case
/// sensitively anywhere within each library name. They are intentionally
/// not escaped, so regex metacharacters keep their meaning (`libc.so`
/// matches `libc.so.6` and would also match `libcXso`).
#[derive(Debug, Clone)]
pub struct Blacklist {
    // None when no patterns were given: an empty alternation would match
    // every string, but an empty blacklist must exclude nothing.
    pattern: Option<Regex>,
}

impl Blacklist {
    /// Compile `patterns` into a blacklist.
    pub fn new(patterns: &[impl AsRef<str>]) -> Result<Self> {
        if patterns.is_empty() {
            return Ok(Self { pattern: None });
        }
        let parts: Vec<&str> = patterns.iter().map(|p| p.as_ref()).collect();
        let joined = parts.join("|");
        let pattern = Regex::new(&joined)
            .with_context(|| format!("Invalid blacklist pattern: {joined}"))?;
        debug!("blacklist pattern: {pattern}");
        Ok(Self {
            pattern: Some(pattern),
        })
    }

    /// An empty blacklist that excludes nothing.
    pub fn empty() -> Self {
        Self { pattern: None }
    }

    /// Whether `library` matches any exclusion pattern.
    pub fn is_excluded(&self, library: &str) -> bool {
        match &self.pattern {
            Some(pattern) => pattern.is_match(library),
            None => false,
        }
    }

    /// Return the subset of `libraries` that survive the blacklist.
    pub fn filter(&self, libraries: BTreeSet<String>) -> BTreeSet<String> {
        libraries
            .into_iter()
            .filter(|lib| {
                if self.is_excluded(lib) {
                    debug!("blacklisted: {lib}");
                    false
                } else {
                    true
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_filter_removes_matching_names() {
        let blacklist = Blacklist::new(&["libc.so"]).unwrap();
        let filtered = blacklist.filter(set(&["/lib/libc.so.6", "/lib/libbz2.so.1"]));
        assert_eq!(filtered, set(&["/lib/libbz2.so.1"]));
    }

    #[test]
    fn test_substring_match_anywhere() {
        let blacklist = Blacklist::new(&["ld-linux-x86-64"]).unwrap();
        assert!(blacklist.is_excluded("/lib64/ld-linux-x86-64.so.2"));
        assert!(!blacklist.is_excluded("/lib/libbz2.so.1"));
    }

    #[test]
    fn test_empty_blacklist_excludes_nothing() {
        let blacklist = Blacklist::empty();
        let names = set(&["/lib/libc.so.6", "/lib/libbz2.so.1"]);
        assert_eq!(blacklist.filter(names.clone()), names);
    }

    #[test]
    fn test_alternation_across_patterns() {
        let blacklist = Blacklist::new(&["libpthread.so", "librt.so"]).unwrap();
        assert!(blacklist.is_excluded("/lib/libpthread.so.0"));
        assert!(blacklist.is_excluded("/lib/librt.so.1"));
        assert!(!blacklist.is_excluded("/lib/libssl.so.3"));
    }

    #[test]
    fn test_patterns_are_not_escaped() {
        // '.' stays a regex wildcard, documented source behavior
        let blacklist = Blacklist::new(&["libm.so"]).unwrap();
        assert!(blacklist.is_excluded("/lib/libmXso.1"));
    }

    #[test]
    fn test_invalid_pattern_is_an_error() {
        assert!(Blacklist::new(&["("]).is_err());
    }
}
