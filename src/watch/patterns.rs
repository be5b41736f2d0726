// src/watch/patterns.rs

use regex::Regex;

use crate::config::WatchSpec;

/// Compiled form of a single user pattern.
///
/// A pattern is interpreted as one of:
/// - blank → matches nothing;
/// - containing `*` → a glob: every regex metacharacter except `*` is
///   escaped, then `*` widens to `.*`;
/// - anything else → tried as a raw regular expression, falling back to a
///   fully-escaped literal when it does not compile.
///
/// Matching is unanchored substring matching against forward-slash paths
/// relative to the watch root. Note that the glob translation deliberately
/// lets `*` cross `/`: `src/*.js` matches `src/sub/x.js`.
#[derive(Debug, Clone)]
pub struct Matcher {
    regex: Option<Regex>,
}

impl Matcher {
    pub fn compile(pattern: &str) -> Self {
        let pattern = pattern.trim();
        if pattern.is_empty() {
            return Self { regex: None };
        }
        let regex = if pattern.contains('*') {
            Regex::new(&glob_to_regex(pattern)).ok()
        } else {
            Regex::new(pattern)
                .ok()
                .or_else(|| Regex::new(&regex::escape(pattern)).ok())
        };
        Self { regex }
    }

    pub fn is_match(&self, rel_path: &str) -> bool {
        self.regex.as_ref().is_some_and(|re| re.is_match(rel_path))
    }
}

/// Escape everything, then re-widen the stars.
fn glob_to_regex(pattern: &str) -> String {
    regex::escape(pattern).replace(r"\*", ".*")
}

/// Combined watch/ignore decision for one effective configuration.
///
/// Ignoring always wins: a path matching both lists is rejected. The
/// wildcard-all watch spec bypasses watch filtering entirely.
#[derive(Debug, Clone)]
pub struct PathFilter {
    /// `None` is the wildcard-all sentinel.
    watch: Option<Vec<Matcher>>,
    ignore: Vec<Matcher>,
}

impl PathFilter {
    pub fn new(watch: &WatchSpec, ignore: &[String]) -> Self {
        let watch = match watch {
            WatchSpec::All => None,
            WatchSpec::Patterns(patterns) => {
                Some(patterns.iter().map(|p| Matcher::compile(p)).collect())
            }
        };
        let ignore = ignore.iter().map(|p| Matcher::compile(p)).collect();
        Self { watch, ignore }
    }

    pub fn accepts(&self, rel_path: &str) -> bool {
        if self.ignore.iter().any(|m| m.is_match(rel_path)) {
            return false;
        }
        match &self.watch {
            None => true,
            Some(matchers) => matchers.iter().any(|m| m.is_match(rel_path)),
        }
    }
}
