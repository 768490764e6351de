//! Highlight cache and in-flight bookkeeping.
//!
//! One entry per `(language, code)` pair; at most one in-flight request per
//! key; failed or unsupported keys are remembered so a throwing highlighter
//! is not re-invoked on every subsequent chunk.

use ahash::{AHashMap, AHashSet};

/// Cache key: language and code joined by NUL. The language participates
/// because highlight output is language-dependent; the code arrives with
/// its trailing newline already stripped so chunk-boundary variants of the
/// same block share an entry.
pub fn cache_key(language: &str, code: &str) -> String {
    format!("{language}\0{code}")
}

#[derive(Debug, Default)]
pub struct HighlightCache {
    ready: AHashMap<String, String>,
    failed: AHashSet<String>,
    in_flight: AHashSet<String>,
}

impl HighlightCache {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.ready.get(key).map(String::as_str)
    }

    /// Store a highlight result, stripping at most one trailing newline.
    pub fn insert(&mut self, key: String, highlighted: String) {
        let highlighted = match highlighted.strip_suffix('\n') {
            Some(stripped) => stripped.to_string(),
            None => highlighted,
        };
        self.in_flight.remove(&key);
        self.ready.insert(key, highlighted);
    }

    pub fn mark_failed(&mut self, key: String) {
        self.in_flight.remove(&key);
        self.failed.insert(key);
    }

    /// Anything already resolved, failed, or being worked on.
    pub fn is_known(&self, key: &str) -> bool {
        self.ready.contains_key(key) || self.failed.contains(key) || self.in_flight.contains(key)
    }

    pub fn begin_flight(&mut self, key: String) {
        self.in_flight.insert(key);
    }

    pub fn end_flight(&mut self, key: &str) {
        self.in_flight.remove(key);
    }

    pub fn is_in_flight(&self, key: &str) -> bool {
        self.in_flight.contains(key)
    }

    pub fn clear(&mut self) {
        self.ready.clear();
        self.failed.clear();
        self.in_flight.clear();
    }
}
