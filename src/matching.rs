//! Bounded cache of compiled regular expressions.
//!
//! Every string-matching node built by one [`crate::parser::Parser`] shares
//! the parser's cache, so a pattern computed at evaluation time is compiled
//! once per distinct text. The cache is safe to share between threads;
//! concurrent callers for the same pattern always observe equivalent
//! compiled regexes.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, PoisonError};

use regex::Regex;

use crate::error::EvalError;
use crate::options::DEFAULT_REGEX_CACHE_CAPACITY;

pub struct RegexCache {
    capacity: usize,
    state: Mutex<CacheState>,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    clock: u64,
}

struct CacheEntry {
    regex: Regex,
    last_used: u64,
}

impl RegexCache {
    /// A cache holding at most `capacity` patterns; `0` compiles every time.
    pub fn new(capacity: usize) -> Self {
        RegexCache {
            capacity,
            state: Mutex::new(CacheState::default()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Compiled regex for `pattern`, compiling and caching it on first use.
    ///
    /// When the cache is full the least recently used pattern is evicted.
    pub fn get_or_compile(&self, pattern: &str) -> Result<Regex, EvalError> {
        {
            let mut state = self.lock();
            state.clock += 1;
            let now = state.clock;
            if let Some(entry) = state.entries.get_mut(pattern) {
                entry.last_used = now;
                return Ok(entry.regex.clone());
            }
        }

        // Compile outside the lock; a racing caller may compile the same
        // pattern, and whichever insert lands last wins with an equal regex.
        let regex = Regex::new(pattern).map_err(|err| EvalError::InvalidPattern {
            pattern: pattern.to_string(),
            message: err.to_string(),
        })?;
        log::debug!("compiled pattern {pattern:?}");

        if self.capacity == 0 {
            return Ok(regex);
        }

        let mut state = self.lock();
        if !state.entries.contains_key(pattern) && state.entries.len() >= self.capacity {
            let oldest = state
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(key, _)| key.clone());
            if let Some(oldest) = oldest {
                state.entries.remove(&oldest);
                log::debug!("evicted pattern {oldest:?}");
            }
        }
        state.clock += 1;
        let last_used = state.clock;
        state.entries.insert(
            pattern.to_string(),
            CacheEntry {
                regex: regex.clone(),
                last_used,
            },
        );
        Ok(regex)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for RegexCache {
    fn default() -> Self {
        RegexCache::new(DEFAULT_REGEX_CACHE_CAPACITY)
    }
}

impl fmt::Debug for RegexCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegexCache")
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn reuses_compiled_patterns() {
        let cache = RegexCache::new(4);
        let first = cache.get_or_compile("^a+$").unwrap();
        let second = cache.get_or_compile("^a+$").unwrap();
        assert_eq!(first.as_str(), second.as_str());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn evicts_least_recently_used() {
        let cache = RegexCache::new(2);
        cache.get_or_compile("a").unwrap();
        cache.get_or_compile("b").unwrap();
        cache.get_or_compile("a").unwrap();
        cache.get_or_compile("c").unwrap();
        assert_eq!(cache.len(), 2);
        let state = cache.lock();
        assert!(state.entries.contains_key("a"));
        assert!(state.entries.contains_key("c"));
        assert!(!state.entries.contains_key("b"));
    }

    #[test]
    fn zero_capacity_never_stores() {
        let cache = RegexCache::new(0);
        assert!(cache.get_or_compile("x").unwrap().is_match("x"));
        assert!(cache.is_empty());
    }

    #[test]
    fn invalid_patterns_are_reported() {
        let cache = RegexCache::default();
        let err = cache.get_or_compile("(unclosed").unwrap_err();
        assert!(matches!(err, EvalError::InvalidPattern { .. }));
        assert!(cache.is_empty());
    }

    #[test]
    fn concurrent_callers_agree() {
        let cache = Arc::new(RegexCache::new(8));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    let pattern = format!("^item{}$", i % 3);
                    let regex = cache.get_or_compile(&pattern).unwrap();
                    (pattern, regex.as_str().to_string())
                })
            })
            .collect();
        for handle in handles {
            let (pattern, compiled) = handle.join().unwrap();
            assert_eq!(pattern, compiled);
        }
        assert_eq!(cache.len(), 3);
    }
}
