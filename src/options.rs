//! Tunables shared by the parser and the pruning engine.

/// Number of compiled patterns a [`crate::matching::RegexCache`] keeps by default.
pub const DEFAULT_REGEX_CACHE_CAPACITY: usize = 64;

/// Annotation prefix used to record the source indices of pruned collections.
pub const DEFAULT_PROVENANCE_PREFIX: &str = "$indices:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Upper bound on cached compiled regexes; `0` disables caching.
    pub regex_cache_capacity: usize,

    /// Prefix of the provenance annotation added to pruned lists and sexps.
    pub provenance_prefix: String,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            regex_cache_capacity: DEFAULT_REGEX_CACHE_CAPACITY,
            provenance_prefix: DEFAULT_PROVENANCE_PREFIX.to_string(),
        }
    }
}

impl Options {
    pub fn with_regex_cache_capacity(mut self, capacity: usize) -> Self {
        self.regex_cache_capacity = capacity;
        self
    }

    pub fn with_provenance_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.provenance_prefix = prefix.into();
        self
    }
}
