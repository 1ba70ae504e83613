//! Produce configuration

use serde::{Deserialize, Serialize};

/// Configuration for a [`Producer`](crate::Producer)
///
/// The defaults follow dynamic-host semantics: mismatched keys are coerced
/// (`Index(0)` on a record is the field `"0"`), and sequence writes must
/// stay contiguous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProduceConfig {
    /// Reject mismatched key kinds instead of coercing them
    pub strict_keys: bool,
    /// Allow writes past the end of a sequence, filling the gap with null
    pub allow_sparse_writes: bool,
    /// Largest number of nulls a single sparse write may pad with
    pub max_sparse_gap: usize,
}

impl Default for ProduceConfig {
    fn default() -> Self {
        Self {
            strict_keys: false,
            allow_sparse_writes: false,
            max_sparse_gap: Self::DEFAULT_MAX_SPARSE_GAP,
        }
    }
}

impl ProduceConfig {
    /// Default bound on padding per sparse write
    pub const DEFAULT_MAX_SPARSE_GAP: usize = 1024;

    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With strict key handling
    #[inline]
    #[must_use]
    pub fn with_strict_keys(mut self, strict: bool) -> Self {
        self.strict_keys = strict;
        self
    }

    /// With sparse sequence writes
    #[inline]
    #[must_use]
    pub fn with_sparse_writes(mut self, allow: bool) -> Self {
        self.allow_sparse_writes = allow;
        self
    }

    /// With a bound on sparse write padding
    #[inline]
    #[must_use]
    pub fn with_max_sparse_gap(mut self, max: usize) -> Self {
        self.max_sparse_gap = max;
        self
    }

    /// Whether a write at `index` into a sequence of `len` entries is allowed
    #[must_use]
    pub fn permits_index(&self, index: usize, len: usize) -> bool {
        index <= len || (self.allow_sparse_writes && index - len <= self.max_sparse_gap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_lenient_keys_dense_sequences() {
        let config = ProduceConfig::new();
        assert!(!config.strict_keys);
        assert!(!config.allow_sparse_writes);
        assert_eq!(config.max_sparse_gap, ProduceConfig::DEFAULT_MAX_SPARSE_GAP);
    }

    #[test]
    fn sparse_gap_is_bounded() {
        let dense = ProduceConfig::new();
        assert!(dense.permits_index(3, 3));
        assert!(!dense.permits_index(4, 3));

        let sparse = ProduceConfig::new()
            .with_sparse_writes(true)
            .with_max_sparse_gap(2);
        assert!(sparse.permits_index(5, 3));
        assert!(!sparse.permits_index(6, 3));
        assert!(!sparse.permits_index(usize::MAX, 0));
    }

    #[test]
    fn builder_sets_flags() {
        let config = ProduceConfig::new()
            .with_strict_keys(true)
            .with_sparse_writes(true);
        assert!(config.strict_keys);
        assert!(config.allow_sparse_writes);
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: ProduceConfig = serde_json::from_str(r#"{"strict_keys":true}"#).unwrap();
        assert_eq!(config, ProduceConfig::new().with_strict_keys(true));
        assert_eq!(config.max_sparse_gap, ProduceConfig::DEFAULT_MAX_SPARSE_GAP);
    }
}
