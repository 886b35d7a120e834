//! Memoized marginal likelihoods, keyed by exact member sets.
//!
//! The mixture model's marginal likelihood of a customer set depends only
//! on the observations in the set, never on the current partition, so the
//! set itself is a perfect cache key: an entry can never go stale within
//! one sweep. The sampler clears the cache at the start of each sweep; see
//! DESIGN.md for the tradeoff.

use std::collections::{BTreeSet, HashMap};

use tracing::debug;

/// Sweep-scoped memo of `members -> marginal log-likelihood`.
#[derive(Debug, Default)]
pub struct LikelihoodCache {
    entries: HashMap<BTreeSet<usize>, f64>,
    hits: u64,
    misses: u64,
}

impl LikelihoodCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached value for `members`, computing and storing it on a miss.
    pub fn get_or_insert_with<F>(&mut self, members: &BTreeSet<usize>, compute: F) -> f64
    where
        F: FnOnce() -> f64,
    {
        if let Some(&value) = self.entries.get(members) {
            self.hits += 1;
            return value;
        }
        self.misses += 1;
        let value = compute();
        self.entries.insert(members.clone(), value);
        value
    }

    /// Number of distinct member sets cached.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Lookups served from the cache since the last clear.
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Lookups that invoked the mixture model since the last clear.
    pub fn misses(&self) -> u64 {
        self.misses
    }

    /// Drop all entries and counters; called at the start of every sweep.
    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            debug!(
                entries = self.entries.len(),
                hits = self.hits,
                misses = self.misses,
                "clearing likelihood cache"
            );
        }
        self.entries.clear();
        self.hits = 0;
        self.misses = 0;
    }
}
