//! Fragment Cache Module
//!
//! Memoizes compiled identifier, field-list and sort-list text keyed by
//! fragment kind, language and the raw tokens. Entries never expire on their
//! own; the whole cache is cleared on every Nth maintenance tick.

use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Default number of maintenance ticks between clears.
pub const DEFAULT_CLEAR_EVERY: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FragmentKind {
    /// A single resolved column name.
    Column,
    /// A SELECT field list.
    Fields,
    /// An ORDER BY list.
    Sort,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FragmentKey {
    kind: FragmentKind,
    language: String,
    tokens: String,
}

/// Thread-safe fragment cache.
///
/// Concurrent compilations may race on the same key and compute it twice;
/// the result is identical either way.
#[derive(Debug)]
pub struct FragmentCache {
    entries: DashMap<FragmentKey, Arc<str>>,
    clear_every: u64,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl Default for FragmentCache {
    fn default() -> Self {
        Self::new(DEFAULT_CLEAR_EVERY)
    }
}

impl FragmentCache {
    /// `clear_every = 0` disables tick-driven clearing.
    pub fn new(clear_every: u64) -> Self {
        Self {
            entries: DashMap::new(),
            clear_every,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Return the cached fragment, computing and storing it on a miss.
    pub fn get_or_insert_with(
        &self,
        kind: FragmentKind,
        language: &str,
        tokens: &str,
        compute: impl FnOnce() -> String,
    ) -> Arc<str> {
        let key = FragmentKey {
            kind,
            language: language.to_string(),
            tokens: tokens.to_string(),
        };

        if let Some(entry) = self.entries.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return entry.value().clone();
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let value: Arc<str> = Arc::from(compute());
        self.entries.insert(key, value.clone());
        value
    }

    /// Drop every entry.
    pub fn invalidate(&self) {
        let count = self.entries.len();
        self.entries.clear();
        tracing::debug!("Cleared {} fragment cache entries", count);
    }

    /// Maintenance hook. Clears the cache when `counter` is a multiple of the
    /// configured period and reports whether it did.
    pub fn tick(&self, counter: u64) -> bool {
        if self.clear_every == 0 || counter % self.clear_every != 0 {
            return false;
        }
        self.invalidate();
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    /// Hit rate as a percentage
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}
