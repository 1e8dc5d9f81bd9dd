//! Time-bounded memoisation of engine output.
//!
//! The cache is an explicit value owned by whoever builds it (usually the CLI,
//! wrapping a [`ProcessEngine`](crate::engine::ProcessEngine) in a
//! [`CachedEngine`]). There is no process-wide state.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::domain::Dataset;
use crate::engine::Engine;
use crate::error::EngineError;
use crate::input::InputDocument;

#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    /// `None` when `ttl` reaches past any representable instant.
    pub expires_at: Option<Instant>,
    /// Insertion counter; lower means older.
    pub sequence: u64,
}

impl<V> CacheEntry<V> {
    pub fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// Picks which entry to drop when a full cache receives a new key.
pub trait EvictionPolicy {
    fn victim<K: Clone, V>(&self, entries: &HashMap<K, CacheEntry<V>>, now: Instant) -> Option<K>;
}

/// Drop the oldest expired entry if there is one, else the oldest entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpiredThenOldest;

impl EvictionPolicy for ExpiredThenOldest {
    fn victim<K: Clone, V>(&self, entries: &HashMap<K, CacheEntry<V>>, now: Instant) -> Option<K> {
        let oldest_expired = entries
            .iter()
            .filter(|(_, e)| e.is_expired(now))
            .min_by_key(|(_, e)| e.sequence);
        oldest_expired
            .or_else(|| entries.iter().min_by_key(|(_, e)| e.sequence))
            .map(|(k, _)| k.clone())
    }
}

/// Bounded map whose entries expire `ttl` after insertion.
#[derive(Debug)]
pub struct TtlCache<K, V, P = ExpiredThenOldest> {
    entries: HashMap<K, CacheEntry<V>>,
    ttl: Duration,
    capacity: usize,
    next_sequence: u64,
    policy: P,
}

impl<K: Eq + Hash + Clone, V> TtlCache<K, V, ExpiredThenOldest> {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self::with_policy(ttl, capacity, ExpiredThenOldest)
    }
}

impl<K: Eq + Hash + Clone, V, P: EvictionPolicy> TtlCache<K, V, P> {
    pub fn with_policy(ttl: Duration, capacity: usize, policy: P) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
            capacity,
            next_sequence: 0,
            policy,
        }
    }

    /// Live value for `key`. An expired entry is removed and reported as a miss.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let now = Instant::now();
        if self.entries.get(key).is_some_and(|e| e.is_expired(now)) {
            self.entries.remove(key);
            return None;
        }
        self.entries.get(key).map(|e| &e.value)
    }

    pub fn put(&mut self, key: K, value: V) {
        if self.capacity == 0 {
            return;
        }
        let now = Instant::now();
        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            if let Some(victim) = self.policy.victim(&self.entries, now) {
                self.entries.remove(&victim);
            }
        }
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.entries.insert(
            key,
            CacheEntry {
                value,
                expires_at: now.checked_add(self.ttl),
                sequence,
            },
        );
    }

    /// Remove every expired entry; returns how many were dropped.
    pub fn purge_expired(&mut self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, e| !e.is_expired(now));
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

type CacheKey = (String, Dataset);

/// Engine wrapper that reuses output for identical (document, dataset) pairs.
///
/// Only successful runs are stored; failures always reach the inner engine
/// again.
pub struct CachedEngine<E> {
    inner: E,
    cache: Mutex<TtlCache<CacheKey, String>>,
}

impl<E: Engine> CachedEngine<E> {
    pub fn new(inner: E, ttl: Duration, capacity: usize) -> Self {
        Self {
            inner,
            cache: Mutex::new(TtlCache::new(ttl, capacity)),
        }
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }

    fn lookup(&self, key: &CacheKey) -> Option<String> {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        cache.get(key).cloned()
    }
}

impl<E: Engine> Engine for CachedEngine<E> {
    fn evaluate(&self, document: &InputDocument, dataset: Dataset) -> Result<String, EngineError> {
        let key = (document.as_str().to_string(), dataset);
        if let Some(hit) = self.lookup(&key) {
            log::trace!("engine cache hit for {}", dataset.as_str());
            return Ok(hit);
        }

        // The lock is not held across the engine call, so concurrent misses on
        // the same key may both run the engine. The later write wins.
        let output = self.inner.evaluate(document, dataset)?;
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .put(key, output.clone());
        Ok(output)
    }
}
