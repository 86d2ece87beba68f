//! Recency index shared by the cache tiers.
//!
//! Every tracked fingerprint carries a logical access tick. A second map
//! ordered by tick makes finding the least recently used entry O(log n)
//! instead of a scan over the whole cache.
//!
//! The index only tracks recency; callers own the cached data and must keep
//! it in step with `record`, `remove` and `pop_oldest`.

use crate::tile::Fingerprint;
use std::collections::{BTreeMap, HashMap};

/// Ordered least-recently-used index of cache keys.
#[derive(Debug, Default)]
pub(crate) struct LruIndex {
    /// Fingerprint to its latest access tick
    ticks: HashMap<Fingerprint, u64>,
    /// Access tick to fingerprint, oldest first
    order: BTreeMap<u64, Fingerprint>,
    clock: u64,
}

impl LruIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    pub fn contains(&self, key: &Fingerprint) -> bool {
        self.ticks.contains_key(key)
    }

    /// Insert `key` as the most recently used entry, or move it there.
    pub fn record(&mut self, key: Fingerprint) {
        self.clock += 1;
        if let Some(previous) = self.ticks.insert(key, self.clock) {
            self.order.remove(&previous);
        }
        self.order.insert(self.clock, key);
    }

    /// Mark an existing entry as most recently used.
    ///
    /// Returns `false` (and tracks nothing) if `key` is not indexed.
    pub fn touch(&mut self, key: &Fingerprint) -> bool {
        if !self.contains(key) {
            return false;
        }
        self.record(*key);
        true
    }

    /// Stop tracking `key`. Returns whether it was tracked.
    pub fn remove(&mut self, key: &Fingerprint) -> bool {
        match self.ticks.remove(key) {
            Some(tick) => {
                self.order.remove(&tick);
                true
            }
            None => false,
        }
    }

    /// Remove and return the least recently used key.
    pub fn pop_oldest(&mut self) -> Option<Fingerprint> {
        let (_, key) = self.order.pop_first()?;
        self.ticks.remove(&key);
        Some(key)
    }

    /// Keep only the keys for which `keep` returns true.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&Fingerprint) -> bool,
    {
        let ticks = &mut self.ticks;
        self.order.retain(|_, key| {
            let kept = keep(key);
            if !kept {
                ticks.remove(key);
            }
            kept
        });
    }

    pub fn clear(&mut self) {
        self.ticks.clear();
        self.order.clear();
    }
}
