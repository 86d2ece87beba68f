//! Cache statistics tracking.

/// Counters for one cache tier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TileCacheStats {
    pub hits: u64,
    pub misses: u64,
    pub writes: u64,
    pub write_failures: u64,
    pub evictions: u64,
    pub entry_count: usize,
}

impl TileCacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hit rate of `get` calls (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_write(&mut self) {
        self.writes += 1;
    }

    pub fn record_write_failure(&mut self) {
        self.write_failures += 1;
    }

    pub fn record_evictions(&mut self, count: u64) {
        self.evictions += count;
    }

    pub fn update_entry_count(&mut self, count: usize) {
        self.entry_count = count;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate_empty() {
        assert_eq!(TileCacheStats::new().hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate() {
        let mut stats = TileCacheStats::new();
        stats.record_hit();
        stats.record_hit();
        stats.record_hit();
        stats.record_miss();
        assert_eq!(stats.hit_rate(), 0.75);
    }

    #[test]
    fn test_counters() {
        let mut stats = TileCacheStats::new();
        stats.record_write();
        stats.record_write_failure();
        stats.record_evictions(3);
        stats.update_entry_count(7);
        assert_eq!(stats.writes, 1);
        assert_eq!(stats.write_failures, 1);
        assert_eq!(stats.evictions, 3);
        assert_eq!(stats.entry_count, 7);
    }
}
