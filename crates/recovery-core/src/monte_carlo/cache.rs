//! Content-addressed cache of simulated samples.
//!
//! The simulators stay pure; this wrapper sits in front of them and maps a
//! BLAKE3 digest of `(positions, scale, trial_count, seed)` to a finished
//! sample. Only seeded runs are cacheable: an unseeded run is a fresh draw
//! every time.
//!
//! The cache lives as long as its owner. It holds at most `capacity`
//! samples and evicts the oldest insertion first.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::monte_carlo::simulation::{simulate_partitioned, SimulationSample};
use crate::portfolio::Portfolio;
use crate::RecoveryResult;

/// Digest identifying one seeded simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SimulationKey([u8; 32]);

impl SimulationKey {
    pub fn new(portfolio: &Portfolio, trial_count: u32, seed: u64) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&(portfolio.len() as u64).to_le_bytes());
        for p in portfolio.positions() {
            hasher.update(&p.recovery_probability.to_bits().to_le_bytes());
            hasher.update(&p.face_value.to_bits().to_le_bytes());
        }
        hasher.update(&portfolio.face_value_scale().to_bits().to_le_bytes());
        hasher.update(&trial_count.to_le_bytes());
        hasher.update(&seed.to_le_bytes());
        Self(*hasher.finalize().as_bytes())
    }

    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl fmt::Display for SimulationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Hit/miss counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Samples kept by [`SimulationCache::new`].
pub const DEFAULT_CACHE_CAPACITY: usize = 64;

/// In-memory sample cache with insertion-order eviction.
#[derive(Debug)]
pub struct SimulationCache {
    entries: HashMap<SimulationKey, Arc<SimulationSample>>,
    order: VecDeque<SimulationKey>,
    capacity: usize,
    stats: CacheStats,
}

impl Default for SimulationCache {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulationCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }

    /// A cache holding at most `capacity` samples (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            capacity: capacity.max(1),
            stats: CacheStats::default(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn get(&self, key: &SimulationKey) -> Option<Arc<SimulationSample>> {
        self.entries.get(key).cloned()
    }

    pub fn insert(&mut self, key: SimulationKey, sample: SimulationSample) -> Arc<SimulationSample> {
        let sample = Arc::new(sample);
        if self.entries.insert(key, Arc::clone(&sample)).is_none() {
            self.order.push_back(key);
        }
        while self.entries.len() > self.capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            self.entries.remove(&oldest);
            debug!(key = %oldest, "simulation cache eviction");
        }
        sample
    }

    pub fn contains(&self, key: &SimulationKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Return the cached sample for a seeded run, simulating on a miss.
    /// `seed = None` always simulates and never stores.
    pub fn get_or_simulate(
        &mut self,
        portfolio: &Portfolio,
        trial_count: u32,
        seed: Option<u64>,
    ) -> RecoveryResult<Arc<SimulationSample>> {
        let Some(seed) = seed else {
            let fresh = simulate_partitioned(portfolio, trial_count, rand::random())?;
            return Ok(Arc::new(fresh));
        };

        let key = SimulationKey::new(portfolio, trial_count, seed);
        if let Some(hit) = self.get(&key) {
            self.stats.hits += 1;
            debug!(key = %key, "simulation cache hit");
            return Ok(hit);
        }

        self.stats.misses += 1;
        debug!(key = %key, "simulation cache miss");
        let sample = simulate_partitioned(portfolio, trial_count, seed)?;
        Ok(self.insert(key, sample))
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portfolio::Position;

    const SEED: u64 = 42;

    fn book(p: f64) -> Portfolio {
        Portfolio::with_scale(vec![Position::new(p, 3.0), Position::new(0.5, 4.0)], 1000.0)
            .unwrap()
    }

    #[test]
    fn test_key_is_content_addressed() {
        assert_eq!(
            SimulationKey::new(&book(0.2), 100, SEED),
            SimulationKey::new(&book(0.2), 100, SEED)
        );
        assert_ne!(
            SimulationKey::new(&book(0.2), 100, SEED),
            SimulationKey::new(&book(0.3), 100, SEED)
        );
        assert_ne!(
            SimulationKey::new(&book(0.2), 100, SEED),
            SimulationKey::new(&book(0.2), 101, SEED)
        );
        assert_ne!(
            SimulationKey::new(&book(0.2), 100, SEED),
            SimulationKey::new(&book(0.2), 100, SEED + 1)
        );
    }

    #[test]
    fn test_key_includes_scale() {
        let a = Portfolio::with_scale(vec![Position::new(0.5, 1.0)], 1.0).unwrap();
        let b = Portfolio::with_scale(vec![Position::new(0.5, 1.0)], 1000.0).unwrap();
        assert_ne!(SimulationKey::new(&a, 10, SEED), SimulationKey::new(&b, 10, SEED));
    }

    #[test]
    fn test_key_hex_is_64_chars() {
        assert_eq!(SimulationKey::new(&book(0.2), 10, SEED).to_hex().len(), 64);
    }

    #[test]
    fn test_seeded_runs_hit_cache() {
        let mut cache = SimulationCache::new();
        let first = cache.get_or_simulate(&book(0.2), 500, Some(SEED)).unwrap();
        let second = cache.get_or_simulate(&book(0.2), 500, Some(SEED)).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.stats(), CacheStats { hits: 1, misses: 1 });
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cached_sample_matches_direct_simulation() {
        let mut cache = SimulationCache::new();
        let cached = cache.get_or_simulate(&book(0.2), 500, Some(SEED)).unwrap();
        let direct = simulate_partitioned(&book(0.2), 500, SEED).unwrap();
        assert_eq!(*cached, direct);
    }

    #[test]
    fn test_unseeded_runs_not_cached() {
        let mut cache = SimulationCache::new();
        cache.get_or_simulate(&book(0.2), 100, None).unwrap();
        assert!(cache.is_empty());
        assert_eq!(cache.stats(), CacheStats::default());
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut cache = SimulationCache::with_capacity(2);
        let (a, b, c) = (book(0.1), book(0.2), book(0.3));
        cache.get_or_simulate(&a, 50, Some(SEED)).unwrap();
        cache.get_or_simulate(&b, 50, Some(SEED)).unwrap();
        cache.get_or_simulate(&c, 50, Some(SEED)).unwrap();
        assert_eq!(cache.len(), 2);
        assert!(!cache.contains(&SimulationKey::new(&a, 50, SEED)));
        assert!(cache.contains(&SimulationKey::new(&b, 50, SEED)));
        assert!(cache.contains(&SimulationKey::new(&c, 50, SEED)));
    }

    #[test]
    fn test_reinserting_key_does_not_double_count() {
        let mut cache = SimulationCache::with_capacity(2);
        let key = SimulationKey::new(&book(0.1), 5, SEED);
        cache.insert(key, SimulationSample::from(vec![1.0]));
        cache.insert(key, SimulationSample::from(vec![2.0]));
        cache.insert(SimulationKey::new(&book(0.2), 5, SEED), SimulationSample::from(vec![3.0]));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&key).map(|s| s.as_slice().to_vec()), Some(vec![2.0]));
    }

    #[test]
    fn test_default_capacity() {
        assert_eq!(SimulationCache::new().capacity(), DEFAULT_CACHE_CAPACITY);
        assert_eq!(SimulationCache::with_capacity(0).capacity(), 1);
    }

    #[test]
    fn test_invalid_trials_not_cached() {
        let mut cache = SimulationCache::new();
        assert!(cache.get_or_simulate(&book(0.2), 0, Some(SEED)).is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut cache = SimulationCache::new();
        cache.get_or_simulate(&book(0.2), 50, Some(SEED)).unwrap();
        cache.clear();
        assert!(cache.is_empty());
    }
}
