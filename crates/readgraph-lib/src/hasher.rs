//! Deterministic hashing for the k-mer index and edge map.
//!
//! ahash with explicit seeds, so two runs over the same input build maps
//! with identical layout. Output ordering never depends on map iteration,
//! but fixed seeds keep memory use and timings reproducible too.

use ahash::RandomState;
use std::collections::HashMap;

/// Seed shared by all maps in the crate
pub const DEFAULT_SEED: u64 = 1;

/// `HashMap` keyed with a fixed-seed ahash state
pub type DetHashMap<K, V> = HashMap<K, V, RandomState>;

/// Build the seeded hash state
#[inline]
pub fn seeded_state(seed: u64) -> RandomState {
    RandomState::with_seeds(seed, !seed, seed, !seed)
}

/// Empty map with the default seed
pub fn new_map<K, V>() -> DetHashMap<K, V> {
    HashMap::with_hasher(seeded_state(DEFAULT_SEED))
}

/// Empty map with the default seed and room for `capacity` entries
pub fn map_with_capacity<K, V>(capacity: usize) -> DetHashMap<K, V> {
    HashMap::with_capacity_and_hasher(capacity, seeded_state(DEFAULT_SEED))
}
