//! Deterministic hashing. The standard library's maps are randomly seeded per process, which
//! would make iteration order (and so the draw order of contacts) differ between runs with the
//! same seed. Every map and set in the engine uses the Fx hasher instead; create them with
//! `HashMap::default()`.

use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;

pub use rustc_hash::{FxHashMap as HashMap, FxHashSet as HashSet};

/// The Fx hash of a sample index, used to spread per-sample seeds apart.
pub fn hash_usize(value: usize) -> u64 {
    let mut hasher = FxHasher::default();
    value.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_hashes_are_stable_and_distinct() {
        assert_eq!(hash_usize(3), hash_usize(3));
        let hashes: HashSet<u64> = (0..20).map(hash_usize).collect();
        assert_eq!(hashes.len(), 20);
    }
}
