//! Seeded randomness owned by a single match.
//!
//! Every roll in a match (shop offers, summon picks, steal targets, critical
//! strikes) is drawn from one `Lcg64Xsh32` stream, so a match is fully
//! determined by its seed and the actions fed into it.

use rand::{RngCore, SeedableRng};
use rand_pcg::Lcg64Xsh32;
use rocket::serde::{Deserialize, Serialize};

/// Expand a u64 seed into the 16 bytes `Lcg64Xsh32` expects (two copies of the u64).
pub fn seed_bytes(seed: u64) -> [u8; 16] {
    let s = seed.to_le_bytes();
    let mut bytes = [0u8; 16];
    bytes[0..8].copy_from_slice(&s);
    bytes[8..16].copy_from_slice(&s);
    bytes
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct MatchRng {
    inner: Lcg64Xsh32,
}

impl MatchRng {
    pub fn from_seed(seed: u64) -> Self {
        MatchRng {
            inner: Lcg64Xsh32::from_seed(seed_bytes(seed)),
        }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }

    /// Uniform index in `0..len`. Returns 0 for an empty range.
    pub fn index(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        (self.inner.next_u64() % len as u64) as usize
    }

    /// Uniform value in `0..100`.
    pub fn percent(&mut self) -> u32 {
        (self.inner.next_u64() % 100) as u32
    }

    /// True with probability `pct`/100.
    pub fn chance(&mut self, pct: u32) -> bool {
        self.percent() < pct
    }

    /// Uniform value in `lo..=hi`.
    pub fn between(&mut self, lo: u32, hi: u32) -> u32 {
        if hi <= lo {
            return lo;
        }
        lo + (self.inner.next_u64() % u64::from(hi - lo + 1)) as u32
    }

    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let i = self.index(items.len());
        items.get(i)
    }

    /// Choose `count` distinct indexes out of `0..len`, in draw order.
    pub fn distinct_indexes(&mut self, len: usize, count: usize) -> Vec<usize> {
        let mut pool: Vec<usize> = (0..len).collect();
        let mut chosen = Vec::with_capacity(count.min(len));
        while chosen.len() < count && !pool.is_empty() {
            let i = self.index(pool.len());
            chosen.push(pool.remove(i));
        }
        chosen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_stream() {
        let mut a = MatchRng::from_seed(42);
        let mut b = MatchRng::from_seed(42);
        for _ in 0..16 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn distinct_indexes_never_repeat() {
        let mut rng = MatchRng::from_seed(7);
        let picked = rng.distinct_indexes(6, 3);
        assert_eq!(picked.len(), 3);
        let mut sorted = picked.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), 3);
        assert!(picked.iter().all(|i| *i < 6));
    }

    #[test]
    fn pick_matches_index_draws() {
        let pool = ["a", "b", "c", "d"];
        let mut a = MatchRng::from_seed(5);
        let mut b = MatchRng::from_seed(5);
        for _ in 0..20 {
            assert_eq!(a.pick(&pool), Some(&pool[b.index(pool.len())]));
        }
        assert_eq!(a.pick::<u8>(&[]), None);
    }

    #[test]
    fn between_stays_in_range() {
        let mut rng = MatchRng::from_seed(3);
        for _ in 0..100 {
            let v = rng.between(1, 3);
            assert!((1..=3).contains(&v));
        }
    }

    #[test]
    fn snapshot_restores_stream() {
        let mut rng = MatchRng::from_seed(11);
        rng.next_u64();
        let snap = serde_json::to_string(&rng).expect("serialize rng");
        let mut restored: MatchRng = serde_json::from_str(&snap).expect("restore rng");
        assert_eq!(rng.next_u64(), restored.next_u64());
    }
}
