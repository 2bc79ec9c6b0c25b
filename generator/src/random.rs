use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

/// The single randomness source behind every stochastic decision.
///
/// All draws go through one `StdRng` in a fixed, program-order sequence, so
/// a (version, seed) pair replays the entire generation trace. A requested
/// seed of zero mints a fresh entropy seed and records it.
pub struct RandGen {
    rng: StdRng,
    seed: u64,
}

impl RandGen {
    pub fn new(requested_seed: u64) -> Self {
        let seed = if requested_seed == 0 {
            rand::rng().random::<u64>()
        } else {
            requested_seed
        };
        info!(seed, "seeded random generator");
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed,
        }
    }

    /// The seed actually in use, for embedding in reports and file paths.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Uniform draw over `[low, high]`, both ends included.
    pub fn uniform(&mut self, low: u32, high: u32) -> u32 {
        self.rng.random_range(low..=high)
    }

    /// As [`Self::uniform`], over the widest value domain the type system
    /// needs (covers `unsigned long long` ranges).
    pub fn uniform_wide(&mut self, low: i128, high: i128) -> i128 {
        self.rng.random_range(low..=high)
    }

    /// Picks an entry by weight. The table order is fixed by the caller,
    /// which keeps the draw order reproducible; entries with zero weight
    /// are never selected.
    pub fn weighted<T: Copy>(&mut self, table: &[(T, u32)]) -> T {
        let total: u32 = table.iter().map(|(_, w)| w).sum();
        assert!(total > 0, "weighted choice over an empty distribution");
        let mut roll = self.uniform(1, total);
        for (value, weight) in table {
            if roll <= *weight {
                return *value;
            }
            roll -= weight;
        }
        unreachable!("roll exceeded total weight");
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn same_seed_same_stream() {
        let mut a = RandGen::new(7);
        let mut b = RandGen::new(7);
        for _ in 0..64 {
            assert_eq!(a.uniform(0, 1000), b.uniform(0, 1000));
        }
    }

    #[test]
    fn uniform_stays_in_bounds() {
        let mut rng = RandGen::new(3);
        for _ in 0..256 {
            let v = rng.uniform(5, 9);
            assert!((5..=9).contains(&v));
        }
        assert_eq!(rng.uniform(4, 4), 4);
    }

    #[test]
    fn wide_draws_cover_signed_ranges() {
        let mut rng = RandGen::new(11);
        for _ in 0..256 {
            let v = rng.uniform_wide(-128, 127);
            assert!((-128..=127).contains(&v));
        }
        let v = rng.uniform_wide(0, u64::MAX as i128);
        assert!(v >= 0);
    }

    #[test]
    fn weighted_skips_zero_weights() {
        let mut rng = RandGen::new(5);
        for _ in 0..128 {
            let v = rng.weighted(&[(1u8, 0), (2u8, 3), (3u8, 0), (4u8, 1)]);
            assert!(v == 2 || v == 4);
        }
    }

    #[test]
    fn fresh_seed_is_recorded() {
        let rng = RandGen::new(0);
        // Whatever was minted must be observable so the run can be replayed.
        let recorded = rng.seed();
        let mut replay = RandGen::new(recorded);
        let mut original = RandGen::new(recorded);
        assert_eq!(replay.uniform(0, 1 << 20), original.uniform(0, 1 << 20));
    }
}
