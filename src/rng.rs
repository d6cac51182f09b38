//! Bounded integer randomness shared by every stochastic rule.
//!
//! All ranges follow bracket-random's convention: `range(min, max)` yields a
//! value in `min..max` (upper bound exclusive).

use bracket_random::prelude::RandomNumberGenerator;

pub struct GameRng {
    inner: RandomNumberGenerator,
    seed: u64,
}

impl GameRng {
    pub fn seeded(seed: u64) -> Self {
        Self {
            inner: RandomNumberGenerator::seeded(seed),
            seed,
        }
    }

    /// Stream for a session restored at `turn`. Keeps reporting the original
    /// seed, but draws from a sequence derived from both values.
    pub fn resumed(seed: u64, turn: u64) -> Self {
        let stream = seed.wrapping_add(turn.wrapping_mul(0x9E37_79B9_7F4A_7C15));
        Self {
            inner: RandomNumberGenerator::seeded(stream),
            seed,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Uniform integer in `min..max`. Returns `min` when the range is empty.
    pub fn range(&mut self, min: i32, max: i32) -> i32 {
        if max <= min {
            return min;
        }
        self.inner.range(min, max)
    }

    /// Uniform index into a collection of `len` elements.
    pub fn index(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        Some(self.inner.range(0, len as i32) as usize)
    }

    /// True with probability `percent`/100.
    pub fn percent(&mut self, percent: i32) -> bool {
        self.inner.range(0, 100) < percent
    }

    /// True half of the time.
    pub fn coin(&mut self) -> bool {
        self.inner.range(0, 2) == 0
    }

    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        self.index(items.len()).map(|idx| &items[idx])
    }
}

impl std::fmt::Debug for GameRng {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameRng").field("seed", &self.seed).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_is_upper_exclusive() {
        let mut rng = GameRng::seeded(7);
        for _ in 0..500 {
            let roll = rng.range(-2, 3);
            assert!((-2..3).contains(&roll));
        }
    }

    #[test]
    fn empty_range_falls_back_to_min() {
        let mut rng = GameRng::seeded(7);
        assert_eq!(rng.range(4, 4), 4);
        assert_eq!(rng.range(9, 2), 9);
        assert_eq!(rng.index(0), None);
    }

    #[test]
    fn same_seed_same_sequence() {
        let mut a = GameRng::seeded(99);
        let mut b = GameRng::seeded(99);
        let left: Vec<i32> = (0..32).map(|_| a.range(0, 1000)).collect();
        let right: Vec<i32> = (0..32).map(|_| b.range(0, 1000)).collect();
        assert_eq!(left, right);
    }
}
