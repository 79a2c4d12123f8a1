//! Deterministic Random Number Generation
//!
//! This module provides the seedable PRNG that drives pattern generation.
//! It implements SFC32, a small fast chaotic generator with four 32-bit
//! words of state. The exact arithmetic (wrapping 32-bit addition, rotate
//! left by 21, xorshift right by 9) is a compatibility contract: the same
//! seed must yield the same pattern across every implementation of the
//! generator, so patterns can be regenerated from a stored seed alone.
//!
//! The generator is owned exclusively by a generation pass and is never
//! shared with playback.

/// A seedable random number generator using SFC32.
///
/// Fast, small, and good enough statistically for musical pattern
/// generation. One draw per `next()` call, advancing all four words.
#[derive(Debug, Clone, Copy)]
pub struct Sfc32 {
    a: u32,
    b: u32,
    c: u32,
    d: u32,
}

impl Sfc32 {
    /// Create a new generator from a single 32-bit seed.
    ///
    /// All four state words are initialized to the seed value. This exact
    /// seeding scheme is part of the determinism contract.
    #[inline]
    pub const fn new(seed: u32) -> Self {
        Self {
            a: seed,
            b: seed,
            c: seed,
            d: seed,
        }
    }

    /// Create a generator from four explicit state words.
    #[inline]
    pub const fn from_words(a: u32, b: u32, c: u32, d: u32) -> Self {
        Self { a, b, c, d }
    }

    /// Generate the next value as an `f32`, nominally in `[0, 1)`.
    ///
    /// For the topmost ~128 raw values the f32 division rounds up to
    /// exactly 1.0, so callers must treat the range as closed. The
    /// division is kept as-is for bit compatibility with the reference
    /// arithmetic, which shares the edge.
    #[inline]
    pub fn next(&mut self) -> f32 {
        let mut t = self.a.wrapping_add(self.b);
        self.a = self.b ^ (self.b >> 9);
        self.b = self.c.wrapping_add(self.c << 3);
        self.c = self.c.rotate_left(21);
        self.d = self.d.wrapping_add(1);
        t = t.wrapping_add(self.d);
        self.c = self.c.wrapping_add(t);
        t as f32 / 4_294_967_296.0
    }

    /// Generate a random integer in `[min, max]`, both ends inclusive.
    ///
    /// When [`Sfc32::next`] lands on its 1.0 rounding edge this returns
    /// `max + 1`; consumers that index with the result must clamp.
    #[inline]
    pub fn random_int(&mut self, min: i32, max: i32) -> i32 {
        let span = (max - min + 1) as f32;
        (self.next() * span).floor() as i32 + min
    }
}

/// Derive the next pattern seed from the previous one and a wall-clock
/// reading (seconds are fine; only entropy matters, not resolution).
///
/// The time source is an explicit parameter so the derivation stays
/// testable with an injected fixed value. The mixing constants are the
/// classic Numerical Recipes LCG pair.
#[inline]
pub fn derive_seed(prev: u32, wall_clock: u32) -> u32 {
    wall_clock ^ prev.wrapping_mul(1_664_525).wrapping_add(1_013_904_223)
}

/// Read the system clock as whole seconds since the Unix epoch.
///
/// Falls back to zero if the clock is set before the epoch; the seed
/// derivation still mixes in the previous seed, so generation never
/// degenerates to a constant.
pub fn system_time_seconds() -> u32 {
    use std::time::{SystemTime, UNIX_EPOCH};

    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as u32)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_draw_closed_form() {
        // With all four words seeded to s, the first output t works out to
        // 3s + 1 (mod 2^32). This anchors the reference arithmetic without
        // needing a recorded vector file.
        for seed in [0u32, 1, 12345, 0xDEAD_BEEF, u32::MAX] {
            let mut rng = Sfc32::new(seed);
            let expected = seed.wrapping_mul(3).wrapping_add(1) as f32 / 4_294_967_296.0;
            assert_eq!(rng.next(), expected, "seed {}", seed);
        }
    }

    #[test]
    fn test_deterministic() {
        let mut rng1 = Sfc32::new(12345);
        let mut rng2 = Sfc32::new(12345);

        for _ in 0..1000 {
            assert_eq!(rng1.next().to_bits(), rng2.next().to_bits());
        }
    }

    #[test]
    fn test_different_seeds_diverge() {
        let mut rng1 = Sfc32::new(12345);
        let mut rng2 = Sfc32::new(54321);

        let a: Vec<u32> = (0..8).map(|_| rng1.next().to_bits()).collect();
        let b: Vec<u32> = (0..8).map(|_| rng2.next().to_bits()).collect();
        assert_ne!(a, b);
    }

    #[test]
    fn test_next_range() {
        let mut rng = Sfc32::new(42);

        for _ in 0..10_000 {
            let v = rng.next();
            assert!((0.0..1.0).contains(&v), "value {} out of range", v);
        }
    }

    #[test]
    fn test_next_can_round_up_to_one() {
        // A raw output of 0xFFFFFFFF is within half an f32 ulp of 2^32,
        // so the division rounds to exactly 1.0. State chosen so the
        // first draw's t = a + b + (d + 1) = 0xFFFFFFFF.
        let mut rng = Sfc32::from_words(0xFFFF_FFFF, 0, 0, 0xFFFF_FFFF);
        assert_eq!(rng.next(), 1.0);

        let mut rng = Sfc32::from_words(0xFFFF_FFFF, 0, 0, 0xFFFF_FFFF);
        assert_eq!(rng.random_int(0, 6), 7, "the edge overshoots max by one");
    }

    #[test]
    fn test_random_int_inclusive_bounds() {
        let mut rng = Sfc32::new(7);
        let mut seen = [false; 3];

        for _ in 0..1000 {
            let v = rng.random_int(-1, 1);
            assert!((-1..=1).contains(&v), "value {} out of range", v);
            seen[(v + 1) as usize] = true;
        }

        // All three values should appear over 1000 draws.
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_random_int_single_value() {
        let mut rng = Sfc32::new(99);
        for _ in 0..100 {
            assert_eq!(rng.random_int(3, 3), 3);
        }
    }

    #[test]
    fn test_distribution_mean() {
        let mut rng = Sfc32::new(42);
        let count = 10_000;
        let sum: f64 = (0..count).map(|_| rng.next() as f64).sum();

        let mean = sum / count as f64;
        assert!((mean - 0.5).abs() < 0.02, "mean {} too far from 0.5", mean);
    }

    #[test]
    fn test_derive_seed_deterministic() {
        assert_eq!(
            derive_seed(12345, 1_700_000_000),
            derive_seed(12345, 1_700_000_000)
        );
        assert_ne!(
            derive_seed(12345, 1_700_000_000),
            derive_seed(12345, 1_700_000_001)
        );
        assert_ne!(
            derive_seed(12345, 1_700_000_000),
            derive_seed(54321, 1_700_000_000)
        );
    }

    #[test]
    fn test_derive_seed_mixes_previous() {
        // Even with a stuck clock, consecutive derivations keep moving.
        let s1 = derive_seed(12345, 0);
        let s2 = derive_seed(s1, 0);
        assert_ne!(s1, s2);
    }
}
