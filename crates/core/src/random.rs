//! Seedable random sampling used to scatter dots.
//!
//! [`Xorshift64`] is the deterministic generator; [`RandomSampler`] layers the
//! three distributions the animations draw from on top of it:
//!
//! - `uniform`: flat over `[min, max)`.
//! - `averaged_uniform`: mean of several uniform draws, biased toward the
//!   middle of the range.
//! - `inverted_averaged_uniform`: the same mean rotated by half a period,
//!   biased toward the edges of the range.

/// Number of draws averaged by the center/edge-biased samplers unless a
/// caller asks for something else.
pub const DEFAULT_SAMPLES: u32 = 3;

/// Xorshift64 deterministic PRNG. Same seed always produces the same sequence.
///
/// Seed of 0 is replaced with a non-zero fallback to avoid the all-zeros
/// fixed point.
#[derive(Debug, Clone)]
pub struct Xorshift64 {
    state: u64,
}

impl Xorshift64 {
    const FALLBACK_SEED: u64 = 0x5EED_DEAD_BEEF_CAFE;

    pub fn new(seed: u64) -> Self {
        Self {
            state: if seed == 0 { Self::FALLBACK_SEED } else { seed },
        }
    }

    /// Advances the state with shifts (13, 7, 17) and returns it.
    pub fn next_u64(&mut self) -> u64 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 7;
        self.state ^= self.state << 17;
        self.state
    }

    /// Uniform f64 in [0, 1) built from the upper 53 bits.
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }
}

/// Random helpers for seeding dot positions, velocities and targets.
#[derive(Debug, Clone)]
pub struct RandomSampler {
    rng: Xorshift64,
}

impl RandomSampler {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Xorshift64::new(seed),
        }
    }

    /// Uniform value in `[min, max)`.
    pub fn uniform(&mut self, min: f64, max: f64) -> f64 {
        self.rng.next_f64() * (max - min) + min
    }

    /// Mean of `samples` uniform draws, mapped to `[min, max)`.
    ///
    /// `samples == 0` divides by zero and returns NaN.
    pub fn averaged_uniform(&mut self, min: f64, max: f64, samples: u32) -> f64 {
        self.mean_of(samples) * (max - min) + min
    }

    /// Like [`averaged_uniform`](Self::averaged_uniform) but the mean is
    /// shifted by 0.5 modulo 1 first, so values cluster near `min` and `max`.
    pub fn inverted_averaged_uniform(&mut self, min: f64, max: f64, samples: u32) -> f64 {
        let shifted = (self.mean_of(samples) + 0.5) % 1.0;
        shifted * (max - min) + min
    }

    fn mean_of(&mut self, samples: u32) -> f64 {
        let sum: f64 = (0..samples).map(|_| self.rng.next_f64()).sum();
        sum / samples as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_u64_produces_known_golden_value_for_seed_42() {
        // If this breaks, every recorded seed renders differently.
        let mut rng = Xorshift64::new(42);
        assert_eq!(rng.next_u64(), 45_454_805_674);
    }

    #[test]
    fn seed_zero_does_not_produce_all_zeros() {
        let mut rng = Xorshift64::new(0);
        assert_ne!(rng.next_u64(), 0);
        assert_ne!(rng.next_u64(), 0);
    }

    #[test]
    fn same_seed_same_samples() {
        let mut a = RandomSampler::new(7);
        let mut b = RandomSampler::new(7);
        for _ in 0..100 {
            assert_eq!(
                a.averaged_uniform(0.0, 600.0, 3).to_bits(),
                b.averaged_uniform(0.0, 600.0, 3).to_bits()
            );
        }
    }

    #[test]
    fn uniform_stays_within_bounds() {
        let mut s = RandomSampler::new(9999);
        for _ in 0..10_000 {
            let v = s.uniform(-0.4, 0.4);
            assert!((-0.4..0.4).contains(&v), "uniform(-0.4, 0.4) = {v}");
        }
    }

    #[test]
    fn zero_samples_yields_nan() {
        let mut s = RandomSampler::new(1);
        assert!(s.averaged_uniform(0.0, 10.0, 0).is_nan());
        assert!(s.inverted_averaged_uniform(0.0, 10.0, 0).is_nan());
    }

    #[test]
    fn averaged_uniform_is_center_biased() {
        let mut s = RandomSampler::new(12345);
        let n = 10_000;
        let central = (0..n)
            .map(|_| s.averaged_uniform(0.0, 1.0, DEFAULT_SAMPLES))
            .filter(|v| (0.25..0.75).contains(v))
            .count();
        // Flat would give ~50%; the mean of three draws puts ~84% in the middle half.
        assert!(central > n * 7 / 10, "only {central} of {n} in the middle half");
    }

    #[test]
    fn inverted_averaged_uniform_is_edge_biased() {
        let mut s = RandomSampler::new(12345);
        let n = 10_000;
        let central = (0..n)
            .map(|_| s.inverted_averaged_uniform(0.0, 1.0, DEFAULT_SAMPLES))
            .filter(|v| (0.25..0.75).contains(v))
            .count();
        assert!(central < n * 3 / 10, "{central} of {n} in the middle half");
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn uniform_in_bounds_for_any_seed_and_range(
                seed: u64,
                min in -1e3_f64..1e3,
                span in 1e-2_f64..1e3,
            ) {
                let mut s = RandomSampler::new(seed);
                let max = min + span;
                for _ in 0..100 {
                    let v = s.uniform(min, max);
                    prop_assert!(v >= min && v < max, "uniform({min}, {max}) = {v}");
                }
            }

            #[test]
            fn biased_samplers_stay_in_range(seed: u64, samples in 1_u32..8) {
                let mut s = RandomSampler::new(seed);
                for _ in 0..100 {
                    let a = s.averaged_uniform(0.0, 400.0, samples);
                    let b = s.inverted_averaged_uniform(0.0, 400.0, samples);
                    prop_assert!((0.0..400.0).contains(&a), "averaged = {a}");
                    prop_assert!((0.0..400.0).contains(&b), "inverted = {b}");
                }
            }
        }
    }
}
