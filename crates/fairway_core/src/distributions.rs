//! Inter-arrival distributions for the order arrival generator.
//!
//! Draws are seeded per arrival index, so the arrival stream for a given seed
//! is fixed regardless of how events interleave.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Samples the gap before the next order, in fractional minutes.
pub trait InterArrivalDistribution: Send + Sync + std::fmt::Debug {
    /// `arrival_index` is the number of orders generated so far.
    fn sample_minutes(&self, arrival_index: u64) -> f64;
}

/// Mean interval with uniform jitter, compressed by a demand multiplier:
/// `(interval ± variance) / volume_multiplier`.
#[derive(Debug, Clone)]
pub struct JitteredInterArrival {
    pub interval_min: f64,
    pub variance_min: f64,
    pub volume_multiplier: f64,
    pub seed: u64,
}

impl JitteredInterArrival {
    pub fn new(interval_min: f64, variance_min: f64, volume_multiplier: f64, seed: u64) -> Self {
        Self {
            interval_min: interval_min.max(0.0),
            variance_min: variance_min.max(0.0),
            volume_multiplier: volume_multiplier.max(1e-6),
            seed,
        }
    }
}

impl InterArrivalDistribution for JitteredInterArrival {
    fn sample_minutes(&self, arrival_index: u64) -> f64 {
        if self.interval_min <= 0.0 {
            return f64::INFINITY;
        }
        let jitter = if self.variance_min > 0.0 {
            let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(arrival_index));
            rng.gen_range(-self.variance_min..self.variance_min)
        } else {
            0.0
        };
        ((self.interval_min + jitter) / self.volume_multiplier).max(0.05)
    }
}

/// Fixed interval, mostly for tests and quiet presets.
#[derive(Debug, Clone)]
pub struct UniformInterArrival {
    pub interval_min: f64,
}

impl InterArrivalDistribution for UniformInterArrival {
    fn sample_minutes(&self, _arrival_index: u64) -> f64 {
        if self.interval_min <= 0.0 {
            f64::INFINITY
        } else {
            self.interval_min
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_is_constant() {
        let dist = UniformInterArrival { interval_min: 4.0 };
        assert_eq!(dist.sample_minutes(0), 4.0);
        assert_eq!(dist.sample_minutes(100), 4.0);
    }

    #[test]
    fn jitter_stays_within_band_and_replays() {
        let dist = JitteredInterArrival::new(6.0, 2.0, 1.0, 42);
        for i in 0..200 {
            let sample = dist.sample_minutes(i);
            assert!(sample >= 4.0 && sample <= 8.0, "sample {sample} out of band");
            assert_eq!(sample, dist.sample_minutes(i));
        }
    }

    #[test]
    fn volume_multiplier_compresses_gaps() {
        let slow = JitteredInterArrival::new(6.0, 0.0, 1.0, 1);
        let fast = JitteredInterArrival::new(6.0, 0.0, 2.0, 1);
        assert!(fast.sample_minutes(0) < slow.sample_minutes(0));
    }

    #[test]
    fn zero_interval_never_spawns() {
        let dist = JitteredInterArrival::new(0.0, 1.0, 1.0, 1);
        assert!(dist.sample_minutes(0).is_infinite());
    }
}
