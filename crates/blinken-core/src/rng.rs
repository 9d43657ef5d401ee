#![forbid(unsafe_code)]

//! Seedable randomness for every timing formula.
//!
//! All randomized delays, counts, and coin flips go through [`SimRng`], a
//! thin wrapper over `ChaCha8Rng`. Seeding it makes an entire run
//! reproducible; [`SimRng::fork`] derives independent per-chain streams so
//! that the order in which chains interleave never changes what each chain
//! draws.
//!
//! # Invariants
//!
//! 1. [`DelayRange::sample`] returns a value in `[min, max)` when
//!    `min < max`, and exactly `min` when `min >= max`.
//! 2. Negative bounds are clamped to zero.
//! 3. [`SimRng::count`] is inclusive on both ends and never panics on an
//!    inverted range (it returns the start).

use std::ops::RangeInclusive;
use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const NANOS_PER_MS: f64 = 1_000_000.0;

/// A half-open millisecond interval `[min_ms, max_ms)` sampled uniformly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DelayRange {
    /// Lower bound, inclusive.
    pub min_ms: f64,
    /// Upper bound, exclusive.
    pub max_ms: f64,
}

impl DelayRange {
    /// Create a range from millisecond bounds.
    pub const fn new(min_ms: f64, max_ms: f64) -> Self {
        Self { min_ms, max_ms }
    }

    /// `base ± spread`, e.g. `around(120.0, 10.0)` is `[110, 130)`.
    pub fn around(base_ms: f64, spread_ms: f64) -> Self {
        Self::new(base_ms - spread_ms, base_ms + spread_ms)
    }

    /// Midpoint in milliseconds.
    pub fn mean_ms(&self) -> f64 {
        (self.min_ms + self.max_ms) / 2.0
    }

    /// Lower bound as a duration.
    pub fn min(&self) -> Duration {
        ms_to_duration(self.min_ms)
    }

    /// Upper bound as a duration.
    pub fn max(&self) -> Duration {
        ms_to_duration(self.max_ms)
    }

    /// Whether `d` could have been produced by [`sample`](Self::sample).
    pub fn contains(&self, d: Duration) -> bool {
        if self.max_ms <= self.min_ms {
            return d == self.min();
        }
        d >= self.min() && d < self.max()
    }

    /// Draw a uniform delay from the range.
    pub fn sample(&self, rng: &mut SimRng) -> Duration {
        let min = (self.min_ms.max(0.0) * NANOS_PER_MS) as u64;
        let max = (self.max_ms.max(0.0) * NANOS_PER_MS) as u64;
        if max <= min {
            return Duration::from_nanos(min);
        }
        Duration::from_nanos(rng.inner.random_range(min..max))
    }
}

/// Convert fractional milliseconds to a duration, flooring at zero.
pub fn ms_to_duration(ms: f64) -> Duration {
    Duration::from_nanos((ms.max(0.0) * NANOS_PER_MS) as u64)
}

/// Deterministic random source used by every chain.
#[derive(Debug, Clone)]
pub struct SimRng {
    inner: ChaCha8Rng,
}

impl SimRng {
    /// Seeded stream; identical seeds give identical runs.
    pub fn seed_from_u64(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Stream seeded from the thread-local OS-backed generator.
    pub fn from_entropy() -> Self {
        Self {
            inner: ChaCha8Rng::from_rng(&mut rand::rng()),
        }
    }

    /// Derive an independent child stream.
    pub fn fork(&mut self) -> Self {
        Self::seed_from_u64(self.inner.random())
    }

    /// Uniform value in `[0, 1)`.
    pub fn unit(&mut self) -> f64 {
        self.inner.random()
    }

    /// `true` with probability `p` (clamped to `[0, 1]`).
    pub fn chance(&mut self, p: f64) -> bool {
        self.unit() < p.clamp(0.0, 1.0)
    }

    /// Uniform integer in the inclusive range.
    pub fn count(&mut self, range: RangeInclusive<u32>) -> u32 {
        if range.start() > range.end() {
            return *range.start();
        }
        self.inner.random_range(range)
    }

    /// Shorthand for [`DelayRange::sample`].
    pub fn delay(&mut self, range: DelayRange) -> Duration {
        range.sample(self)
    }
}
