//! Pluggable random number sources.
//!
//! Everything that needs randomness in the engine (strip shuffling, reel stops, provider latency)
//! goes through [`RandomSource`], so a [`SeededRandomSource`] makes a whole game replayable from a
//! single integer while [`EntropyRandomSource`] is used in production.

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::error::{EngineError, Result};

/// Source of pseudo-random fractions and bounded integers.
pub trait RandomSource: Send {
    /// Returns a value in `[0, 1)`.
    fn next_f64(&mut self) -> f64;

    /// Returns an integer in `[0, bound)`.
    ///
    /// Fails with [`EngineError::InvalidArgument`] when `bound` is zero.
    fn next_int(&mut self, bound: usize) -> Result<usize> {
        if bound == 0 {
            return Err(EngineError::invalid("bound must be greater than 0"));
        }
        let value = (self.next_f64() * bound as f64).floor() as usize;
        Ok(value.min(bound - 1))
    }
}

impl<R: RandomSource + ?Sized> RandomSource for Box<R> {
    fn next_f64(&mut self) -> f64 {
        (**self).next_f64()
    }

    fn next_int(&mut self, bound: usize) -> Result<usize> {
        (**self).next_int(bound)
    }
}

/// Non-reproducible source seeded from the operating system.
#[derive(Debug)]
pub struct EntropyRandomSource {
    rng: StdRng,
}

impl EntropyRandomSource {
    /// Creates a source from fresh OS entropy.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl Default for EntropyRandomSource {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for EntropyRandomSource {
    fn next_f64(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    fn next_int(&mut self, bound: usize) -> Result<usize> {
        if bound == 0 {
            return Err(EngineError::invalid("bound must be greater than 0"));
        }
        Ok(self.rng.gen_range(0..bound))
    }
}

/// Linear congruential generator `x' = (9301 * x + 49297) mod 233280`.
///
/// The fraction returned by [`RandomSource::next_f64`] is `x' / 233280`. The internal state is
/// exposed so a session can be captured and replayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeededRandomSource {
    seed: u64,
}

impl SeededRandomSource {
    const MULTIPLIER: u64 = 9301;
    const INCREMENT: u64 = 49297;
    const MODULUS: u64 = 233280;

    /// Creates a generator whose first state is `seed`.
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Current internal state.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Overwrites the internal state.
    pub fn set_seed(&mut self, seed: u64) {
        self.seed = seed;
    }
}

impl RandomSource for SeededRandomSource {
    fn next_f64(&mut self) -> f64 {
        // Reducing first keeps the product far from overflow for arbitrary u64 seeds.
        self.seed =
            ((self.seed % Self::MODULUS) * Self::MULTIPLIER + Self::INCREMENT) % Self::MODULUS;
        self.seed as f64 / Self::MODULUS as f64
    }
}

/// Returns a shuffled copy of `items` (Fisher-Yates, drawing `next_int(i + 1)` for `i` from
/// `len - 1` down to `1`). The input is left untouched.
pub fn shuffle<T: Clone, R: RandomSource + ?Sized>(items: &[T], rng: &mut R) -> Result<Vec<T>> {
    let mut shuffled = items.to_vec();
    for i in (1..shuffled.len()).rev() {
        let j = rng.next_int(i + 1)?;
        shuffled.swap(i, j);
    }
    Ok(shuffled)
}
