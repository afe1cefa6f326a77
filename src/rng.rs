use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of the scene's randomized choices: material swaps, clip picks,
/// rotation offsets, float phases. Injected rather than called through a
/// process-global so tests can supply exact sequences.
pub trait RandomSource {
    /// Uniform value in [0, 1)
    fn next_f32(&mut self) -> f32;

    /// Uniform value in [lo, hi)
    fn range_f32(&mut self, lo: f32, hi: f32) -> f32 {
        lo + self.next_f32() * (hi - lo)
    }

    /// Uniform index in 0..len. `len` must be non-zero.
    fn pick_index(&mut self, len: usize) -> usize {
        ((self.next_f32() * len as f32) as usize).min(len - 1)
    }
}

/// Default source backed by the thread-local generator
#[derive(Debug, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_f32(&mut self) -> f32 {
        rand::thread_rng().gen::<f32>()
    }

    fn pick_index(&mut self, len: usize) -> usize {
        rand::thread_rng().gen_range(0..len)
    }
}

/// Deterministic source for reproducible runs (`--seed`)
#[derive(Debug)]
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for SeededRandom {
    fn next_f32(&mut self) -> f32 {
        self.rng.gen::<f32>()
    }

    fn pick_index(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }
}

/// Test double replaying a fixed sequence of unit-interval values, wrapping
/// when exhausted
#[derive(Debug, Clone)]
pub struct SequenceRandom {
    values: Vec<f32>,
    cursor: usize,
}

impl SequenceRandom {
    pub fn new(values: Vec<f32>) -> Self {
        Self {
            values,
            cursor: 0,
        }
    }

    /// How many draws have been consumed so far
    pub fn draws(&self) -> usize {
        self.cursor
    }
}

impl RandomSource for SequenceRandom {
    fn next_f32(&mut self) -> f32 {
        if self.values.is_empty() {
            return 0.0;
        }
        let v = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        v
    }
}
