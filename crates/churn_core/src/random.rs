//! Deterministic random source for reproducible datasets and splits
//!
//! A seed expands through SplitMix64 into the state of a xoshiro256**
//! generator. Every draw is derived from integer arithmetic on that state, so
//! a fixed seed and a fixed sequence of draw calls always yield the same
//! values. The order of calls is part of the contract: reordering or
//! regrouping draws changes every value that follows.

use crate::errors::{ChurnError, Result};

/// 2^-53, used to map the top 53 bits of a draw onto [0, 1)
const UNIT_SCALE: f64 = 1.0 / (1u64 << 53) as f64;

/// Seeded pseudo-random stream with typed batch draws
#[derive(Clone, Debug)]
pub struct DeterministicRng {
    state: [u64; 4],
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        let mut sm = seed;
        let mut state = [0u64; 4];
        for word in state.iter_mut() {
            *word = splitmix64(&mut sm);
        }
        Self { state }
    }

    /// Next raw 64-bit value (xoshiro256**)
    pub fn next_u64(&mut self) -> u64 {
        let s = &mut self.state;
        let result = s[1].wrapping_mul(5).rotate_left(7).wrapping_mul(9);
        let t = s[1] << 17;

        s[2] ^= s[0];
        s[3] ^= s[1];
        s[1] ^= s[2];
        s[0] ^= s[3];
        s[2] ^= t;
        s[3] = s[3].rotate_left(45);

        result
    }

    /// Uniform value in [0, 1)
    pub fn next_unit(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 * UNIT_SCALE
    }

    /// Unbiased value in [0, span). `span` must be non-zero.
    fn next_below(&mut self, span: u64) -> u64 {
        // Reject the low 2^64 mod span values so every residue is equally likely.
        let threshold = span.wrapping_neg() % span;
        loop {
            let r = self.next_u64();
            if r >= threshold {
                return r % span;
            }
        }
    }

    /// `n` floats drawn uniformly from [low, high)
    pub fn uniform(&mut self, low: f64, high: f64, n: usize) -> Result<Vec<f64>> {
        if !low.is_finite() || !high.is_finite() || low >= high {
            return Err(ChurnError::InvalidParameters(format!(
                "uniform requires finite low < high, got [{low}, {high})"
            )));
        }
        let width = high - low;
        Ok((0..n).map(|_| low + width * self.next_unit()).collect())
    }

    /// `n` integers drawn uniformly from [low, high)
    pub fn integers(&mut self, low: i64, high: i64, n: usize) -> Result<Vec<i64>> {
        if high <= low {
            return Err(ChurnError::InvalidParameters(format!(
                "integers requires low < high, got [{low}, {high})"
            )));
        }
        let span = (high as i128 - low as i128) as u64;
        Ok((0..n)
            .map(|_| (low as i128 + self.next_below(span) as i128) as i64)
            .collect())
    }

    /// `n` Gaussian draws (Box-Muller, two raw draws per value)
    pub fn normal(&mut self, mean: f64, std: f64, n: usize) -> Result<Vec<f64>> {
        if !mean.is_finite() || !std.is_finite() || std < 0.0 {
            return Err(ChurnError::InvalidParameters(format!(
                "normal requires finite mean and std >= 0, got mean={mean}, std={std}"
            )));
        }
        Ok((0..n)
            .map(|_| {
                // 1 - u keeps the log argument in (0, 1].
                let u1 = 1.0 - self.next_unit();
                let u2 = self.next_unit();
                let radius = (-2.0 * u1.ln()).sqrt();
                mean + std * radius * (std::f64::consts::TAU * u2).cos()
            })
            .collect())
    }

    /// `n` independent uniform picks from `options`
    pub fn choice<T: Clone>(&mut self, options: &[T], n: usize) -> Result<Vec<T>> {
        if options.is_empty() {
            return Err(ChurnError::InvalidParameters(
                "choice requires at least one option".to_string(),
            ));
        }
        let span = options.len() as u64;
        Ok((0..n)
            .map(|_| options[self.next_below(span) as usize].clone())
            .collect())
    }

    /// One independent trial per probability; `true` when the trial succeeds
    pub fn bernoulli(&mut self, probabilities: &[f64]) -> Result<Vec<bool>> {
        if let Some((idx, p)) = probabilities
            .iter()
            .enumerate()
            .find(|(_, p)| !(0.0..=1.0).contains(*p))
        {
            return Err(ChurnError::InvalidParameters(format!(
                "bernoulli probability at index {idx} outside [0, 1]: {p}"
            )));
        }
        Ok(probabilities
            .iter()
            .map(|&p| self.next_unit() < p)
            .collect())
    }

    /// Fisher-Yates permutation of `0..n`
    pub fn shuffle_indices(&mut self, n: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..n).collect();
        for i in (1..n).rev() {
            let j = self.next_below(i as u64 + 1) as usize;
            indices.swap(i, j);
        }
        indices
    }
}

fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
