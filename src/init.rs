//! Numeric initialization strategies for host buffers.
//!
//! Weight matrices get small uniform-random values (default interval
//! `[-0.08, 0.08)`), input vectors get random vocabulary indices or 0/1
//! fills. All fills traverse the buffer in column-major order.

use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use crate::config::InitConfig;
use crate::matrix::{Element, HostMatrix};

#[derive(Error, Debug)]
pub enum InitError {
    #[error("invalid uniform interval: lower {lower} must be less than upper {upper}")]
    InvalidInterval { lower: f64, upper: f64 },
}

/// Pseudo-random initializer.
///
/// Seedable for reproducible debug runs; unseeded runs draw entropy from the
/// OS.
#[derive(Debug)]
pub struct Initializer {
    rng: StdRng,
    lower: f64,
    upper: f64,
}

impl Initializer {
    /// Build an initializer, rejecting a degenerate or reversed interval.
    pub fn new(config: &InitConfig) -> Result<Self, InitError> {
        // `!(lower < upper)` also rejects NaN bounds.
        if !(config.lower < config.upper) {
            return Err(InitError::InvalidInterval {
                lower: config.lower,
                upper: config.upper,
            });
        }

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            rng,
            lower: config.lower,
            upper: config.upper,
        })
    }

    /// The configured uniform interval `[lower, upper)`.
    pub fn interval(&self) -> (f64, f64) {
        (self.lower, self.upper)
    }

    /// Fill with uniform-random values in the configured interval.
    ///
    /// Works for either f32 or f64; use f32 for performance, f64 for
    /// gradient checking.
    pub fn fill_uniform<T: Element>(&mut self, matrix: &mut HostMatrix<T>) {
        let dist = Uniform::new(self.lower, self.upper);
        for j in 0..matrix.cols() {
            for i in 0..matrix.rows() {
                matrix.set(i, j, T::from_f64(dist.sample(&mut self.rng)));
            }
        }
    }

    /// Fill with random vocabulary indices in `[0, vocab_size)`.
    pub fn fill_vocab(&mut self, vector: &mut HostMatrix<i32>, vocab_size: usize) {
        let dist = Uniform::new(0.0, 1.0);
        for j in 0..vector.cols() {
            for i in 0..vector.rows() {
                let idx = (vocab_size as f64 * dist.sample(&mut self.rng)) as i32;
                vector.set(i, j, idx);
            }
        }
    }

    /// Fill with random 0/1 values.
    pub fn fill_binary(&mut self, vector: &mut HostMatrix<i32>) {
        for j in 0..vector.cols() {
            for i in 0..vector.rows() {
                vector.set(i, j, self.rng.gen_range(0..2));
            }
        }
    }
}
