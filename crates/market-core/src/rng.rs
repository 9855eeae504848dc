//! Random Sources
//!
//! The production failure trial draws from an injected source so runs can be
//! reproduced from a seed and tests can script exact outcomes.

use bevy_ecs::prelude::*;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Uniform draws in `[0, 1)`.
pub trait RandomSource {
    fn next_uniform(&mut self) -> f64;
}

/// Seeded random number generator resource
#[derive(Resource, Debug, Clone)]
pub struct SimRng(pub SmallRng);

impl SimRng {
    pub fn from_seed(seed: u64) -> Self {
        Self(SmallRng::seed_from_u64(seed))
    }
}

impl RandomSource for SimRng {
    fn next_uniform(&mut self) -> f64 {
        self.0.gen::<f64>()
    }
}

/// Replays a fixed sequence of draws, wrapping around at the end.
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    draws: Vec<f64>,
    cursor: usize,
}

impl ScriptedSource {
    /// An empty script behaves like a source that always draws `0.0`.
    pub fn new(draws: impl Into<Vec<f64>>) -> Self {
        Self {
            draws: draws.into(),
            cursor: 0,
        }
    }

    /// Number of draws taken so far.
    pub fn draws_taken(&self) -> usize {
        self.cursor
    }
}

impl RandomSource for ScriptedSource {
    fn next_uniform(&mut self) -> f64 {
        if self.draws.is_empty() {
            self.cursor += 1;
            return 0.0;
        }
        let value = self.draws[self.cursor % self.draws.len()];
        self.cursor += 1;
        value
    }
}

/// Always returns the same draw.
///
/// `FixedSource(1.0)` never triggers a failure trial, since every
/// `failure_prob` is at most `1.0` and the trial fires on `draw < failure_prob`.
#[derive(Debug, Clone, Copy)]
pub struct FixedSource(pub f64);

impl FixedSource {
    pub fn never_fail() -> Self {
        Self(1.0)
    }

    pub fn always_fail() -> Self {
        Self(0.0)
    }
}

impl RandomSource for FixedSource {
    fn next_uniform(&mut self) -> f64 {
        self.0
    }
}
