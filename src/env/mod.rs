//! Simulated environments the training engine interacts with.

pub mod data;
pub mod gridworld;
pub mod trading;

use ndarray::Array1;

use crate::error::Result;

/// Outcome of one environment step.
#[derive(Clone, Debug)]
pub struct Step {
    /// Encoding of the state after the action was applied.
    pub state: Array1<f32>,
    pub reward: f32,
    pub done: bool,
}

/// A simulated environment: owns its state, applies actions, computes rewards
/// and termination, and encodes its state numerically for the approximator.
///
/// Actions form a fixed, finite set indexed `0..action_count()`. State
/// encodings have a fixed shape per instance and are produced fresh on every
/// query; `encode` must not mutate anything.
pub trait Environment {
    /// Reinitialize to a starting configuration and return the initial encoding.
    fn reset(&mut self) -> Array1<f32>;

    /// Apply an action, advance the internal clock, and report the outcome.
    /// Fails with `InvalidAction` when the index is outside the action set.
    fn step(&mut self, action: usize) -> Result<Step>;

    /// Numeric encoding of the current state. Pure and idempotent.
    fn encode(&self) -> Array1<f32>;

    /// Length of the state encoding.
    fn state_dim(&self) -> usize;

    /// Size of the action set.
    fn action_count(&self) -> usize;

    /// Whether an action is worth taking from the current state. Used to mask
    /// structural no-ops out of random exploration; defaults to everything.
    fn is_valid(&self, _action: usize) -> bool {
        true
    }
}
