use ndarray::ArrayView1;
use rand::seq::SliceRandom;
use rand::{rngs::ThreadRng, Rng};

use crate::env::Environment;

/// Epsilon-greedy action selection with linear per-episode annealing.
///
/// Exploration draws only from actions the environment reports as valid, so
/// structural no-ops (selling with nothing to sell) do not eat random steps.
/// The greedy branch takes a plain argmax over the supplied action values,
/// resolving ties by first index.
pub struct EpsilonGreedy {
    pub epsilon: f32,
    pub epsilon_min: f32,
    rng: ThreadRng,
}

impl EpsilonGreedy {
    /// Start fully exploratory (`epsilon = 1.0`) with the given floor.
    pub fn new(epsilon_min: f32) -> Self {
        EpsilonGreedy {
            epsilon: 1.0,
            epsilon_min,
            rng: rand::thread_rng(),
        }
    }

    /// Pick an action index for the current state given its action values.
    pub fn select<E: Environment>(&mut self, q_values: ArrayView1<f32>, env: &E) -> usize {
        if self.rng.gen::<f32>() < self.epsilon {
            self.random_valid(env)
        } else {
            argmax(q_values)
        }
    }

    /// Uniformly random action among the currently valid ones.
    pub fn random_valid<E: Environment>(&mut self, env: &E) -> usize {
        let valid: Vec<usize> = (0..env.action_count())
            .filter(|&a| env.is_valid(a))
            .collect();
        match valid.choose(&mut self.rng) {
            Some(&a) => a,
            // Every action masked: fall back to the full set.
            None => self.rng.gen_range(0..env.action_count()),
        }
    }

    /// Linear decay, applied once per completed episode:
    /// `epsilon -= (1 - epsilon_min) / num_episodes`, floored at `epsilon_min`.
    pub fn anneal(&mut self, num_episodes: usize) {
        if num_episodes == 0 {
            return;
        }
        let step = (1.0 - self.epsilon_min) / num_episodes as f32;
        self.epsilon = (self.epsilon - step).max(self.epsilon_min);
    }
}

/// Index of the largest value, first index on ties.
pub fn argmax(values: ArrayView1<f32>) -> usize {
    let mut best = 0;
    let mut best_value = f32::NEG_INFINITY;
    for (i, &v) in values.iter().enumerate() {
        if v > best_value {
            best = i;
            best_value = v;
        }
    }
    best
}
