use ndarray::{Array1, Array2};
use rand::{thread_rng, Rng};
use std::collections::VecDeque;

/// One trainable pair as stored by the trainer: a state encoding and the full
/// action-value target vector with the chosen action's entry replaced by the
/// Bellman target.
#[derive(Clone, Debug, PartialEq)]
pub struct TrainSample {
    pub state: Array1<f32>,
    pub target: Array1<f32>,
}

/// A raw environment interaction, as formed by the trainer before target
/// computation. Immutable once created.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    pub state: Array1<f32>,
    pub action: usize,
    pub reward: f32,
    pub next_state: Array1<f32>,
    pub done: bool,
}

/// Bounded FIFO experience store.
///
/// Insertion beyond capacity evicts the oldest entry, strictly in insertion
/// order regardless of content. Sampling draws uniformly at random with
/// replacement, destroying temporal order on purpose.
#[derive(Clone)]
pub struct ReplayMemory<T> {
    buffer: VecDeque<T>,
    capacity: usize,
}

impl<T> ReplayMemory<T> {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "replay memory capacity must be positive");
        ReplayMemory {
            buffer: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, item: T) {
        if self.buffer.len() == self.capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(item);
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether enough samples have accumulated to start training.
    pub fn is_ready(&self, threshold: usize) -> bool {
        self.buffer.len() >= threshold
    }

    /// Draw `batch_size` items uniformly at random with replacement.
    /// Returns an empty vector while fewer than `batch_size` items are stored.
    pub fn sample(&self, batch_size: usize) -> Vec<&T> {
        if self.buffer.len() < batch_size {
            return Vec::new();
        }
        let mut rng = thread_rng();
        (0..batch_size)
            .map(|_| &self.buffer[rng.gen_range(0..self.buffer.len())])
            .collect()
    }

    /// Iterate in insertion order, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.buffer.iter()
    }
}

impl ReplayMemory<TrainSample> {
    /// Sample a batch and stack it into `(states, targets)` matrices ready
    /// for [`Approximator::fit_batch`](crate::approximator::Approximator::fit_batch).
    /// Returns `None` while the memory holds fewer than `batch_size` samples.
    pub fn sample_batch(&self, batch_size: usize) -> Option<(Array2<f32>, Array2<f32>)> {
        let samples = self.sample(batch_size);
        if samples.is_empty() {
            return None;
        }
        let state_dim = samples[0].state.len();
        let target_dim = samples[0].target.len();
        let mut states = Array2::zeros((batch_size, state_dim));
        let mut targets = Array2::zeros((batch_size, target_dim));
        for (i, sample) in samples.iter().enumerate() {
            states.row_mut(i).assign(&sample.state);
            targets.row_mut(i).assign(&sample.target);
        }
        Some((states, targets))
    }
}
