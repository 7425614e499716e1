use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::error::Result;

/// Bounded windows of training telemetry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingMetrics {
    /// Most recent batch losses.
    pub losses: VecDeque<f32>,
    /// Accumulated reward per episode.
    pub episode_rewards: VecDeque<f32>,
    /// Steps per episode.
    pub episode_lengths: VecDeque<usize>,
    /// Epsilon at each episode boundary.
    pub epsilons: VecDeque<f32>,
}

impl TrainingMetrics {
    pub fn new(history_size: usize) -> Self {
        TrainingMetrics {
            losses: VecDeque::with_capacity(history_size),
            episode_rewards: VecDeque::with_capacity(history_size),
            episode_lengths: VecDeque::with_capacity(history_size),
            epsilons: VecDeque::with_capacity(history_size),
        }
    }
}

/// Tracks telemetry during a training run. Read-only for the update rule
/// itself; the trainer records into it and callers poll it.
pub struct MetricsTracker {
    metrics: TrainingMetrics,
    history_size: usize,

    current_episode_reward: f32,
    current_episode_length: usize,
    episode_count: usize,
    total_steps: usize,

    wins: usize,
    losses: usize,
}

fn push_bounded<T>(window: &mut VecDeque<T>, value: T, history_size: usize) {
    if window.len() >= history_size {
        window.pop_front();
    }
    window.push_back(value);
}

impl MetricsTracker {
    pub fn new(history_size: usize) -> Self {
        MetricsTracker {
            metrics: TrainingMetrics::new(history_size),
            history_size,
            current_episode_reward: 0.0,
            current_episode_length: 0,
            episode_count: 0,
            total_steps: 0,
            wins: 0,
            losses: 0,
        }
    }

    /// Record a training loss.
    pub fn record_loss(&mut self, loss: f32) {
        push_bounded(&mut self.metrics.losses, loss, self.history_size);
    }

    /// Record epsilon at an episode boundary.
    pub fn record_epsilon(&mut self, epsilon: f32) {
        push_bounded(&mut self.metrics.epsilons, epsilon, self.history_size);
    }

    /// Start a new episode.
    pub fn start_episode(&mut self) {
        self.current_episode_reward = 0.0;
        self.current_episode_length = 0;
    }

    /// Record a step within an episode.
    pub fn step(&mut self, reward: f32) {
        self.current_episode_reward += reward;
        self.current_episode_length += 1;
        self.total_steps += 1;
    }

    /// End the current episode with a positive or negative terminal outcome.
    pub fn end_episode(&mut self, won: bool) {
        push_bounded(
            &mut self.metrics.episode_rewards,
            self.current_episode_reward,
            self.history_size,
        );
        push_bounded(
            &mut self.metrics.episode_lengths,
            self.current_episode_length,
            self.history_size,
        );
        self.episode_count += 1;
        if won {
            self.wins += 1;
        } else {
            self.losses += 1;
        }
    }

    pub fn metrics(&self) -> &TrainingMetrics {
        &self.metrics
    }

    pub fn episode_count(&self) -> usize {
        self.episode_count
    }

    pub fn total_steps(&self) -> usize {
        self.total_steps
    }

    pub fn wins(&self) -> usize {
        self.wins
    }

    pub fn losses(&self) -> usize {
        self.losses
    }

    /// Wins per loss over the whole run; `wins` when nothing was lost yet.
    pub fn win_loss_ratio(&self) -> f32 {
        if self.losses == 0 {
            self.wins as f32
        } else {
            self.wins as f32 / self.losses as f32
        }
    }

    /// Average of the most recent `window` losses.
    pub fn avg_loss(&self, window: usize) -> Option<f32> {
        if self.metrics.losses.is_empty() {
            return None;
        }
        let n = window.min(self.metrics.losses.len());
        let sum: f32 = self.metrics.losses.iter().rev().take(n).sum();
        Some(sum / n as f32)
    }

    /// Average of the most recent `window` episode rewards.
    pub fn avg_episode_reward(&self, window: usize) -> Option<f32> {
        if self.metrics.episode_rewards.is_empty() {
            return None;
        }
        let n = window.min(self.metrics.episode_rewards.len());
        let sum: f32 = self.metrics.episode_rewards.iter().rev().take(n).sum();
        Some(sum / n as f32)
    }

    /// Save the telemetry windows to a JSON file.
    pub fn save(&self, path: &str) -> Result<()> {
        let serialized = serde_json::to_string_pretty(&self.metrics)?;
        std::fs::write(path, serialized)?;
        Ok(())
    }

    /// Load telemetry windows from a JSON file.
    pub fn load(&mut self, path: &str) -> Result<()> {
        let data = std::fs::read_to_string(path)?;
        self.metrics = serde_json::from_str(&data)?;
        Ok(())
    }
}

impl Default for MetricsTracker {
    fn default() -> Self {
        Self::new(1000)
    }
}
