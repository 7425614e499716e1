use log::info;
use ndarray::{Array1, ArrayView1};
use rand::rngs::ThreadRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::approximator::Approximator;
use crate::env::Environment;
use crate::error::{DeepqError, Result};
use crate::metrics::MetricsTracker;
use crate::policy::EpsilonGreedy;
use crate::replay::{ReplayMemory, TrainSample};
use crate::target::TargetNetwork;

/// How an episode ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// Terminal state with positive reward.
    Win,
    /// Terminal state with zero or negative reward.
    Loss,
    /// Step budget exhausted before a terminal state; counted as a loss.
    TimedOut,
}

impl Outcome {
    pub fn is_win(self) -> bool {
        matches!(self, Outcome::Win)
    }
}

/// Per-episode telemetry record emitted for logging and UI consumers.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EpisodeRecord {
    pub episode: usize,
    pub epsilon: f32,
    /// Most recent batch loss within the episode, if any training happened.
    pub loss: Option<f32>,
    pub reward: f32,
    pub steps: usize,
    pub outcome: Outcome,
}

/// Summary of a completed (or cooperatively stopped) training run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrainingReport {
    pub episodes: Vec<EpisodeRecord>,
    pub wins: usize,
    pub losses: usize,
    pub total_steps: usize,
    /// True when the run was halted through the stop flag.
    pub stopped: bool,
}

/// Knobs of the training run.
#[derive(Clone, Debug)]
pub struct TrainerConfig {
    pub num_episodes: usize,
    /// Discount factor for the bootstrap term.
    pub gamma: f32,
    pub learning_rate: f32,
    /// Floor of the epsilon annealing schedule.
    pub epsilon_min: f32,
    /// Per-episode step budget; exhausting it force-terminates the episode.
    pub max_steps: usize,
    /// Target-network sync cadence in environment steps.
    pub sync_every: usize,
    pub memory_capacity: usize,
    /// Training starts once the replay memory holds this many samples.
    pub replay_threshold: usize,
    pub batch_size: usize,
    /// Stddev of Gaussian noise added to network inputs; 0 disables it.
    pub observation_noise: f32,
    /// Log a progress line every this many episodes.
    pub log_every: usize,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        TrainerConfig {
            num_episodes: 1000,
            gamma: 0.9,
            learning_rate: 1e-3,
            epsilon_min: 0.1,
            max_steps: 64,
            sync_every: 4,
            memory_capacity: 1000,
            replay_threshold: 128,
            batch_size: 64,
            observation_noise: 0.0,
            log_every: 10,
        }
    }
}

impl TrainerConfig {
    fn validate(&self) -> Result<()> {
        if self.num_episodes == 0 {
            return Err(DeepqError::invalid_parameter("num_episodes", "must be positive"));
        }
        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(DeepqError::invalid_parameter("gamma", "must be in [0, 1]"));
        }
        if !(0.0..1.0).contains(&self.epsilon_min) {
            return Err(DeepqError::invalid_parameter("epsilon_min", "must be in [0, 1)"));
        }
        if self.max_steps == 0 {
            return Err(DeepqError::invalid_parameter("max_steps", "must be positive"));
        }
        if self.sync_every == 0 {
            return Err(DeepqError::invalid_parameter("sync_every", "must be positive"));
        }
        if self.batch_size == 0 || self.batch_size > self.memory_capacity {
            return Err(DeepqError::invalid_parameter(
                "batch_size",
                "must be positive and no larger than memory_capacity",
            ));
        }
        if self.replay_threshold < self.batch_size {
            return Err(DeepqError::invalid_parameter(
                "replay_threshold",
                "must be at least batch_size",
            ));
        }
        Ok(())
    }
}

/// Drives the episode/step loop: environment interaction, Bellman target
/// computation against a lagged target network, replay-gated batch training,
/// epsilon annealing, and telemetry.
///
/// A single logical thread of control owns the loop; the stop flag from
/// [`stop_handle`](Trainer::stop_handle) may be flipped from anywhere and is
/// checked between steps, abandoning the partial episode without corrupting
/// the replay memory or the network weights.
pub struct Trainer<E: Environment, N: Approximator> {
    env: E,
    network: N,
    target: TargetNetwork<N>,
    memory: ReplayMemory<TrainSample>,
    policy: EpsilonGreedy,
    metrics: MetricsTracker,
    config: TrainerConfig,
    stop: Arc<AtomicBool>,
    noise: Option<Normal<f32>>,
    rng: ThreadRng,
}

impl<E: Environment, N: Approximator + Clone> Trainer<E, N> {
    pub fn new(env: E, network: N, config: TrainerConfig) -> Result<Self> {
        config.validate()?;
        if network.input_dim() != env.state_dim() {
            return Err(DeepqError::dimension_mismatch(
                format!("network input {}", env.state_dim()),
                format!("{}", network.input_dim()),
            ));
        }
        if network.output_dim() != env.action_count() {
            return Err(DeepqError::dimension_mismatch(
                format!("network output {}", env.action_count()),
                format!("{}", network.output_dim()),
            ));
        }

        let target = TargetNetwork::from_live(&network)?;
        let noise = if config.observation_noise > 0.0 {
            Some(
                Normal::new(0.0, config.observation_noise)
                    .map_err(|e| DeepqError::invalid_parameter("observation_noise", &e.to_string()))?,
            )
        } else {
            None
        };
        let policy = EpsilonGreedy::new(config.epsilon_min);
        let memory = ReplayMemory::new(config.memory_capacity);

        Ok(Trainer {
            env,
            network,
            target,
            memory,
            policy,
            metrics: MetricsTracker::default(),
            config,
            stop: Arc::new(AtomicBool::new(false)),
            noise,
            rng: rand::thread_rng(),
        })
    }

    /// Flag that halts the run between steps when set.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    pub fn env(&self) -> &E {
        &self.env
    }

    pub fn network(&self) -> &N {
        &self.network
    }

    /// Hand the trained network back, consuming the trainer.
    pub fn into_network(self) -> N {
        self.network
    }

    pub fn metrics(&self) -> &MetricsTracker {
        &self.metrics
    }

    /// The replay memory, for inspection by tests and observers.
    pub fn memory(&self) -> &ReplayMemory<TrainSample> {
        &self.memory
    }

    pub fn epsilon(&self) -> f32 {
        self.policy.epsilon
    }

    /// Run the configured number of episodes.
    ///
    /// Fails fast on NaN/Inf in predictions or loss; approximator and
    /// environment errors propagate to the caller.
    pub fn train(&mut self) -> Result<TrainingReport> {
        let start = Instant::now();
        let mut records = Vec::with_capacity(self.config.num_episodes);
        let mut total_steps = 0usize;
        let mut stopped = false;

        'run: for episode in 0..self.config.num_episodes {
            if self.stop.load(Ordering::Relaxed) {
                stopped = true;
                break 'run;
            }

            let initial = self.env.reset();
            let mut state = self.observe(initial);
            self.metrics.start_episode();
            let mut last_loss: Option<f32> = None;
            let mut episode_reward = 0.0;
            let mut steps = 0usize;
            let outcome;

            loop {
                if self.stop.load(Ordering::Relaxed) {
                    // Abandon the partial episode.
                    stopped = true;
                    break 'run;
                }

                // Sync happens-before the predict that uses it; never mid-step.
                if total_steps % self.config.sync_every == 0 {
                    self.target.sync(&self.network)?;
                }

                let q0 = self.target.predict(state.view());
                check_finite(q0.view(), "target prediction")?;

                let action = self.policy.select(q0.view(), &self.env);
                let step = self.env.step(action)?;

                let next_state = self.observe(step.state.clone());
                let q1 = self.target.predict(next_state.view());
                check_finite(q1.view(), "target prediction")?;
                let max_next_q = q1.fold(f32::NEG_INFINITY, |a, &b| a.max(b));

                // Full action-value vector with the chosen entry replaced by
                // the Bellman target; reward only on terminal transitions.
                let mut target_vec = q0;
                target_vec[action] = if step.done {
                    step.reward
                } else {
                    step.reward + self.config.gamma * max_next_q
                };
                self.memory.push(TrainSample {
                    state: state.clone(),
                    target: target_vec,
                });

                if self.memory.is_ready(self.config.replay_threshold) {
                    if let Some((states, targets)) = self.memory.sample_batch(self.config.batch_size) {
                        let loss = self.network.fit_batch(
                            states.view(),
                            targets.view(),
                            self.config.learning_rate,
                        );
                        if !loss.is_finite() {
                            return Err(DeepqError::NumericalError(format!(
                                "non-finite loss at episode {} step {}",
                                episode, steps
                            )));
                        }
                        self.metrics.record_loss(loss);
                        last_loss = Some(loss);
                    }
                }

                self.metrics.step(step.reward);
                episode_reward += step.reward;
                steps += 1;
                total_steps += 1;
                state = next_state;

                if step.done {
                    outcome = if step.reward > 0.0 { Outcome::Win } else { Outcome::Loss };
                    break;
                }
                if steps >= self.config.max_steps {
                    outcome = Outcome::TimedOut;
                    break;
                }
            }

            self.policy.anneal(self.config.num_episodes);
            self.metrics.record_epsilon(self.policy.epsilon);
            self.metrics.end_episode(outcome.is_win());

            let record = EpisodeRecord {
                episode,
                epsilon: self.policy.epsilon,
                loss: last_loss,
                reward: episode_reward,
                steps,
                outcome,
            };
            if episode % self.config.log_every == 0 {
                info!(
                    "episode {}/{}: outcome {:?}, epsilon {:.3}, loss {:?}, win/loss {:.3}, {:.1} ms/episode",
                    episode,
                    self.config.num_episodes,
                    outcome,
                    self.policy.epsilon,
                    last_loss,
                    self.metrics.win_loss_ratio(),
                    start.elapsed().as_millis() as f64 / (episode + 1) as f64,
                );
            }
            records.push(record);
        }

        if stopped {
            info!(
                "training stopped after {} completed episodes",
                records.len()
            );
        }

        Ok(TrainingReport {
            wins: self.metrics.wins(),
            losses: self.metrics.losses(),
            total_steps,
            stopped,
            episodes: records,
        })
    }

    /// Network input for a state encoding, with optional Gaussian noise.
    /// Noise is applied here, never inside `encode`, so encodings stay pure.
    fn observe(&mut self, mut state: Array1<f32>) -> Array1<f32> {
        if let Some(noise) = &self.noise {
            state.mapv_inplace(|v| v + noise.sample(&mut self.rng));
        }
        state
    }
}

fn check_finite(values: ArrayView1<f32>, what: &str) -> Result<()> {
    if values.iter().any(|v| !v.is_finite()) {
        return Err(DeepqError::NumericalError(format!(
            "non-finite value in {}",
            what
        )));
    }
    Ok(())
}
