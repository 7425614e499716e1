use ndarray::{array, Array1, Array2, ArrayView1, ArrayView2};
use std::sync::atomic::Ordering;

use crate::approximator::{Approximator, WeightSet};
use crate::env::gridworld::{GridWorld, StartMode};
use crate::env::{Environment, Step};
use crate::error::{DeepqError, Result};
use crate::network::NeuralNetwork;
use crate::optimizer::{OptimizerWrapper, SGD};
use crate::target::TargetNetwork;
use crate::trainer::{Outcome, Trainer, TrainerConfig};

/// Deterministic environment: a short corridor with scripted rewards, the
/// last of which is terminal. Any action advances one position.
struct CorridorEnv {
    rewards: Vec<f32>,
    pos: usize,
}

impl CorridorEnv {
    fn new(rewards: Vec<f32>) -> Self {
        CorridorEnv { rewards, pos: 0 }
    }
}

impl Environment for CorridorEnv {
    fn reset(&mut self) -> Array1<f32> {
        self.pos = 0;
        self.encode()
    }

    fn step(&mut self, _action: usize) -> Result<Step> {
        self.pos += 1;
        Ok(Step {
            state: self.encode(),
            reward: self.rewards[self.pos - 1],
            done: self.pos == self.rewards.len(),
        })
    }

    fn encode(&self) -> Array1<f32> {
        array![self.pos as f32]
    }

    fn state_dim(&self) -> usize {
        1
    }

    fn action_count(&self) -> usize {
        2
    }
}

/// Approximator that always predicts the same action values and never learns.
#[derive(Clone)]
struct ConstantApproximator {
    values: Array1<f32>,
}

impl Approximator for ConstantApproximator {
    fn input_dim(&self) -> usize {
        1
    }

    fn output_dim(&self) -> usize {
        self.values.len()
    }

    fn predict(&mut self, _state: ArrayView1<f32>) -> Array1<f32> {
        self.values.clone()
    }

    fn predict_batch(&mut self, states: ArrayView2<f32>) -> Array2<f32> {
        let mut out = Array2::zeros((states.nrows(), self.values.len()));
        for mut row in out.rows_mut() {
            row.assign(&self.values);
        }
        out
    }

    fn fit_batch(&mut self, _: ArrayView2<f32>, _: ArrayView2<f32>, _: f32) -> f32 {
        0.0
    }

    fn weights(&self) -> WeightSet {
        WeightSet { layers: Vec::new() }
    }

    fn set_weights(&mut self, _: &WeightSet) -> Result<()> {
        Ok(())
    }
}

fn tiny_config() -> TrainerConfig {
    TrainerConfig {
        num_episodes: 1,
        gamma: 0.9,
        max_steps: 16,
        memory_capacity: 64,
        replay_threshold: 32,
        batch_size: 8,
        ..TrainerConfig::default()
    }
}

#[test]
fn test_bellman_targets_stored_in_memory() {
    let env = CorridorEnv::new(vec![-0.5, 5.0]);
    let network = ConstantApproximator { values: array![1.0, 2.0] };

    let mut trainer = Trainer::new(env, network, tiny_config()).unwrap();
    trainer.train().unwrap();

    let samples: Vec<_> = trainer.memory().iter().collect();
    assert_eq!(samples.len(), 2);

    // Non-terminal: reward + gamma * max_next_q on the chosen entry, the
    // other entry untouched from the prediction.
    let replaced: Vec<f32> = samples[0]
        .target
        .iter()
        .zip(array![1.0, 2.0].iter())
        .filter(|(t, q)| t != q)
        .map(|(&t, _)| t)
        .collect();
    assert_eq!(replaced.len(), 1);
    assert!((replaced[0] - (-0.5 + 0.9 * 2.0)).abs() < 1e-6);

    // Terminal: the raw reward, no bootstrap term.
    let replaced: Vec<f32> = samples[1]
        .target
        .iter()
        .zip(array![1.0, 2.0].iter())
        .filter(|(t, q)| t != q)
        .map(|(&t, _)| t)
        .collect();
    assert_eq!(replaced.len(), 1);
    assert_eq!(replaced[0], 5.0);
}

#[test]
fn test_non_finite_prediction_aborts_training() {
    let env = CorridorEnv::new(vec![1.0]);
    let network = ConstantApproximator { values: array![f32::NAN, 0.0] };

    let mut trainer = Trainer::new(env, network, tiny_config()).unwrap();
    match trainer.train() {
        Err(DeepqError::NumericalError(_)) => {}
        other => panic!("expected NumericalError, got {:?}", other.map(|r| r.wins)),
    }
}

#[test]
fn test_target_network_stale_between_syncs() {
    let mut live = NeuralNetwork::with_relu_hidden(&[2, 8, 2], OptimizerWrapper::SGD(SGD::new()));
    let mut target = TargetNetwork::from_live(&live).unwrap();

    let input = array![0.4, -0.2];
    let before = target.predict(input.view());

    // Train the live network hard; the target must not move until synced.
    let states = array![[0.4, -0.2], [1.0, 1.0]];
    let targets = array![[5.0, -5.0], [-5.0, 5.0]];
    for _ in 0..50 {
        live.train_minibatch(states.view(), targets.view(), 0.1);
    }
    assert_eq!(target.predict(input.view()), before);

    target.sync(&live).unwrap();
    assert_eq!(target.predict(input.view()), live.forward(input.view()));
}

#[test]
fn test_epsilon_annealed_once_per_episode() {
    let env = CorridorEnv::new(vec![1.0]);
    let network = ConstantApproximator { values: array![0.0, 0.0] };

    let config = TrainerConfig {
        num_episodes: 10,
        epsilon_min: 0.1,
        ..tiny_config()
    };
    let mut trainer = Trainer::new(env, network, config).unwrap();
    let report = trainer.train().unwrap();

    assert_eq!(report.episodes.len(), 10);
    let step = (1.0 - 0.1) / 10.0;
    let mut expected: f32 = 1.0;
    for record in &report.episodes {
        expected = (expected - step).max(0.1f32);
        assert!((record.epsilon - expected).abs() < 1e-5);
    }
}

#[test]
fn test_outcomes_classified_by_terminal_reward() {
    let win_env = CorridorEnv::new(vec![-1.0, 10.0]);
    let network = ConstantApproximator { values: array![0.0, 0.0] };
    let mut trainer = Trainer::new(win_env, network.clone(), tiny_config()).unwrap();
    let report = trainer.train().unwrap();
    assert_eq!(report.episodes[0].outcome, Outcome::Win);
    assert_eq!(report.wins, 1);

    let loss_env = CorridorEnv::new(vec![-1.0, -10.0]);
    let mut trainer = Trainer::new(loss_env, network, tiny_config()).unwrap();
    let report = trainer.train().unwrap();
    assert_eq!(report.episodes[0].outcome, Outcome::Loss);
    assert_eq!(report.losses, 1);
}

#[test]
fn test_step_budget_forces_timeout_counted_as_loss() {
    // Corridor longer than the step budget: the episode never finishes.
    let env = CorridorEnv::new(vec![-0.1; 100]);
    let network = ConstantApproximator { values: array![0.0, 0.0] };

    let config = TrainerConfig { max_steps: 5, ..tiny_config() };
    let mut trainer = Trainer::new(env, network, config).unwrap();
    let report = trainer.train().unwrap();

    assert_eq!(report.episodes[0].outcome, Outcome::TimedOut);
    assert_eq!(report.episodes[0].steps, 5);
    assert_eq!(report.losses, 1);
}

#[test]
fn test_stop_flag_halts_run() {
    let env = CorridorEnv::new(vec![1.0]);
    let network = ConstantApproximator { values: array![0.0, 0.0] };

    let config = TrainerConfig { num_episodes: 100, ..tiny_config() };
    let mut trainer = Trainer::new(env, network, config).unwrap();

    let stop = trainer.stop_handle();
    stop.store(true, Ordering::Relaxed);

    let report = trainer.train().unwrap();
    assert!(report.stopped);
    assert!(report.episodes.is_empty());
}

#[test]
fn test_dimension_mismatch_rejected_at_construction() {
    let env = GridWorld::new(4, StartMode::Static);
    // Wrong input width for a 4x4 grid encoding.
    let network = NeuralNetwork::with_relu_hidden(&[8, 16, 4], OptimizerWrapper::SGD(SGD::new()));
    assert!(Trainer::new(env, network, tiny_config()).is_err());
}

#[test]
fn test_config_validation() {
    let env = CorridorEnv::new(vec![1.0]);
    let network = ConstantApproximator { values: array![0.0, 0.0] };

    let config = TrainerConfig { batch_size: 0, ..TrainerConfig::default() };
    assert!(Trainer::new(env, network, config).is_err());
}
