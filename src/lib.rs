//! # deepq - Deep Q-Learning Training Engine
//!
//! deepq is a Rust library implementing the DQN training loop that powers
//! grid-navigation and trading agents: a simulated environment abstraction,
//! a bounded experience-replay memory, a periodically synchronized target
//! network, an epsilon-greedy exploration schedule, and an online Bellman
//! update loop that stays numerically checked and resource-bounded across
//! thousands of episodes.
//!
//! ## Key Features
//!
//! - **Environments**: grid navigation and historical-price trading, behind
//!   one `Environment` trait
//! - **Experience Replay**: bounded FIFO memory with uniform random sampling
//! - **Target Network**: lagged weight snapshots for stable Bellman targets
//! - **Opaque Approximator**: any fit/predict/weights implementation plugs
//!   in; a dense network with SGD/Adam ships as the default
//! - **Cooperative Stop**: training halts cleanly between steps on a flag
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use deepq::env::gridworld::{GridWorld, StartMode};
//! use deepq::trainer::{Trainer, TrainerConfig};
//!
//! let env = GridWorld::new(4, StartMode::Static);
//! let network = env.default_network();
//!
//! let config = TrainerConfig {
//!     num_episodes: 1000,
//!     observation_noise: 0.01,
//!     ..TrainerConfig::default()
//! };
//! let mut trainer = Trainer::new(env, network, config).unwrap();
//! let report = trainer.train().unwrap();
//! println!("wins: {}, losses: {}", report.wins, report.losses);
//! ```
//!
//! ## Module Organization
//!
//! - [`approximator`] - The opaque function-approximator contract
//! - [`env`] - Environments (grid world, trading) and the data feed
//! - [`error`] - Error types and result handling
//! - [`metrics`] - Training telemetry windows
//! - [`network`] - Default dense-network approximator
//! - [`optimizer`] - SGD and Adam update rules
//! - [`policy`] - Epsilon-greedy exploration
//! - [`replay`] - Bounded experience-replay memory
//! - [`target`] - Target-network holder
//! - [`trainer`] - The episode/step training loop

pub mod approximator;
pub mod env;
pub mod error;
pub mod metrics;
pub mod network;
pub mod optimizer;
pub mod policy;
pub mod replay;
pub mod target;
pub mod trainer;

#[cfg(test)]
mod tests;
