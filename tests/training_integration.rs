//! End-to-end training runs over the bundled environments.

use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration;

use deepq::env::data::{PriceRecord, PriceSeries};
use deepq::env::gridworld::{GridWorld, StartMode};
use deepq::env::trading::TradingEnv;
use deepq::env::Environment;
use deepq::trainer::{Trainer, TrainerConfig};

fn short_config(num_episodes: usize) -> TrainerConfig {
    TrainerConfig {
        num_episodes,
        max_steps: 32,
        memory_capacity: 256,
        replay_threshold: 16,
        batch_size: 16,
        log_every: usize::MAX,
        ..TrainerConfig::default()
    }
}

#[test]
fn gridworld_short_run_produces_full_report() {
    let env = GridWorld::new(4, StartMode::Static);
    let network = env.default_network();

    let mut trainer = Trainer::new(env, network, short_config(20)).unwrap();
    let report = trainer.train().unwrap();

    assert!(!report.stopped);
    assert_eq!(report.episodes.len(), 20);
    assert_eq!(report.wins + report.losses, 20);
    assert_eq!(
        report.total_steps,
        report.episodes.iter().map(|e| e.steps).sum::<usize>()
    );
    for record in &report.episodes {
        assert!(record.steps >= 1 && record.steps <= 32);
    }
}

#[test]
fn epsilon_decreases_monotonically_across_episodes() {
    let env = GridWorld::new(4, StartMode::RandomAgent);
    let network = env.default_network();

    let mut trainer = Trainer::new(env, network, short_config(30)).unwrap();
    let report = trainer.train().unwrap();

    let mut previous = 1.0f32;
    for record in &report.episodes {
        assert!(record.epsilon <= previous);
        assert!(record.epsilon >= 0.1 - 1e-6);
        previous = record.epsilon;
    }
}

#[test]
fn losses_appear_once_replay_is_warm() {
    let env = GridWorld::new(4, StartMode::Static);
    let network = env.default_network();

    let config = TrainerConfig {
        replay_threshold: 16,
        ..short_config(30)
    };
    let mut trainer = Trainer::new(env, network, config).unwrap();
    let report = trainer.train().unwrap();

    // Early episodes run on an empty memory; later ones must have trained.
    assert!(report.episodes.iter().any(|e| e.loss.is_some()));
    for record in report.episodes.iter().filter_map(|e| e.loss) {
        assert!(record.is_finite());
    }
}

#[test]
fn stop_flag_halts_run_from_another_thread() {
    let env = GridWorld::new(4, StartMode::Static);
    let network = env.default_network();

    let mut trainer = Trainer::new(env, network, short_config(100_000)).unwrap();
    let stop = trainer.stop_handle();

    let handle = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        stop.store(true, Ordering::Relaxed);
    });

    let report = trainer.train().unwrap();
    handle.join().unwrap();

    assert!(report.stopped);
    assert!(report.episodes.len() < 100_000);
}

fn synthetic_series(days: usize) -> PriceSeries {
    let records = (0..days)
        .map(|i| {
            let open = 100.0 + 10.0 * ((i as f32) * 0.7).sin();
            PriceRecord {
                date: format!("2021-01-{:02}", i + 1),
                open,
                high: open * 1.02,
                low: open * 0.98,
                close: open * 1.01,
                volume: 2e6,
            }
        })
        .collect();
    PriceSeries::new(records).unwrap()
}

#[test]
fn trading_short_run_stays_within_window() {
    let series = synthetic_series(20);
    let env = TradingEnv::new(series, 0.025, 10_000.0, 0.0).unwrap();
    let network = env.default_network();

    let config = TrainerConfig {
        max_steps: 19,
        ..short_config(10)
    };
    let mut trainer = Trainer::new(env, network, config).unwrap();
    let report = trainer.train().unwrap();

    assert_eq!(report.episodes.len(), 10);
    for record in &report.episodes {
        // The window has 19 tradable days at most.
        assert!(record.steps <= 19);
    }

    // Cash and coins never go negative no matter what the policy did.
    let portfolio = trainer.env().portfolio();
    assert!(portfolio.cash >= 0.0);
    assert!(portfolio.coins >= 0.0);
}

#[test]
fn trained_network_survives_handoff() {
    let env = GridWorld::new(4, StartMode::Static);
    let network = env.default_network();

    let mut trainer = Trainer::new(env, network, short_config(5)).unwrap();
    trainer.train().unwrap();

    let mut network = trainer.into_network();
    let world = GridWorld::new(4, StartMode::Static);
    let q = network.forward(world.encode().view());
    assert_eq!(q.len(), world.action_count());
    assert!(q.iter().all(|v| v.is_finite()));
}
