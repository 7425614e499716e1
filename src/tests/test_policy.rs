use ndarray::array;

use crate::env::gridworld::{GridWorld, StartMode};
use crate::env::Environment;
use crate::policy::{argmax, EpsilonGreedy};

#[test]
fn test_argmax_picks_largest() {
    assert_eq!(argmax(array![0.1, 0.9, 0.3].view()), 1);
    assert_eq!(argmax(array![2.0, -1.0].view()), 0);
}

#[test]
fn test_argmax_ties_resolve_to_first_index() {
    assert_eq!(argmax(array![1.0, 1.0, 1.0].view()), 0);
    assert_eq!(argmax(array![0.0, 5.0, 5.0].view()), 1);
}

#[test]
fn test_greedy_selection_when_epsilon_zero() {
    let env = GridWorld::new(4, StartMode::Static);
    let mut policy = EpsilonGreedy::new(0.0);
    policy.epsilon = 0.0;

    for _ in 0..20 {
        assert_eq!(policy.select(array![0.0, 0.0, 3.0, 1.0].view(), &env), 2);
    }
}

#[test]
fn test_random_selection_when_epsilon_one() {
    let env = GridWorld::new(4, StartMode::Static);
    let mut policy = EpsilonGreedy::new(0.1);

    // Epsilon starts at 1.0: selection ignores the (degenerate) values and
    // must still produce in-range actions.
    for _ in 0..50 {
        let action = policy.select(array![9.0, 0.0, 0.0, 0.0].view(), &env);
        assert!(action < env.action_count());
    }
}

#[test]
fn test_anneal_is_linear_and_monotonic() {
    let mut policy = EpsilonGreedy::new(0.1);
    let num_episodes = 100;
    let step = (1.0 - 0.1) / num_episodes as f32;

    policy.anneal(num_episodes);
    assert!((policy.epsilon - (1.0 - step)).abs() < 1e-6);

    let mut previous = policy.epsilon;
    for _ in 0..(2 * num_episodes) {
        policy.anneal(num_episodes);
        assert!(policy.epsilon <= previous);
        assert!(policy.epsilon >= policy.epsilon_min);
        previous = policy.epsilon;
    }
    assert!((policy.epsilon - 0.1).abs() < 1e-6);
}

#[test]
fn test_anneal_holds_at_floor() {
    let mut policy = EpsilonGreedy::new(0.2);
    for _ in 0..1000 {
        policy.anneal(10);
    }
    assert!((policy.epsilon - 0.2).abs() < 1e-6);
    policy.anneal(10);
    assert!((policy.epsilon - 0.2).abs() < 1e-6);
}
