use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::env::data::PriceSeries;
use crate::env::{Environment, Step};
use crate::error::{DeepqError, Result};
use crate::network::NeuralNetwork;
use crate::optimizer::{Adam, OptimizerWrapper};

/// What a trade does with the portfolio.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeKind {
    Hold,
    Buy,
    Sell,
    /// Convert coins into the savings balance at the day's price, minus fees.
    /// Savings count toward portfolio value but can never be traded again.
    Save,
}

/// One entry of the discrete action grid: a trade kind plus the fraction of
/// the relevant balance it moves.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TradeAction {
    pub kind: TradeKind,
    pub amount: f32,
}

impl TradeAction {
    pub const fn new(kind: TradeKind, amount: f32) -> Self {
        TradeAction { kind, amount }
    }
}

/// The default 13-action grid: hold, and buy/sell at six fractions.
pub fn default_actions() -> Vec<TradeAction> {
    let mut actions = vec![TradeAction::new(TradeKind::Hold, 1.0)];
    for &amount in &[0.1, 0.2, 0.3, 0.5, 0.7, 1.0] {
        actions.push(TradeAction::new(TradeKind::Buy, amount));
    }
    for &amount in &[0.1, 0.2, 0.3, 0.5, 0.7, 1.0] {
        actions.push(TradeAction::new(TradeKind::Sell, amount));
    }
    actions
}

/// Portfolio state on one day. A plain value type: every step constructs the
/// next portfolio from the current one, the two never share storage.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    pub day: usize,
    pub cash: f32,
    pub coins: f32,
    /// Currency locked away by `Save` actions; part of the value, never traded.
    pub saves: f32,
    /// Mark-to-market value at the day's opening price, savings included.
    pub value: f32,
}

/// Trading environment over a fixed window of historical daily prices.
///
/// Each step advances one day and executes one action from the discrete grid.
/// Buys, sells, and saves pay a proportional fee on the amount moved; saved
/// currency stays in the portfolio value but is out of the market for good.
/// The reward is the scaled relative change of the portfolio value across the
/// step, and the episode ends on the last day of the window.
///
/// Buying with no cash, or selling or saving with no coins, moves zero units
/// either way; such actions are reported invalid so exploration skips them,
/// and a greedy pick of one simply executes as a no-op.
pub struct TradingEnv {
    series: PriceSeries,
    actions: Vec<TradeAction>,
    fee: f32,
    reward_scale: f32,
    initial: Portfolio,
    current: Portfolio,
}

impl TradingEnv {
    /// Start a window with the given cash/coin balances on day 0.
    pub fn new(series: PriceSeries, fee: f32, cash: f32, coins: f32) -> Result<Self> {
        if !(0.0..1.0).contains(&fee) {
            return Err(DeepqError::invalid_parameter(
                "fee",
                "must be in [0, 1)",
            ));
        }
        let open = series.open(0);
        let initial = Portfolio {
            day: 0,
            cash,
            coins,
            saves: 0.0,
            value: cash + open * coins,
        };
        Ok(TradingEnv {
            series,
            actions: default_actions(),
            fee,
            reward_scale: 100.0,
            initial,
            current: initial,
        })
    }

    pub fn with_actions(mut self, actions: Vec<TradeAction>) -> Self {
        assert!(!actions.is_empty(), "action grid must not be empty");
        self.actions = actions;
        self
    }

    pub fn with_reward_scale(mut self, scale: f32) -> Self {
        self.reward_scale = scale;
        self
    }

    pub fn portfolio(&self) -> Portfolio {
        self.current
    }

    pub fn actions(&self) -> &[TradeAction] {
        &self.actions
    }

    pub fn series(&self) -> &PriceSeries {
        &self.series
    }

    /// The default approximator architecture for this environment.
    pub fn default_network(&self) -> NeuralNetwork {
        NeuralNetwork::with_relu_hidden(
            &[self.state_dim(), 150, 200, 150, 50, self.action_count()],
            OptimizerWrapper::Adam(Adam::default_params()),
        )
    }

    fn done(&self) -> bool {
        self.current.day == self.series.last_day()
    }
}

impl Environment for TradingEnv {
    fn reset(&mut self) -> Array1<f32> {
        self.current = self.initial;
        self.encode()
    }

    fn step(&mut self, action: usize) -> Result<Step> {
        let trade = *self
            .actions
            .get(action)
            .ok_or(DeepqError::InvalidAction {
                action,
                max_actions: self.actions.len(),
            })?;
        if self.done() {
            return Err(DeepqError::TrainingError(
                "step past the end of the price window".to_string(),
            ));
        }

        let day = self.current.day + 1;
        let price = self.series.open(day);
        let mut next = self.current;
        next.day = day;

        match trade.kind {
            TradeKind::Hold => {}
            TradeKind::Buy => {
                let spent = trade.amount * self.current.cash;
                next.cash = self.current.cash - spent;
                next.coins = self.current.coins + (spent - self.fee * spent) / price;
            }
            TradeKind::Sell => {
                let sold = trade.amount * self.current.coins;
                next.coins = self.current.coins - sold;
                next.cash = self.current.cash + (sold - self.fee * sold) * price;
            }
            TradeKind::Save => {
                let moved = trade.amount * self.current.coins;
                next.coins = self.current.coins - moved;
                next.saves = self.current.saves + (moved - self.fee * moved) * price;
            }
        }
        next.value = next.cash + price * next.coins + next.saves;

        let reward = if self.current.value > f32::EPSILON {
            self.reward_scale * (next.value - self.current.value) / self.current.value
        } else {
            0.0
        };
        self.current = next;

        Ok(Step {
            state: self.encode(),
            reward,
            done: self.done(),
        })
    }

    fn encode(&self) -> Array1<f32> {
        let record = self.series.record(self.current.day);
        let features = [
            self.current.cash,
            self.current.coins,
            self.current.value,
            record.open,
            record.high,
            record.low,
            record.close,
            record.volume / 5e6,
        ];
        Array1::from_iter(features.iter().map(|&f| f * 1e-4))
    }

    fn state_dim(&self) -> usize {
        8
    }

    fn action_count(&self) -> usize {
        self.actions.len()
    }

    fn is_valid(&self, action: usize) -> bool {
        match self.actions.get(action) {
            Some(trade) => match trade.kind {
                TradeKind::Hold => true,
                TradeKind::Buy => self.current.cash > 0.0,
                TradeKind::Sell | TradeKind::Save => self.current.coins > 0.0,
            },
            None => false,
        }
    }
}
