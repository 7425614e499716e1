use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

use crate::approximator::Approximator;
use crate::error::Result;

/// A lagged snapshot of the live approximator used to compute stable Bellman
/// targets.
///
/// Bootstrapping from the same network that is being trained makes every
/// update shift its own target; freezing a copy for several steps breaks
/// that feedback loop. `sync` replaces the snapshot through a deep-copied
/// [`WeightSet`](crate::approximator::WeightSet), so training the live
/// network between syncs never changes the holder's outputs.
pub struct TargetNetwork<N: Approximator> {
    network: N,
}

impl<N: Approximator + Clone> TargetNetwork<N> {
    /// Snapshot the live network as the initial target.
    pub fn from_live(live: &N) -> Result<Self> {
        let mut network = live.clone();
        network.set_weights(&live.weights())?;
        Ok(TargetNetwork { network })
    }
}

impl<N: Approximator> TargetNetwork<N> {
    /// Overwrite the snapshot from the live network's current weights.
    pub fn sync(&mut self, live: &N) -> Result<()> {
        self.network.set_weights(&live.weights())
    }

    pub fn predict(&mut self, state: ArrayView1<f32>) -> Array1<f32> {
        self.network.predict(state)
    }

    pub fn predict_batch(&mut self, states: ArrayView2<f32>) -> Array2<f32> {
        self.network.predict_batch(states)
    }

    pub fn output_dim(&self) -> usize {
        self.network.output_dim()
    }
}
