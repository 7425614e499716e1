use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A snapshot of an approximator's parameters.
///
/// A `WeightSet` always holds independent copies: taking one from a live
/// network and handing it to another instance must never alias storage, so
/// training the source afterwards cannot change the receiver's outputs.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WeightSet {
    /// Per-layer `(weights, biases)` pairs, input layer first.
    pub layers: Vec<(Array2<f32>, Array1<f32>)>,
}

impl WeightSet {
    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }
}

/// The function-approximator contract the training engine consumes.
///
/// The engine treats the network as opaque: it maps a state encoding to an
/// action-value vector, can be trained on `(state, target)` batches, and
/// exposes its parameters as deep-copied [`WeightSet`]s for target-network
/// synchronization and persistence.
///
/// `predict` takes `&mut self` because implementations are free to cache
/// forward-pass intermediates for the following backward pass.
pub trait Approximator {
    /// Dimensionality of the state encoding this approximator accepts.
    fn input_dim(&self) -> usize;

    /// Length of the action-value vector this approximator produces.
    fn output_dim(&self) -> usize;

    /// Action-value vector for a single state encoding.
    fn predict(&mut self, state: ArrayView1<f32>) -> Array1<f32>;

    /// Action-value vectors for a batch of state encodings (one per row).
    fn predict_batch(&mut self, states: ArrayView2<f32>) -> Array2<f32>;

    /// One training step on a batch of `(state, target)` rows.
    ///
    /// Returns the mean squared error of the batch before the update.
    fn fit_batch(
        &mut self,
        states: ArrayView2<f32>,
        targets: ArrayView2<f32>,
        learning_rate: f32,
    ) -> f32;

    /// Independent copy of the current parameters.
    fn weights(&self) -> WeightSet;

    /// Overwrite the parameters from a snapshot. Shapes must match.
    fn set_weights(&mut self, weights: &WeightSet) -> Result<()>;
}
