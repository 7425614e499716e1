use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{Read, Write};

use crate::approximator::{Approximator, WeightSet};
use crate::error::{DeepqError, Result};
use crate::optimizer::{Optimizer, OptimizerWrapper};

/// A fully connected layer: weights, biases, and an activation function.
/// Forward passes cache their inputs and pre-activation outputs for the
/// following backward pass.
#[derive(Serialize, Deserialize, Clone)]
pub struct Layer {
    pub weights: Array2<f32>,
    pub biases: Array1<f32>,
    pub activation: Activation,
    pre_activation_output: Option<Array2<f32>>,
    inputs: Option<Array2<f32>>,
}

impl Layer {
    /// Create a new layer with the given input size, output size, and activation function.
    /// Weights are initialized uniformly in [-0.1, 0.1], biases with zeros.
    pub fn new(input_size: usize, output_size: usize, activation: Activation) -> Self {
        let weights = Array2::random((input_size, output_size), Uniform::new(-0.1, 0.1));
        let biases = Array1::zeros(output_size);
        Layer {
            weights,
            biases,
            activation,
            pre_activation_output: None,
            inputs: None,
        }
    }

    /// Forward pass for a batch of input vectors, one per row.
    fn forward_minibatch(&mut self, inputs: ArrayView2<f32>) -> Array2<f32> {
        self.inputs = Some(inputs.to_owned());
        let mut outputs = inputs.dot(&self.weights) + &self.biases.clone().insert_axis(Axis(0));
        self.pre_activation_output = Some(outputs.clone());
        self.activation.apply_minibatch(&mut outputs);
        outputs
    }

    /// Gradients of the layer's weights and biases for a batch of output errors.
    /// Returns the error adjusted by the activation derivative alongside the
    /// weight and bias gradients so the caller can continue the chain.
    fn backward_minibatch(
        &self,
        output_errors: ArrayView2<f32>,
    ) -> (Array2<f32>, Array2<f32>, Array1<f32>) {
        let pre_activation_output = self
            .pre_activation_output
            .as_ref()
            .expect("forward_minibatch() must be called before backward_minibatch()");
        let inputs = self
            .inputs
            .as_ref()
            .expect("forward_minibatch() must be called before backward_minibatch()");
        let activation_deriv = self.activation.derivative_minibatch(pre_activation_output.view());
        let adjusted_error = output_errors.to_owned() * &activation_deriv;
        let weight_gradients = inputs.t().dot(&adjusted_error);
        let bias_gradients = adjusted_error.sum_axis(Axis(0));
        (adjusted_error, weight_gradients, bias_gradients)
    }
}

/// Activation functions available for network layers.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub enum Activation {
    Relu,
    Linear,
}

impl Activation {
    fn apply_minibatch(&self, inputs: &mut Array2<f32>) {
        match self {
            Activation::Relu => {
                inputs.mapv_inplace(|v| v.max(0.0));
            }
            Activation::Linear => {}
        }
    }

    fn derivative_minibatch(&self, inputs: ArrayView2<f32>) -> Array2<f32> {
        match self {
            Activation::Relu => inputs.mapv(|v| if v > 0.0 { 1.0 } else { 0.0 }),
            Activation::Linear => Array2::ones(inputs.dim()),
        }
    }
}

/// A feed-forward neural network: the crate's default [`Approximator`].
///
/// Layer sizes and activations are fixed at construction; training runs
/// minibatch gradient descent through the configured optimizer.
#[derive(Serialize, Deserialize, Clone)]
pub struct NeuralNetwork {
    pub layers: Vec<Layer>,
    pub optimizer: OptimizerWrapper,
}

impl NeuralNetwork {
    /// Create a new network with the given layer sizes, activations, and optimizer.
    pub fn new(layer_sizes: &[usize], activations: &[Activation], optimizer: OptimizerWrapper) -> Self {
        assert_eq!(layer_sizes.len() - 1, activations.len());

        let layers = layer_sizes
            .windows(2)
            .zip(activations.iter())
            .map(|(window, &activation)| Layer::new(window[0], window[1], activation))
            .collect::<Vec<_>>();

        NeuralNetwork { layers, optimizer }
    }

    /// Convenience constructor: ReLU hidden layers, linear output.
    pub fn with_relu_hidden(layer_sizes: &[usize], optimizer: OptimizerWrapper) -> Self {
        assert!(layer_sizes.len() >= 2, "network needs at least input and output sizes");
        let mut activations = vec![Activation::Relu; layer_sizes.len() - 2];
        activations.push(Activation::Linear);
        Self::new(layer_sizes, &activations, optimizer)
    }

    /// Forward pass for a single input vector.
    pub fn forward(&mut self, input: ArrayView1<f32>) -> Array1<f32> {
        let input = input.insert_axis(Axis(0));
        let output = self.forward_minibatch(input.view());
        let output_shape = output.shape()[1];
        output.into_shape((output_shape,)).unwrap()
    }

    /// Forward pass for a batch of input vectors, one per row.
    pub fn forward_minibatch(&mut self, inputs: ArrayView2<f32>) -> Array2<f32> {
        let mut current_output = inputs.to_owned();
        for layer in &mut self.layers {
            current_output = layer.forward_minibatch(current_output.view());
        }
        current_output
    }

    /// Backpropagate a batch of output errors, collecting per-layer gradients.
    fn backward_minibatch(&mut self, output_errors: ArrayView2<f32>) -> Vec<(Array2<f32>, Array1<f32>)> {
        let mut gradients: Vec<(Array2<f32>, Array1<f32>)> = Vec::new();
        let mut current_error = output_errors.to_owned();

        let length = self.layers.len();
        for i in (0..length).rev() {
            let layer = &self.layers[i];
            let (adjusted_error, weight_gradients, bias_gradients) =
                layer.backward_minibatch(current_error.view());
            gradients.push((weight_gradients, bias_gradients));

            if i != 0 {
                current_error = adjusted_error.dot(&layer.weights.t());
            }
        }

        gradients.reverse();
        gradients
    }

    /// One gradient step on a batch of inputs and target outputs.
    /// Returns the mean squared error of the batch before the update.
    pub fn train_minibatch(
        &mut self,
        inputs: ArrayView2<f32>,
        targets: ArrayView2<f32>,
        learning_rate: f32,
    ) -> f32 {
        let outputs = self.forward_minibatch(inputs);
        let output_errors = &outputs - &targets;
        let loss = output_errors.mapv(|e| e * e).mean().unwrap_or(f32::INFINITY);
        let gradients = self.backward_minibatch(output_errors.view());

        for (i, (layer, (weight_gradients, bias_gradients))) in
            self.layers.iter_mut().zip(gradients).enumerate()
        {
            self.optimizer
                .update_weights(i, &mut layer.weights, &weight_gradients, learning_rate);
            self.optimizer
                .update_biases(i, &mut layer.biases, &bias_gradients, learning_rate);
        }
        loss
    }

    /// Serialize the network (layers and optimizer state) to a file.
    pub fn save(&self, path: &str) -> Result<()> {
        let serialized = bincode::serialize(self)?;
        let mut file = fs::File::create(path)?;
        file.write_all(&serialized)?;
        Ok(())
    }

    /// Load a network previously written by [`NeuralNetwork::save`].
    pub fn load(path: &str) -> Result<Self> {
        let mut file = fs::File::open(path)?;
        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer)?;
        let deserialized: Self = bincode::deserialize(&buffer)?;
        Ok(deserialized)
    }
}

impl Approximator for NeuralNetwork {
    fn input_dim(&self) -> usize {
        self.layers.first().map(|l| l.weights.dim().0).unwrap_or(0)
    }

    fn output_dim(&self) -> usize {
        self.layers.last().map(|l| l.biases.len()).unwrap_or(0)
    }

    fn predict(&mut self, state: ArrayView1<f32>) -> Array1<f32> {
        self.forward(state)
    }

    fn predict_batch(&mut self, states: ArrayView2<f32>) -> Array2<f32> {
        self.forward_minibatch(states)
    }

    fn fit_batch(
        &mut self,
        states: ArrayView2<f32>,
        targets: ArrayView2<f32>,
        learning_rate: f32,
    ) -> f32 {
        self.train_minibatch(states, targets, learning_rate)
    }

    fn weights(&self) -> WeightSet {
        WeightSet {
            layers: self
                .layers
                .iter()
                .map(|l| (l.weights.clone(), l.biases.clone()))
                .collect(),
        }
    }

    fn set_weights(&mut self, weights: &WeightSet) -> Result<()> {
        if weights.num_layers() != self.layers.len() {
            return Err(DeepqError::dimension_mismatch(
                format!("{} layers", self.layers.len()),
                format!("{} layers", weights.num_layers()),
            ));
        }
        for (layer, (w, b)) in self.layers.iter_mut().zip(&weights.layers) {
            if layer.weights.dim() != w.dim() || layer.biases.dim() != b.dim() {
                return Err(DeepqError::dimension_mismatch(
                    format!("{:?}/{:?}", layer.weights.dim(), layer.biases.dim()),
                    format!("{:?}/{:?}", w.dim(), b.dim()),
                ));
            }
            layer.weights.assign(w);
            layer.biases.assign(b);
        }
        Ok(())
    }
}
