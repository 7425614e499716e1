use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Parameter update rule applied by the network after backpropagation.
///
/// The layer index routes per-layer optimizer state (Adam moments); plain SGD
/// ignores it.
pub trait Optimizer {
    fn update_weights(
        &mut self,
        layer: usize,
        weights: &mut Array2<f32>,
        gradients: &Array2<f32>,
        learning_rate: f32,
    );
    fn update_biases(
        &mut self,
        layer: usize,
        biases: &mut Array1<f32>,
        gradients: &Array1<f32>,
        learning_rate: f32,
    );
}

#[derive(Serialize, Deserialize, Clone)]
pub enum OptimizerWrapper {
    SGD(SGD),
    Adam(Adam),
}

impl Optimizer for OptimizerWrapper {
    fn update_weights(
        &mut self,
        layer: usize,
        weights: &mut Array2<f32>,
        gradients: &Array2<f32>,
        learning_rate: f32,
    ) {
        match self {
            OptimizerWrapper::SGD(optimizer) => {
                optimizer.update_weights(layer, weights, gradients, learning_rate)
            }
            OptimizerWrapper::Adam(optimizer) => {
                optimizer.update_weights(layer, weights, gradients, learning_rate)
            }
        }
    }

    fn update_biases(
        &mut self,
        layer: usize,
        biases: &mut Array1<f32>,
        gradients: &Array1<f32>,
        learning_rate: f32,
    ) {
        match self {
            OptimizerWrapper::SGD(optimizer) => {
                optimizer.update_biases(layer, biases, gradients, learning_rate)
            }
            OptimizerWrapper::Adam(optimizer) => {
                optimizer.update_biases(layer, biases, gradients, learning_rate)
            }
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Default)]
pub struct SGD;

impl SGD {
    pub fn new() -> SGD {
        SGD
    }
}

impl Optimizer for SGD {
    fn update_weights(
        &mut self,
        _layer: usize,
        weights: &mut Array2<f32>,
        gradients: &Array2<f32>,
        learning_rate: f32,
    ) {
        weights.zip_mut_with(gradients, |w, &g| *w -= learning_rate * g);
    }

    fn update_biases(
        &mut self,
        _layer: usize,
        biases: &mut Array1<f32>,
        gradients: &Array1<f32>,
        learning_rate: f32,
    ) {
        biases.zip_mut_with(gradients, |b, &g| *b -= learning_rate * g);
    }
}

/// First and second moment estimates for one parameter tensor.
#[derive(Serialize, Deserialize, Clone)]
struct Moments<A> {
    m: A,
    v: A,
    t: i32,
}

/// Adam with bias-corrected moment estimates.
///
/// Per-layer state is allocated lazily on the first update for a layer, so
/// the optimizer does not need to know the architecture up front.
#[derive(Serialize, Deserialize, Clone)]
pub struct Adam {
    pub beta1: f32,
    pub beta2: f32,
    pub epsilon: f32,
    weight_moments: Vec<Option<Moments<Array2<f32>>>>,
    bias_moments: Vec<Option<Moments<Array1<f32>>>>,
}

impl Adam {
    pub fn new(beta1: f32, beta2: f32, epsilon: f32) -> Self {
        Adam {
            beta1,
            beta2,
            epsilon,
            weight_moments: Vec::new(),
            bias_moments: Vec::new(),
        }
    }

    pub fn default_params() -> Self {
        Self::new(0.9, 0.999, 1e-8)
    }
}

impl Default for Adam {
    fn default() -> Self {
        Self::default_params()
    }
}

impl Optimizer for Adam {
    fn update_weights(
        &mut self,
        layer: usize,
        weights: &mut Array2<f32>,
        gradients: &Array2<f32>,
        learning_rate: f32,
    ) {
        if self.weight_moments.len() <= layer {
            self.weight_moments.resize(layer + 1, None);
        }
        let slot = self.weight_moments[layer].get_or_insert_with(|| Moments {
            m: Array2::zeros(gradients.dim()),
            v: Array2::zeros(gradients.dim()),
            t: 0,
        });
        slot.t += 1;

        slot.m.zip_mut_with(gradients, |m, &g| {
            *m = self.beta1 * *m + (1.0 - self.beta1) * g
        });
        slot.v.zip_mut_with(gradients, |v, &g| {
            *v = self.beta2 * *v + (1.0 - self.beta2) * g * g
        });

        let m_hat = slot.m.mapv(|x| x / (1.0 - self.beta1.powi(slot.t)));
        let v_hat = slot.v.mapv(|x| x / (1.0 - self.beta2.powi(slot.t)));

        *weights -= &((&m_hat / (v_hat.mapv(f32::sqrt) + self.epsilon)) * learning_rate);
    }

    fn update_biases(
        &mut self,
        layer: usize,
        biases: &mut Array1<f32>,
        gradients: &Array1<f32>,
        learning_rate: f32,
    ) {
        if self.bias_moments.len() <= layer {
            self.bias_moments.resize(layer + 1, None);
        }
        let slot = self.bias_moments[layer].get_or_insert_with(|| Moments {
            m: Array1::zeros(gradients.dim()),
            v: Array1::zeros(gradients.dim()),
            t: 0,
        });
        slot.t += 1;

        slot.m.zip_mut_with(gradients, |m, &g| {
            *m = self.beta1 * *m + (1.0 - self.beta1) * g
        });
        slot.v.zip_mut_with(gradients, |v, &g| {
            *v = self.beta2 * *v + (1.0 - self.beta2) * g * g
        });

        let m_hat = slot.m.mapv(|x| x / (1.0 - self.beta1.powi(slot.t)));
        let v_hat = slot.v.mapv(|x| x / (1.0 - self.beta2.powi(slot.t)));

        *biases -= &((&m_hat / (v_hat.mapv(f32::sqrt) + self.epsilon)) * learning_rate);
    }
}
