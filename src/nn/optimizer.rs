//! Parameter update rules applied once per training iteration.

use serde::{Deserialize, Serialize};

use crate::error::TensorError;
use crate::tensor::Tensor;

use super::Layer;

pub const BETA1: f64 = 0.9;
pub const BETA2: f64 = 0.999;
pub const EPSILON: f64 = 1e-8;

/// Which update a network applies after each backprop pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateRule {
    /// Gradient descent with L2 weight decay.
    #[default]
    Sgd,
    /// Adam with bias-corrected moments and decoupled weight decay.
    Adam,
}

/// Gradients for one layer, summed over the batch.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerGradient {
    pub weights: Tensor,
    pub bias: Tensor,
}

impl LayerGradient {
    pub fn zeros_like(layer: &Layer) -> Self {
        LayerGradient {
            weights: Tensor::zeros(layer.outputs(), layer.inputs()),
            bias: Tensor::zeros(layer.outputs(), 1),
        }
    }

    pub fn accumulate(&mut self, other: &LayerGradient) -> Result<(), TensorError> {
        self.weights.add_in_place(&other.weights)?;
        self.bias.add_in_place(&other.bias)
    }
}

#[derive(Debug, Clone)]
struct Moments {
    m: Tensor,
    v: Tensor,
}

impl Moments {
    fn zeros(shape: (usize, usize)) -> Self {
        Moments {
            m: Tensor::zeros(shape.0, shape.1),
            v: Tensor::zeros(shape.0, shape.1),
        }
    }

    fn update(&mut self, params: &mut Tensor, grad_sum: &Tensor, scale: f64, lr: f64, t: i32) {
        let bc1 = 1.0 - BETA1.powi(t);
        let bc2 = 1.0 - BETA2.powi(t);
        let m = self.m.as_mut_slice();
        let v = self.v.as_mut_slice();
        for (i, (p, g)) in params
            .as_mut_slice()
            .iter_mut()
            .zip(grad_sum.as_slice())
            .enumerate()
        {
            let g = g * scale;
            m[i] = BETA1 * m[i] + (1.0 - BETA1) * g;
            v[i] = BETA2 * v[i] + (1.0 - BETA2) * g * g;
            let m_hat = m[i] / bc1;
            let v_hat = v[i] / bc2;
            *p -= lr * m_hat / (v_hat.sqrt() + EPSILON);
        }
    }
}

/// First and second moment estimates plus the step counter.
#[derive(Debug, Clone, Default)]
pub struct AdamState {
    step: u64,
    weights: Vec<Moments>,
    bias: Vec<Moments>,
}

impl AdamState {
    fn ensure_shapes(&mut self, layers: &[Layer]) {
        let matches = self.weights.len() == layers.len()
            && layers
                .iter()
                .zip(&self.weights)
                .all(|(l, m)| l.weights().shape() == m.m.shape());
        if !matches {
            self.weights = layers
                .iter()
                .map(|l| Moments::zeros(l.weights().shape()))
                .collect();
            self.bias = layers
                .iter()
                .map(|l| Moments::zeros(l.bias().shape()))
                .collect();
            self.step = 0;
        }
    }
}

/// Update rule together with whatever state it carries between iterations.
#[derive(Debug, Clone)]
pub enum Optimizer {
    Sgd,
    Adam(AdamState),
}

impl Optimizer {
    pub fn new(rule: UpdateRule) -> Self {
        match rule {
            UpdateRule::Sgd => Optimizer::Sgd,
            UpdateRule::Adam => Optimizer::Adam(AdamState::default()),
        }
    }

    pub fn rule(&self) -> UpdateRule {
        match self {
            Optimizer::Sgd => UpdateRule::Sgd,
            Optimizer::Adam(_) => UpdateRule::Adam,
        }
    }

    /// Number of Adam steps taken so far; always 0 for SGD.
    pub fn step_count(&self) -> u64 {
        match self {
            Optimizer::Sgd => 0,
            Optimizer::Adam(state) => state.step,
        }
    }

    /// Apply one update from gradients summed over a batch of `batch` columns.
    ///
    /// Shapes are checked for every layer before any parameter is touched.
    pub fn apply(
        &mut self,
        layers: &mut [Layer],
        grads: &[LayerGradient],
        batch: usize,
        eta: f64,
        lambda: f64,
    ) -> Result<(), TensorError> {
        if grads.len() != layers.len() {
            return Err(TensorError::ShapeMismatch {
                op: "optimizer",
                left: (layers.len(), 1),
                right: (grads.len(), 1),
            });
        }
        for (layer, grad) in layers.iter().zip(grads) {
            if layer.weights().shape() != grad.weights.shape()
                || layer.bias().shape() != grad.bias.shape()
            {
                return Err(TensorError::ShapeMismatch {
                    op: "optimizer",
                    left: layer.weights().shape(),
                    right: grad.weights.shape(),
                });
            }
        }
        if batch == 0 {
            return Ok(());
        }
        let n = batch as f64;

        match self {
            Optimizer::Sgd => {
                let decay = 1.0 - eta * lambda / n;
                for (layer, grad) in layers.iter_mut().zip(grads) {
                    let (w, b) = layer.params_mut();
                    w.scale_in_place(decay);
                    w.sub_scaled_in_place(&grad.weights, eta / n)?;
                    b.sub_scaled_in_place(&grad.bias, eta / n)?;
                }
            }
            Optimizer::Adam(state) => {
                state.ensure_shapes(layers);
                state.step += 1;
                let t = i32::try_from(state.step).unwrap_or(i32::MAX);
                let decay = 1.0 - eta * lambda;
                for (i, (layer, grad)) in layers.iter_mut().zip(grads).enumerate() {
                    let (w, b) = layer.params_mut();
                    w.scale_in_place(decay);
                    state.weights[i].update(w, &grad.weights, 1.0 / n, eta, t);
                    state.bias[i].update(b, &grad.bias, 1.0 / n, eta, t);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nn::Activation;

    fn single_layer(w: f64, b: f64) -> Vec<Layer> {
        vec![Layer::from_parts(
            Tensor::from_vec(1, 1, vec![w]).unwrap(),
            Tensor::column_vector(&[b]),
            Activation::Linear,
        )
        .unwrap()]
    }

    fn grad(w: f64, b: f64) -> Vec<LayerGradient> {
        vec![LayerGradient {
            weights: Tensor::from_vec(1, 1, vec![w]).unwrap(),
            bias: Tensor::column_vector(&[b]),
        }]
    }

    #[test]
    fn test_sgd_update() {
        let mut layers = single_layer(1.0, 1.0);
        let mut opt = Optimizer::new(UpdateRule::Sgd);
        opt.apply(&mut layers, &grad(4.0, 2.0), 2, 0.5, 0.2).unwrap();
        // w = 1 * (1 - 0.5*0.2/2) - (0.5/2)*4 = 0.95 - 1.0
        assert!((layers[0].weights().as_slice()[0] - (-0.05)).abs() < 1e-12);
        // b = 1 - 0.25*2
        assert!((layers[0].bias().as_slice()[0] - 0.5).abs() < 1e-12);
        assert_eq!(opt.step_count(), 0);
    }

    #[test]
    fn test_adam_first_step_moves_by_eta() {
        let mut layers = single_layer(1.0, 1.0);
        let mut opt = Optimizer::new(UpdateRule::Adam);
        opt.apply(&mut layers, &grad(3.0, -3.0), 3, 0.01, 0.0).unwrap();
        // the bias-corrected first step is eta * sign(g)
        assert!((layers[0].weights().as_slice()[0] - 0.99).abs() < 1e-6);
        assert!((layers[0].bias().as_slice()[0] - 1.01).abs() < 1e-6);
        assert_eq!(opt.step_count(), 1);
        assert_eq!(opt.rule(), UpdateRule::Adam);
    }

    #[test]
    fn test_adam_decay_only_touches_weights() {
        let mut layers = single_layer(2.0, 2.0);
        let mut opt = Optimizer::new(UpdateRule::Adam);
        opt.apply(&mut layers, &grad(0.0, 0.0), 1, 0.1, 0.5).unwrap();
        assert!((layers[0].weights().as_slice()[0] - 1.9).abs() < 1e-12);
        assert_eq!(layers[0].bias().as_slice()[0], 2.0);
    }

    #[test]
    fn test_empty_batch_is_noop() {
        let mut layers = single_layer(1.0, 1.0);
        let before = layers.clone();
        let mut opt = Optimizer::new(UpdateRule::Adam);
        opt.apply(&mut layers, &grad(1.0, 1.0), 0, 0.1, 0.1).unwrap();
        assert_eq!(layers, before);
        assert_eq!(opt.step_count(), 0);
    }

    #[test]
    fn test_shape_check_precedes_update() {
        let mut layers = single_layer(1.0, 1.0);
        layers.push(layers[0].clone());
        let before = layers.clone();
        let mut grads = grad(1.0, 1.0);
        grads.push(LayerGradient {
            weights: Tensor::zeros(2, 2),
            bias: Tensor::zeros(2, 1),
        });
        let mut opt = Optimizer::new(UpdateRule::Sgd);
        assert!(opt.apply(&mut layers, &grads, 1, 0.1, 0.0).is_err());
        assert_eq!(layers, before);
    }

    #[test]
    fn test_update_rule_serde() {
        let rule: UpdateRule = serde_json::from_str("\"adam\"").unwrap();
        assert_eq!(rule, UpdateRule::Adam);
        assert_eq!(serde_json::to_string(&UpdateRule::Sgd).unwrap(), "\"sgd\"");
    }
}
