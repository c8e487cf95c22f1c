use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{NetworkError, TensorError};
use crate::tensor::Tensor;

use super::optimizer::{LayerGradient, Optimizer, UpdateRule};
use super::{Activation, Layer, Sample};

/// Shape and hyperparameters of a feed-forward network.
///
/// Hyperparameters are not stored in the network file; loading a saved
/// network takes them from this config instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub inputs: usize,
    pub hidden: Vec<usize>,
    pub outputs: usize,
    pub hidden_activation: Activation,
    pub output_activation: Activation,
    /// Learning rate.
    pub eta: f64,
    /// L2 weight-decay strength.
    pub lambda: f64,
    pub update: UpdateRule,
    /// Batches with at least this many columns are split across threads.
    pub parallel_threshold: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        NetworkConfig {
            inputs: 18,
            hidden: vec![72, 72, 36, 18],
            outputs: 1,
            hidden_activation: Activation::ReLU,
            output_activation: Activation::Linear,
            eta: 0.005,
            lambda: 0.3,
            update: UpdateRule::Sgd,
            parallel_threshold: 256,
        }
    }
}

impl NetworkConfig {
    /// Build a freshly initialized network.
    pub fn build<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Network, NetworkError> {
        let mut network = self.empty_network();
        let mut inputs = self.inputs;
        for &width in &self.hidden {
            network.add_layer(Layer::new(inputs, width, self.hidden_activation, rng))?;
            inputs = width;
        }
        network.add_layer(Layer::new(inputs, self.outputs, self.output_activation, rng))?;
        Ok(network)
    }

    fn empty_network(&self) -> Network {
        Network::new(self.eta, self.lambda, self.update)
            .with_parallel_threshold(self.parallel_threshold)
    }
}

/// Linear stack of dense layers trained by full-batch backpropagation.
#[derive(Debug, Clone)]
pub struct Network {
    layers: Vec<Layer>,
    eta: f64,
    lambda: f64,
    optimizer: Optimizer,
    parallel_threshold: usize,
}

impl Network {
    pub fn new(eta: f64, lambda: f64, update: UpdateRule) -> Self {
        Network {
            layers: Vec::new(),
            eta,
            lambda,
            optimizer: Optimizer::new(update),
            parallel_threshold: NetworkConfig::default().parallel_threshold,
        }
    }

    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold.max(1);
        self
    }

    /// Append a layer; its inputs must match the previous layer's outputs.
    pub fn add_layer(&mut self, layer: Layer) -> Result<(), NetworkError> {
        if let Some(last) = self.layers.last() {
            if last.outputs() != layer.inputs() {
                return Err(NetworkError::IncompatibleLayer {
                    previous: last.outputs(),
                    inputs: layer.inputs(),
                });
            }
        }
        self.layers.push(layer);
        Ok(())
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn inputs(&self) -> Option<usize> {
        self.layers.first().map(Layer::inputs)
    }

    pub fn outputs(&self) -> Option<usize> {
        self.layers.last().map(Layer::outputs)
    }

    pub fn eta(&self) -> f64 {
        self.eta
    }

    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    pub fn update_rule(&self) -> UpdateRule {
        self.optimizer.rule()
    }

    /// Adam steps taken so far (0 under SGD).
    pub fn step_count(&self) -> u64 {
        self.optimizer.step_count()
    }

    /// Layer widths joined by dashes, e.g. `18-72-1`.
    pub fn topology(&self) -> String {
        let mut dims: Vec<String> = self.inputs().into_iter().map(|n| n.to_string()).collect();
        dims.extend(self.layers.iter().map(|l| l.outputs().to_string()));
        dims.join("-")
    }

    /// Run `x` (one column per input vector) through every layer.
    pub fn feed_forward(&self, x: &Tensor) -> Result<Tensor, NetworkError> {
        let (first, rest) = self.layers.split_first().ok_or(NetworkError::EmptyNetwork)?;
        let mut h = first.activate(x)?;
        for layer in rest {
            h = layer.activate(&h)?;
        }
        Ok(h)
    }

    /// Run `iterations` full-batch gradient steps over `sample`.
    ///
    /// The batch is checked against the network's shape first; on error no
    /// parameter has changed. An empty batch leaves the network untouched.
    pub fn train(&mut self, sample: &Sample, iterations: usize) -> Result<(), NetworkError> {
        if sample.is_empty() {
            return Ok(());
        }
        self.check_sample(sample)?;
        for _ in 0..iterations {
            let grads = self.batch_gradients(sample)?;
            self.optimizer.apply(
                &mut self.layers,
                &grads,
                sample.len(),
                self.eta,
                self.lambda,
            )?;
        }
        Ok(())
    }

    /// Sum over batch columns of the Euclidean distance between prediction
    /// and label. Diagnostics only; training uses the squared-error gradient.
    pub fn squared_error(&self, sample: &Sample) -> Result<f64, NetworkError> {
        if sample.is_empty() {
            return Ok(0.0);
        }
        self.check_sample(sample)?;
        let diff = self.feed_forward(sample.x())?.sub(sample.y())?;
        let mut total = 0.0;
        for j in 0..diff.cols() {
            total += diff.column(j)?.map(|d| d * d).sum().sqrt();
        }
        Ok(total)
    }

    fn check_sample(&self, sample: &Sample) -> Result<(), NetworkError> {
        let inputs = self.inputs().ok_or(NetworkError::EmptyNetwork)?;
        let outputs = self.outputs().ok_or(NetworkError::EmptyNetwork)?;
        if sample.x().rows() != inputs || sample.y().rows() != outputs {
            return Err(TensorError::ShapeMismatch {
                op: "train",
                left: (inputs, outputs),
                right: (sample.x().rows(), sample.y().rows()),
            }
            .into());
        }
        Ok(())
    }

    fn zero_gradients(&self) -> Vec<LayerGradient> {
        self.layers.iter().map(LayerGradient::zeros_like).collect()
    }

    /// Batch gradients, split across rayon workers for large batches.
    fn batch_gradients(&self, sample: &Sample) -> Result<Vec<LayerGradient>, TensorError> {
        let n = sample.len();
        if n < self.parallel_threshold {
            return self.gradients(sample.x(), sample.y());
        }
        let chunk = n.div_ceil(rayon::current_num_threads()).max(1);
        let ranges: Vec<(usize, usize)> = (0..n)
            .step_by(chunk)
            .map(|start| (start, (start + chunk).min(n)))
            .collect();
        ranges
            .into_par_iter()
            .map(|(start, end)| {
                let part = sample.slice(start, end)?;
                self.gradients(part.x(), part.y())
            })
            .try_reduce(
                || self.zero_gradients(),
                |mut acc, part| {
                    for (a, p) in acc.iter_mut().zip(&part) {
                        a.accumulate(p)?;
                    }
                    Ok(acc)
                },
            )
    }

    /// Backpropagate one block of columns, returning gradients summed over it.
    fn gradients(&self, x: &Tensor, y: &Tensor) -> Result<Vec<LayerGradient>, TensorError> {
        let depth = self.layers.len();
        let mut inputs = Vec::with_capacity(depth);
        let mut pre = Vec::with_capacity(depth);
        let mut h = x.clone();
        for layer in &self.layers {
            let a = layer.pre_activation(&h)?;
            let next = a.apply(layer.activation());
            inputs.push(h);
            pre.push(a);
            h = next;
        }

        let last = depth - 1;
        let mut delta = h
            .sub(y)?
            .hadamard(&pre[last].apply_derivative(self.layers[last].activation()))?;
        let mut grads = Vec::with_capacity(depth);
        for k in (0..depth).rev() {
            grads.push(LayerGradient {
                weights: delta.mul(&inputs[k].transpose())?,
                bias: delta.sum_columns(),
            });
            if k > 0 {
                delta = self.layers[k]
                    .weights()
                    .transpose()
                    .mul(&delta)?
                    .hadamard(&pre[k - 1].apply_derivative(self.layers[k - 1].activation()))?;
            }
        }
        grads.reverse();
        Ok(grads)
    }

    /// Write every layer block in order.
    pub fn write<W: Write>(&self, w: &mut W) -> Result<(), NetworkError> {
        for layer in &self.layers {
            layer.write(w)?;
        }
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<(), NetworkError> {
        let mut w = BufWriter::new(File::create(path)?);
        self.write(&mut w)?;
        w.flush()?;
        Ok(())
    }

    /// Read a network written by [`Network::write`], taking hyperparameters from `config`.
    pub fn read<R: BufRead>(r: R, config: &NetworkConfig) -> Result<Self, NetworkError> {
        let mut lines = r.lines().collect::<Result<Vec<String>, _>>()?;
        while lines.last().is_some_and(|l| l.trim().is_empty()) {
            lines.pop();
        }
        if lines.is_empty() {
            return Err(NetworkError::EmptyNetwork);
        }
        if lines.len() % 4 != 0 {
            return Err(NetworkError::Malformed(format!(
                "truncated layer block: {} lines is not a multiple of 4",
                lines.len()
            )));
        }

        let mut network = config.empty_network();
        for block in lines.chunks(4) {
            let block: Vec<&str> = block.iter().map(String::as_str).collect();
            network.add_layer(Layer::parse(&block)?)?;
        }
        if network.inputs() != Some(config.inputs) || network.outputs() != Some(config.outputs) {
            return Err(NetworkError::Malformed(format!(
                "network is {}, config expects {} inputs and {} outputs",
                network.topology(),
                config.inputs,
                config.outputs
            )));
        }
        Ok(network)
    }

    pub fn load(path: &Path, config: &NetworkConfig) -> Result<Self, NetworkError> {
        let file = File::open(path)?;
        Network::read(BufReader::new(file), config)
    }
}
