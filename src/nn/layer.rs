use std::io::Write;

use rand::Rng;
use rand_distr::StandardNormal;

use crate::error::{NetworkError, TensorError};
use crate::tensor::Tensor;

use super::Activation;

/// Initial value of every bias element.
pub const INITIAL_BIAS: f64 = 0.1;

/// Fully connected layer computing `h(W·x + b)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    weights: Tensor,
    bias: Tensor,
    activation: Activation,
}

impl Layer {
    /// Create a layer with Xavier-scaled normal weights and constant bias.
    pub fn new<R: Rng + ?Sized>(
        inputs: usize,
        outputs: usize,
        activation: Activation,
        rng: &mut R,
    ) -> Self {
        let std_dev = (2.0 / (inputs + outputs).max(1) as f64).sqrt();
        let data = (0..inputs * outputs)
            .map(|_| std_dev * rng.sample::<f64, _>(StandardNormal))
            .collect();
        Layer {
            weights: Tensor::from_vec_unchecked(outputs, inputs, data),
            bias: Tensor::filled(outputs, 1, INITIAL_BIAS),
            activation,
        }
    }

    /// Assemble a layer from existing parameters.
    pub fn from_parts(
        weights: Tensor,
        bias: Tensor,
        activation: Activation,
    ) -> Result<Self, NetworkError> {
        if bias.shape() != (weights.rows(), 1) {
            return Err(TensorError::ShapeMismatch {
                op: "layer bias",
                left: weights.shape(),
                right: bias.shape(),
            }
            .into());
        }
        Ok(Layer {
            weights,
            bias,
            activation,
        })
    }

    pub fn inputs(&self) -> usize {
        self.weights.cols()
    }

    pub fn outputs(&self) -> usize {
        self.weights.rows()
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }

    pub fn weights(&self) -> &Tensor {
        &self.weights
    }

    pub fn bias(&self) -> &Tensor {
        &self.bias
    }

    pub(crate) fn params_mut(&mut self) -> (&mut Tensor, &mut Tensor) {
        (&mut self.weights, &mut self.bias)
    }

    /// `W·x + b` with the bias broadcast over every column of `x`.
    pub fn pre_activation(&self, x: &Tensor) -> Result<Tensor, TensorError> {
        self.weights.mul(x)?.add_column_broadcast(&self.bias)
    }

    pub fn activate(&self, x: &Tensor) -> Result<Tensor, TensorError> {
        Ok(self.pre_activation(x)?.apply(self.activation))
    }

    /// Write the four-line block: activation, derivative, weights, bias.
    pub fn write<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        writeln!(w, "{}", self.activation.name())?;
        writeln!(w, "{}", self.activation.derivative_name())?;
        writeln!(w, "{}", self.weights.to_line())?;
        writeln!(w, "{}", self.bias.to_line())
    }

    /// Parse a block written by [`Layer::write`].
    pub fn parse(lines: &[&str]) -> Result<Self, NetworkError> {
        let [name, derivative, weights, bias] = lines else {
            return Err(NetworkError::Malformed(format!(
                "layer block has {} lines, expected 4",
                lines.len()
            )));
        };
        let activation = Activation::from_names(name.trim(), derivative.trim())?;
        Layer::from_parts(Tensor::parse(weights)?, Tensor::parse(bias)?, activation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_new_layer_shapes() {
        let mut rng = StdRng::seed_from_u64(1);
        let layer = Layer::new(18, 72, Activation::ReLU, &mut rng);
        assert_eq!(layer.inputs(), 18);
        assert_eq!(layer.outputs(), 72);
        assert_eq!(layer.weights().shape(), (72, 18));
        assert_eq!(layer.bias(), &Tensor::filled(72, 1, INITIAL_BIAS));
    }

    #[test]
    fn test_init_spread_is_xavier() {
        let mut rng = StdRng::seed_from_u64(2);
        let layer = Layer::new(100, 100, Activation::Linear, &mut rng);
        let w = layer.weights().as_slice();
        let mean = w.iter().sum::<f64>() / w.len() as f64;
        let var = w.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / w.len() as f64;
        // expected variance 2 / (100 + 100) = 0.01
        assert!(mean.abs() < 0.01, "mean {mean}");
        assert!((var - 0.01).abs() < 0.002, "variance {var}");
    }

    #[test]
    fn test_same_seed_same_layer() {
        let a = Layer::new(3, 2, Activation::ReLU, &mut StdRng::seed_from_u64(9));
        let b = Layer::new(3, 2, Activation::ReLU, &mut StdRng::seed_from_u64(9));
        assert_eq!(a, b);
    }

    #[test]
    fn test_activate() {
        let w = Tensor::from_vec(2, 2, vec![1.0, -1.0, 2.0, 0.0]).unwrap();
        let b = Tensor::column_vector(&[0.0, -5.0]);
        let layer = Layer::from_parts(w, b, Activation::ReLU).unwrap();
        let x = Tensor::from_vec(2, 2, vec![1.0, 3.0, 2.0, 1.0]).unwrap();
        // W·x = [[-1, 2], [2, 6]], + b = [[-1, 2], [-3, 1]]
        let out = layer.activate(&x).unwrap();
        assert_eq!(out, Tensor::from_vec(2, 2, vec![0.0, 2.0, 0.0, 1.0]).unwrap());
    }

    #[test]
    fn test_activate_shape_mismatch() {
        let layer = Layer::new(3, 2, Activation::ReLU, &mut StdRng::seed_from_u64(0));
        assert!(matches!(
            layer.activate(&Tensor::zeros(2, 1)),
            Err(TensorError::ShapeMismatch { op: "mul", .. })
        ));
    }

    #[test]
    fn test_from_parts_rejects_bad_bias() {
        let result = Layer::from_parts(Tensor::zeros(2, 3), Tensor::zeros(3, 1), Activation::ReLU);
        assert!(matches!(result, Err(NetworkError::Tensor(_))));
    }

    #[test]
    fn test_write_parse_roundtrip() {
        let layer = Layer::new(4, 3, Activation::Sigmoid, &mut StdRng::seed_from_u64(5));
        let mut buf = Vec::new();
        layer.write(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Sigmoid");
        assert_eq!(lines[1], "SigmoidPrime");
        let parsed = Layer::parse(&lines).unwrap();
        for (a, b) in parsed.weights().as_slice().iter().zip(layer.weights().as_slice()) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
        assert_eq!(parsed.activation(), Activation::Sigmoid);
    }

    #[test]
    fn test_parse_truncated_block() {
        assert!(matches!(
            Layer::parse(&["ReLU", "ReLUPrime", "1,1,0.5"]),
            Err(NetworkError::Malformed(_))
        ));
    }
}
