use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::NetworkError;

/// Slope of [`Activation::LeakyReLU`] for negative inputs.
pub const LEAK: f64 = 0.01;

/// Element-wise nonlinearity applied after a layer's affine map.
///
/// The set is closed: every variant has a persisted name and a sibling
/// derivative name, and a network file can only reference these pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Activation {
    ReLU,
    LeakyReLU,
    Linear,
    Sigmoid,
}

impl Activation {
    pub const ALL: [Activation; 4] = [
        Activation::ReLU,
        Activation::LeakyReLU,
        Activation::Linear,
        Activation::Sigmoid,
    ];

    pub fn value(self, x: f64) -> f64 {
        match self {
            Activation::ReLU => x.max(0.0),
            Activation::LeakyReLU => {
                if x > 0.0 {
                    x
                } else {
                    LEAK * x
                }
            }
            Activation::Linear => x,
            Activation::Sigmoid => sigmoid(x),
        }
    }

    pub fn derivative(self, x: f64) -> f64 {
        match self {
            Activation::ReLU => {
                if x > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Activation::LeakyReLU => {
                if x > 0.0 {
                    1.0
                } else {
                    LEAK
                }
            }
            Activation::Linear => 1.0,
            Activation::Sigmoid => {
                let s = sigmoid(x);
                s * (1.0 - s)
            }
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Activation::ReLU => "ReLU",
            Activation::LeakyReLU => "LeakyReLU",
            Activation::Linear => "Linear",
            Activation::Sigmoid => "Sigmoid",
        }
    }

    /// Name of the derivative written next to [`Activation::name`] in a network file.
    pub fn derivative_name(self) -> &'static str {
        match self {
            Activation::ReLU => "ReLUPrime",
            Activation::LeakyReLU => "LeakyReLUPrime",
            Activation::Linear => "LinearPrime",
            Activation::Sigmoid => "SigmoidPrime",
        }
    }

    /// Resolve an activation and check that `derivative` is its sibling.
    pub fn from_names(name: &str, derivative: &str) -> Result<Self, NetworkError> {
        let activation: Activation = name.parse()?;
        if activation.derivative_name() != derivative {
            let known = Activation::ALL
                .iter()
                .any(|a| a.derivative_name() == derivative);
            if !known {
                return Err(NetworkError::UnknownActivation(derivative.to_string()));
            }
            return Err(NetworkError::MismatchedDerivative {
                activation: name.to_string(),
                derivative: derivative.to_string(),
            });
        }
        Ok(activation)
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

impl FromStr for Activation {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Activation::ALL
            .into_iter()
            .find(|a| a.name() == s)
            .ok_or_else(|| NetworkError::UnknownActivation(s.to_string()))
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
