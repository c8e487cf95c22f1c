//! Feed-forward neural network engine: activations, dense layers, update
//! rules, batched samples and the network itself.

mod activation;
mod layer;
mod network;
mod optimizer;
mod sample;

pub use activation::{Activation, LEAK};
pub use layer::{Layer, INITIAL_BIAS};
pub use network::{Network, NetworkConfig};
pub use optimizer::{LayerGradient, Optimizer, UpdateRule, BETA1, BETA2, EPSILON};
pub use sample::Sample;
