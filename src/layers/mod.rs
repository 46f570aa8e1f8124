//! Layer Module
//!
//! Building blocks with explicit forward and backward passes:
//! - Affine (fully connected) layer
//! - Activation functions (Sigmoid, ReLU, Leaky ReLU, Tanh)

pub mod activation;
pub mod affine;

pub use activation::{
    create_activation, Activation, ActivationType, LeakyRelu, Relu, Sigmoid, Tanh,
};
pub use affine::{affine_backward, affine_forward, flatten_batch, Affine, AffineCache, AffineGradients};
