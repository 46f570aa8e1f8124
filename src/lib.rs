//! # Keypoint NN
//!
//! Neural network building blocks with hand-written backward passes, and a
//! convolutional model for facial keypoint detection.
//!
//! ## Modules
//!
//! - `layers` - Affine layer and activation functions (forward and backward)
//! - `gradient` - Numerical gradient checks for the backward passes
//! - `model` - Keypoint CNN and a constant baseline, built on Burn
//! - `error` - Error types

pub mod error;
pub mod gradient;
pub mod layers;
pub mod model;

pub use error::{ConfigError, LayerError};
pub use layers::{Activation, ActivationType, Affine};
pub use model::{DummyKeypointModel, KeypointConfig, KeypointModel, KeypointPredictor};

/// Prelude for common imports
pub mod prelude {
    pub use crate::error::{ConfigError, LayerError};
    pub use crate::gradient::{check_activation, check_affine, rel_error, GradientReport};
    pub use crate::layers::{
        affine_backward, affine_forward, create_activation, Activation, ActivationType, Affine,
        AffineCache, AffineGradients, LeakyRelu, Relu, Sigmoid, Tanh,
    };
    pub use crate::model::{
        keypoint_pairs, DummyKeypointModel, KeypointConfig, KeypointModel, KeypointPredictor,
    };
}
