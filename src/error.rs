//! Error types for layers and model configuration

use thiserror::Error;

/// Errors raised by the layer forward and backward passes
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LayerError {
    #[error("input must have at least one (batch) dimension")]
    ScalarInput,

    #[error("shape mismatch in {context}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        context: &'static str,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("keypoint predictions need an even width, got {0}")]
    OddKeypointWidth(usize),

    #[error("array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

/// Errors raised while loading or validating a model configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

pub type Result<T, E = LayerError> = std::result::Result<T, E>;

/// Returns a [`LayerError::ShapeMismatch`] unless both shapes agree
pub(crate) fn ensure_shape(context: &'static str, expected: &[usize], actual: &[usize]) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(LayerError::ShapeMismatch {
            context,
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        })
    }
}
