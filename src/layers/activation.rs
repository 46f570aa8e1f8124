//! Activation Functions
//!
//! Each activation returns its output together with a cache from `forward`,
//! and turns an upstream gradient plus that cache into the gradient with
//! respect to the input in `backward`. Inputs may have any shape.

use ndarray::{ArrayD, Zip};
use serde::{Deserialize, Serialize};

use crate::error::{ensure_shape, Result};

/// Default negative slope of [`LeakyRelu`]
pub const DEFAULT_LEAKY_SLOPE: f64 = 0.01;

/// Types of activation functions available
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum ActivationType {
    /// Sigmoid: 1 / (1 + exp(-x))
    Sigmoid,
    /// Rectified Linear Unit: max(0, x)
    Relu,
    /// Leaky ReLU: x for x > 0, slope * x otherwise
    LeakyRelu { slope: f64 },
    /// Hyperbolic tangent
    Tanh,
}

/// Activation function with forward and backward passes
pub trait Activation: Send + Sync {
    /// Apply the activation, returning `(output, cache)`
    fn forward(&self, x: &ArrayD<f64>) -> (ArrayD<f64>, ArrayD<f64>);

    /// Gradient with respect to the input, given the upstream gradient
    fn backward(&self, dout: &ArrayD<f64>, cache: &ArrayD<f64>) -> Result<ArrayD<f64>>;

    fn name(&self) -> &'static str;
}

fn zip_backward(
    dout: &ArrayD<f64>,
    cache: &ArrayD<f64>,
    f: impl Fn(f64, f64) -> f64,
) -> Result<ArrayD<f64>> {
    ensure_shape("activation backward", cache.shape(), dout.shape())?;
    Ok(Zip::from(dout).and(cache).map_collect(|&d, &c| f(d, c)))
}

/// Sigmoid activation; caches its output
#[derive(Debug, Clone, Copy, Default)]
pub struct Sigmoid;

impl Activation for Sigmoid {
    fn forward(&self, x: &ArrayD<f64>) -> (ArrayD<f64>, ArrayD<f64>) {
        let out = x.mapv(|v| 1.0 / (1.0 + (-v).exp()));
        (out.clone(), out)
    }

    fn backward(&self, dout: &ArrayD<f64>, cache: &ArrayD<f64>) -> Result<ArrayD<f64>> {
        zip_backward(dout, cache, |d, s| d * s * (1.0 - s))
    }

    fn name(&self) -> &'static str {
        "sigmoid"
    }
}

/// ReLU activation; caches its input
#[derive(Debug, Clone, Copy, Default)]
pub struct Relu;

impl Activation for Relu {
    fn forward(&self, x: &ArrayD<f64>) -> (ArrayD<f64>, ArrayD<f64>) {
        // NaN falls through unchanged
        (x.mapv(|v| if v < 0.0 { 0.0 } else { v }), x.clone())
    }

    fn backward(&self, dout: &ArrayD<f64>, cache: &ArrayD<f64>) -> Result<ArrayD<f64>> {
        // Only strictly negative inputs block the gradient
        zip_backward(dout, cache, |d, x| if x < 0.0 { 0.0 } else { d })
    }

    fn name(&self) -> &'static str {
        "relu"
    }
}

/// Leaky ReLU activation; caches its input
#[derive(Debug, Clone, Copy)]
pub struct LeakyRelu {
    pub slope: f64,
}

impl LeakyRelu {
    pub fn new(slope: f64) -> Self {
        Self { slope }
    }
}

impl Default for LeakyRelu {
    fn default() -> Self {
        Self {
            slope: DEFAULT_LEAKY_SLOPE,
        }
    }
}

impl Activation for LeakyRelu {
    fn forward(&self, x: &ArrayD<f64>) -> (ArrayD<f64>, ArrayD<f64>) {
        let out = x.mapv(|v| if v > 0.0 { v } else { self.slope * v });
        (out, x.clone())
    }

    fn backward(&self, dout: &ArrayD<f64>, cache: &ArrayD<f64>) -> Result<ArrayD<f64>> {
        let slope = self.slope;
        zip_backward(dout, cache, |d, x| if x > 0.0 { d } else { slope * d })
    }

    fn name(&self) -> &'static str {
        "leaky_relu"
    }
}

/// Tanh activation; caches its output
#[derive(Debug, Clone, Copy, Default)]
pub struct Tanh;

impl Activation for Tanh {
    fn forward(&self, x: &ArrayD<f64>) -> (ArrayD<f64>, ArrayD<f64>) {
        let out = x.mapv(f64::tanh);
        (out.clone(), out)
    }

    fn backward(&self, dout: &ArrayD<f64>, cache: &ArrayD<f64>) -> Result<ArrayD<f64>> {
        zip_backward(dout, cache, |d, t| d * (1.0 - t * t))
    }

    fn name(&self) -> &'static str {
        "tanh"
    }
}

/// Create an activation function from type
pub fn create_activation(activation_type: ActivationType) -> Box<dyn Activation> {
    match activation_type {
        ActivationType::Sigmoid => Box::new(Sigmoid),
        ActivationType::Relu => Box::new(Relu),
        ActivationType::LeakyRelu { slope } => Box::new(LeakyRelu::new(slope)),
        ActivationType::Tanh => Box::new(Tanh),
    }
}
