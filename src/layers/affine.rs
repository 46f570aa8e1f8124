//! Affine (Fully Connected) Layer
//!
//! Computes `out = x_flat · w + b`, where every example of the minibatch
//! `x` with shape `(N, d_1, ..., d_k)` is flattened into a row of length
//! `D = d_1 * ... * d_k`.

use ndarray::{Array1, Array2, ArrayD, Axis, IxDyn};
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use serde::{Deserialize, Serialize};

use crate::error::{ensure_shape, LayerError, Result};

/// Values saved by [`affine_forward`] for the backward pass
#[derive(Debug, Clone)]
pub struct AffineCache {
    /// Input data, shape `(N, d_1, ..., d_k)`
    pub x: ArrayD<f64>,
    /// Weights, shape `(D, M)`
    pub w: Array2<f64>,
    /// Biases, shape `(M,)`
    pub b: Array1<f64>,
}

/// Gradients produced by [`affine_backward`]
#[derive(Debug, Clone)]
pub struct AffineGradients {
    /// Gradient with respect to `x`, same shape as `x`
    pub dx: ArrayD<f64>,
    /// Gradient with respect to `w`, shape `(D, M)`
    pub dw: Array2<f64>,
    /// Gradient with respect to `b`, shape `(M,)`
    pub db: Array1<f64>,
}

/// Reshape `(N, d_1, ..., d_k)` into `(N, D)` in row-major order.
///
/// A one-dimensional input is treated as `N` examples of size one.
pub fn flatten_batch(x: &ArrayD<f64>) -> Result<Array2<f64>> {
    let n = *x.shape().first().ok_or(LayerError::ScalarInput)?;
    let d: usize = x.shape()[1..].iter().product();
    Ok(Array2::from_shape_vec((n, d), x.iter().copied().collect())?)
}

/// Forward pass for an affine layer.
///
/// Returns the output of shape `(N, M)` and the cache `(x, w, b)`.
pub fn affine_forward(
    x: &ArrayD<f64>,
    w: &Array2<f64>,
    b: &Array1<f64>,
) -> Result<(Array2<f64>, AffineCache)> {
    let x_flat = flatten_batch(x)?;
    ensure_shape("affine_forward input", &[x_flat.nrows(), w.nrows()], x_flat.shape())?;
    ensure_shape("affine_forward bias", &[w.ncols()], b.shape())?;

    let out = x_flat.dot(w) + b;
    let cache = AffineCache {
        x: x.clone(),
        w: w.clone(),
        b: b.clone(),
    };
    Ok((out, cache))
}

/// Backward pass for an affine layer.
///
/// `dout` is the upstream derivative with shape `(N, M)`.
pub fn affine_backward(dout: &Array2<f64>, cache: &AffineCache) -> Result<AffineGradients> {
    let x_flat = flatten_batch(&cache.x)?;
    ensure_shape("affine_backward dout", &[x_flat.nrows(), cache.w.ncols()], dout.shape())?;

    let dw = x_flat.t().dot(dout);
    let db = dout.sum_axis(Axis(0));
    let dx_flat = dout.dot(&cache.w.t());
    let dx = ArrayD::from_shape_vec(IxDyn(cache.x.shape()), dx_flat.iter().copied().collect())?;

    Ok(AffineGradients { dx, dw, db })
}

/// Affine layer owning its parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Affine {
    /// Weight matrix (input_dim x output_dim)
    pub weights: Array2<f64>,
    /// Bias vector (output_dim)
    pub biases: Array1<f64>,
}

impl Affine {
    /// Create a new affine layer with Xavier initialization
    pub fn new(input_dim: usize, output_dim: usize) -> Self {
        let limit = (6.0 / (input_dim + output_dim).max(1) as f64).sqrt();
        let weights = Array2::random((input_dim, output_dim), Uniform::new_inclusive(-limit, limit));
        let biases = Array1::zeros(output_dim);
        Self { weights, biases }
    }

    /// Build a layer from existing parameters
    pub fn from_parts(weights: Array2<f64>, biases: Array1<f64>) -> Result<Self> {
        ensure_shape("Affine biases", &[weights.ncols()], biases.shape())?;
        Ok(Self { weights, biases })
    }

    pub fn input_dim(&self) -> usize {
        self.weights.nrows()
    }

    pub fn output_dim(&self) -> usize {
        self.weights.ncols()
    }

    pub fn forward(&self, x: &ArrayD<f64>) -> Result<(Array2<f64>, AffineCache)> {
        affine_forward(x, &self.weights, &self.biases)
    }

    pub fn backward(&self, dout: &Array2<f64>, cache: &AffineCache) -> Result<AffineGradients> {
        affine_backward(dout, cache)
    }

    /// Get number of parameters
    pub fn num_parameters(&self) -> usize {
        self.weights.len() + self.biases.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{array, Array};

    fn linspace_dyn(start: f64, end: f64, shape: &[usize]) -> ArrayD<f64> {
        let n: usize = shape.iter().product();
        Array::linspace(start, end, n)
            .into_shape(IxDyn(shape))
            .unwrap()
    }

    #[test]
    fn test_forward_matches_reference() {
        // Reference values for a (2, 4, 5, 6) input mapped to 3 outputs
        let x = linspace_dyn(-0.1, 0.5, &[2, 4, 5, 6]);
        let w = linspace_dyn(-0.2, 0.3, &[120, 3])
            .into_dimensionality::<ndarray::Ix2>()
            .unwrap();
        let b = Array::linspace(-0.3, 0.1, 3);

        let (out, _) = affine_forward(&x, &w, &b).unwrap();
        let expected = array![
            [1.49834967, 1.70660132, 1.91485297],
            [3.25553199, 3.5141327, 3.77273342],
        ];
        assert_eq!(out.dim(), (2, 3));
        for (a, e) in out.iter().zip(expected.iter()) {
            assert_relative_eq!(*a, *e, epsilon = 1e-7);
        }
    }

    #[test]
    fn test_backward_shapes() {
        let x = linspace_dyn(-1.0, 1.0, &[3, 2, 5]);
        let layer = Affine::new(10, 4);
        let (out, cache) = layer.forward(&x).unwrap();
        let grads = layer.backward(&out, &cache).unwrap();

        assert_eq!(grads.dx.shape(), &[3, 2, 5]);
        assert_eq!(grads.dw.dim(), (10, 4));
        assert_eq!(grads.db.len(), 4);
    }

    #[test]
    fn test_bias_gradient_sums_over_batch() {
        let x = linspace_dyn(0.0, 1.0, &[2, 2]);
        let w = Array2::eye(2);
        let b = Array1::zeros(2);
        let (_, cache) = affine_forward(&x, &w, &b).unwrap();
        let dout = array![[1.0, 2.0], [3.0, 4.0]];
        let grads = affine_backward(&dout, &cache).unwrap();
        assert_eq!(grads.db, array![4.0, 6.0]);
    }

    #[test]
    fn test_one_dimensional_input() {
        let x = array![1.0, 2.0, 3.0].into_dyn();
        let w = array![[2.0]];
        let b = array![0.5];
        let (out, _) = affine_forward(&x, &w, &b).unwrap();
        assert_eq!(out, array![[2.5], [4.5], [6.5]]);
    }

    #[test]
    fn test_weight_mismatch() {
        let x = linspace_dyn(0.0, 1.0, &[2, 3]);
        let w = Array2::zeros((4, 2));
        let b = Array1::zeros(2);
        let err = affine_forward(&x, &w, &b).unwrap_err();
        assert!(matches!(err, LayerError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_bias_mismatch() {
        let x = linspace_dyn(0.0, 1.0, &[2, 3]);
        let w = Array2::zeros((3, 2));
        let b = Array1::zeros(5);
        assert!(affine_forward(&x, &w, &b).is_err());
        assert!(Affine::from_parts(w, b).is_err());
    }

    #[test]
    fn test_scalar_input_rejected() {
        let x = ArrayD::from_elem(IxDyn(&[]), 1.0);
        let w = Array2::zeros((1, 1));
        let b = Array1::zeros(1);
        assert_eq!(affine_forward(&x, &w, &b).unwrap_err(), LayerError::ScalarInput);
    }

    #[test]
    fn test_backward_dout_mismatch() {
        let layer = Affine::new(3, 2);
        let x = linspace_dyn(0.0, 1.0, &[4, 3]);
        let (_, cache) = layer.forward(&x).unwrap();
        let dout = Array2::zeros((4, 3));
        assert!(layer.backward(&dout, &cache).is_err());
    }

    #[test]
    fn test_num_parameters() {
        let layer = Affine::new(10, 5);
        assert_eq!(layer.num_parameters(), 10 * 5 + 5);
        assert_eq!(layer.input_dim(), 10);
        assert_eq!(layer.output_dim(), 5);
    }
}
