//! Numerical Gradient Checking
//!
//! Compares the analytic backward passes of the layers against centred
//! finite differences of their forward passes.

use ndarray::{Array, Array1, Array2, ArrayD, Dimension, Ix1, Ix2, IxDyn, Zip};
use ndarray_rand::rand_distr::StandardNormal;
use ndarray_rand::RandomExt;
use rand::Rng;
use tracing::debug;

use crate::error::{ensure_shape, Result};
use crate::layers::{affine_backward, affine_forward, Activation};

/// Finite-difference step
pub const DEFAULT_STEP: f64 = 1e-5;

/// Relative error below which a check passes
pub const DEFAULT_TOLERANCE: f64 = 1e-7;

/// Outcome of comparing one analytic gradient against its numerical estimate
#[derive(Debug, Clone, PartialEq)]
pub struct GradientReport {
    /// What was checked, e.g. `"affine dw"`
    pub name: String,
    pub rel_error: f64,
}

impl GradientReport {
    pub fn passed(&self, tolerance: f64) -> bool {
        self.rel_error < tolerance
    }
}

/// Numerical gradient of a function that accepts and returns arrays.
///
/// `df` is the upstream gradient for the output of `f`. For every element
/// `i` of `x` the estimate is `sum((f(x + h e_i) - f(x - h e_i)) * df) / 2h`.
pub fn eval_numerical_gradient_array<F>(
    mut f: F,
    x: &ArrayD<f64>,
    df: &ArrayD<f64>,
    h: f64,
) -> Result<ArrayD<f64>>
where
    F: FnMut(&ArrayD<f64>) -> Result<ArrayD<f64>>,
{
    let mut x = x.clone();
    let mut grad = ArrayD::zeros(x.raw_dim());
    let indices: Vec<IxDyn> = x.indexed_iter().map(|(ix, _)| ix).collect();

    for ix in indices {
        let idx = ix.slice();
        let old = x[idx];

        x[idx] = old + h;
        let pos = f(&x)?;
        x[idx] = old - h;
        let neg = f(&x)?;
        x[idx] = old;

        ensure_shape("numerical gradient upstream", pos.shape(), df.shape())?;
        grad[idx] = ((&pos - &neg) * df).sum() / (2.0 * h);
    }

    Ok(grad)
}

/// Maximum elementwise relative error between two arrays.
///
/// Returns infinity when the shapes differ.
pub fn rel_error<D: Dimension>(a: &Array<f64, D>, b: &Array<f64, D>) -> f64 {
    if a.shape() != b.shape() {
        return f64::INFINITY;
    }
    Zip::from(a).and(b).fold(0.0_f64, |acc, &x, &y| {
        acc.max((x - y).abs() / (x.abs() + y.abs()).max(1e-8))
    })
}

/// Standard-normal samples of the given shape
pub fn random_normal<R: Rng + ?Sized>(shape: &[usize], rng: &mut R) -> ArrayD<f64> {
    ArrayD::random_using(IxDyn(shape), StandardNormal, rng)
}

/// Check an activation's backward pass at `x` with upstream gradient `dout`
pub fn check_activation(
    activation: &dyn Activation,
    x: &ArrayD<f64>,
    dout: &ArrayD<f64>,
) -> Result<GradientReport> {
    let numerical =
        eval_numerical_gradient_array(|x| Ok(activation.forward(x).0), x, dout, DEFAULT_STEP)?;
    let (_, cache) = activation.forward(x);
    let analytic = activation.backward(dout, &cache)?;

    let report = GradientReport {
        name: format!("{} dx", activation.name()),
        rel_error: rel_error(&analytic, &numerical),
    };
    debug!(name = %report.name, rel_error = report.rel_error, "gradient check");
    Ok(report)
}

/// Check all three affine gradients (`dx`, `dw`, `db`)
pub fn check_affine(
    x: &ArrayD<f64>,
    w: &Array2<f64>,
    b: &Array1<f64>,
    dout: &Array2<f64>,
) -> Result<Vec<GradientReport>> {
    let df = dout.clone().into_dyn();

    let dx_num = eval_numerical_gradient_array(
        |x| Ok(affine_forward(x, w, b)?.0.into_dyn()),
        x,
        &df,
        DEFAULT_STEP,
    )?;
    let dw_num = eval_numerical_gradient_array(
        |w| {
            let w = w.view().into_dimensionality::<Ix2>()?.to_owned();
            Ok(affine_forward(x, &w, b)?.0.into_dyn())
        },
        &w.clone().into_dyn(),
        &df,
        DEFAULT_STEP,
    )?;
    let db_num = eval_numerical_gradient_array(
        |b| {
            let b = b.view().into_dimensionality::<Ix1>()?.to_owned();
            Ok(affine_forward(x, w, &b)?.0.into_dyn())
        },
        &b.clone().into_dyn(),
        &df,
        DEFAULT_STEP,
    )?;

    let (_, cache) = affine_forward(x, w, b)?;
    let grads = affine_backward(dout, &cache)?;

    let reports = vec![
        GradientReport {
            name: "affine dx".to_string(),
            rel_error: rel_error(&grads.dx, &dx_num),
        },
        GradientReport {
            name: "affine dw".to_string(),
            rel_error: rel_error(&grads.dw.into_dyn(), &dw_num),
        },
        GradientReport {
            name: "affine db".to_string(),
            rel_error: rel_error(&grads.db.into_dyn(), &db_num),
        },
    ];
    for report in &reports {
        debug!(name = %report.name, rel_error = report.rel_error, "gradient check");
    }
    Ok(reports)
}
