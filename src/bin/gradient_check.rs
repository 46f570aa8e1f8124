//! Run the gradient checks for every layer
//!
//! Usage: cargo run --bin gradient_check -- --seed 231 --tolerance 1e-7

use anyhow::Result;
use clap::Parser;
use keypoint_nn::gradient::{
    check_activation, check_affine, random_normal, GradientReport, DEFAULT_TOLERANCE,
};
use keypoint_nn::layers::{create_activation, ActivationType};
use ndarray::{Ix1, Ix2};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "gradient_check")]
#[command(about = "Gradient check for affine and activation layers", long_about = None)]
struct Cli {
    /// Random seed for the generated inputs
    #[arg(short, long, default_value_t = 231)]
    seed: u64,

    /// Maximum relative error for a check to pass
    #[arg(short, long, default_value_t = DEFAULT_TOLERANCE, value_parser = parse_tolerance)]
    tolerance: f64,
}

fn parse_tolerance(value: &str) -> Result<f64, String> {
    let tolerance: f64 = value.parse().map_err(|e| format!("{e}"))?;
    if tolerance.is_finite() && tolerance > 0.0 {
        Ok(tolerance)
    } else {
        Err(format!("tolerance must be a positive number, got {value}"))
    }
}

/// Affine and activation checks on data drawn from `seed`
fn run_checks(seed: u64) -> Result<Vec<GradientReport>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut reports = Vec::new();

    let x = random_normal(&[10, 2, 3], &mut rng);
    let w = random_normal(&[6, 5], &mut rng).into_dimensionality::<Ix2>()?;
    let b = random_normal(&[5], &mut rng).into_dimensionality::<Ix1>()?;
    let dout = random_normal(&[10, 5], &mut rng).into_dimensionality::<Ix2>()?;
    reports.extend(check_affine(&x, &w, &b, &dout)?);

    let x = random_normal(&[10, 10], &mut rng);
    let dout = random_normal(&[10, 10], &mut rng);
    for kind in [
        ActivationType::Sigmoid,
        ActivationType::Relu,
        ActivationType::LeakyRelu { slope: 0.01 },
        ActivationType::Tanh,
    ] {
        let activation = create_activation(kind);
        reports.push(check_activation(activation.as_ref(), &x, &dout)?);
    }

    Ok(reports)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!(
        "Running gradient checks (seed={}, tolerance={:e})",
        cli.seed, cli.tolerance
    );
    let reports = run_checks(cli.seed)?;

    let mut failed = 0;
    for report in &reports {
        if report.passed(cli.tolerance) {
            info!("PASS {:<16} rel_error={:e}", report.name, report.rel_error);
        } else {
            warn!("FAIL {:<16} rel_error={:e}", report.name, report.rel_error);
            failed += 1;
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} gradient checks failed", failed, reports.len());
    }
    info!("All {} gradient checks passed", reports.len());
    Ok(())
}
