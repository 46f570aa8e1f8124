//! Build the keypoint model and run a forward pass on blank images
//!
//! Usage: cargo run --bin keypoint_summary -- --config hparams.json --batch 4

use std::path::PathBuf;

use anyhow::Result;
use burn::module::Module;
use burn::tensor::Tensor;
use burn_ndarray::{NdArray, NdArrayDevice};
use clap::builder::RangedU64ValueParser;
use clap::Parser;
use keypoint_nn::model::{
    keypoint_pairs, DummyKeypointModel, KeypointConfig, KeypointModel, KeypointPredictor,
};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

type Backend = NdArray<f32>;

#[derive(Parser, Debug)]
#[command(name = "keypoint_summary")]
#[command(about = "Keypoint model summary", long_about = None)]
struct Cli {
    /// JSON file with model hparams
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of blank images in the batch
    #[arg(short, long, default_value_t = 2, value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
    batch: usize,
}

fn load_config(path: Option<&PathBuf>) -> Result<KeypointConfig> {
    let config = match path {
        Some(path) => {
            info!("Loading hparams from {}", path.display());
            KeypointConfig::from_json_file(path)?
        }
        None => KeypointConfig::default(),
    };
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = load_config(cli.config.as_ref())?;
    info!("Config: {:?}", config);

    let device = NdArrayDevice::Cpu;
    let model: KeypointModel<Backend> = KeypointModel::new(&device, &config)?;
    info!("Parameters: {}", model.num_params());

    let images = Tensor::<Backend, 4>::zeros(
        [cli.batch, config.in_channels, config.image_size, config.image_size],
        &device,
    );

    let predictions = model.predict(images.clone());
    info!("Model output shape: {:?}", predictions.dims());
    info!("As keypoint pairs: {:?}", keypoint_pairs(predictions)?.dims());

    let dummy = DummyKeypointModel::new();
    let baseline = KeypointPredictor::<Backend>::predict(&dummy, images);
    info!("Dummy output shape: {:?}", baseline.dims());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_flags() {
        let cli = Cli::try_parse_from(["keypoint_summary", "--config=hparams.json", "-b", "4"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("hparams.json")));
        assert_eq!(cli.batch, 4);

        let cli = Cli::try_parse_from(["keypoint_summary"]).unwrap();
        assert_eq!(cli.config, None);
        assert_eq!(cli.batch, 2);
    }

    #[test]
    fn test_batch_must_be_positive() {
        assert!(Cli::try_parse_from(["keypoint_summary", "--batch", "0"]).is_err());
        assert!(Cli::try_parse_from(["keypoint_summary", "--batch", "two"]).is_err());
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let path = PathBuf::from("/nonexistent/hparams.json");
        assert!(load_config(Some(&path)).is_err());
        assert_eq!(load_config(None).unwrap(), KeypointConfig::default());
    }
}
