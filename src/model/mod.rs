//! # Facial keypoint detection models
//!
//! A CNN built on the Burn framework and a constant baseline. Both map a
//! batch of grayscale images `[N, 1, 96, 96]` to `[N, 30]`, one (x, y) pair
//! per keypoint.

mod config;
mod dummy;
mod keypoint;

pub use config::KeypointConfig;
pub use dummy::{DummyKeypointModel, FIRST_SAMPLE_KEYPOINTS};
pub use keypoint::{ConvBlock, KeypointModel};

use burn::tensor::{backend::Backend, Tensor};

use crate::error::LayerError;

/// Anything that predicts keypoints from a batch of images
pub trait KeypointPredictor<B: Backend> {
    fn predict(&self, images: Tensor<B, 4>) -> Tensor<B, 2>;
}

impl<B: Backend> KeypointPredictor<B> for KeypointModel<B> {
    fn predict(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        self.forward(images)
    }
}

impl<B: Backend> KeypointPredictor<B> for DummyKeypointModel {
    fn predict(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        self.forward(images)
    }
}

/// Reshape predictions `[N, 2K]` into `[N, K, 2]` (x, y) pairs
pub fn keypoint_pairs<B: Backend>(predictions: Tensor<B, 2>) -> Result<Tensor<B, 3>, LayerError> {
    let [batch_size, width] = predictions.dims();
    if width % 2 != 0 {
        return Err(LayerError::OddKeypointWidth(width));
    }
    Ok(predictions.reshape([batch_size, width / 2, 2]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_keypoint_pairs_keeps_order() {
        let device = Default::default();
        let predictions = Tensor::<TestBackend, 2>::from_data(
            burn::tensor::TensorData::new(vec![1.0f32, 2.0, 3.0, 4.0], [1, 4]),
            &device,
        );
        let pairs = keypoint_pairs(predictions).unwrap();
        assert_eq!(pairs.dims(), [1, 2, 2]);
        assert_eq!(
            pairs.into_data().to_vec::<f32>().unwrap(),
            vec![1.0, 2.0, 3.0, 4.0]
        );
    }

    #[test]
    fn test_keypoint_pairs_odd_width() {
        let device = Default::default();
        let predictions = Tensor::<TestBackend, 2>::zeros([2, 5], &device);
        assert_eq!(
            keypoint_pairs(predictions).unwrap_err(),
            LayerError::OddKeypointWidth(5)
        );
    }
}
