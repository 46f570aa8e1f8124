//! Keypoint model hyperparameters

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Hyperparameters of the keypoint CNN
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeypointConfig {
    /// Number of input channels (1 for grayscale)
    pub in_channels: usize,
    /// Height and width of the square input image
    pub image_size: usize,
    /// Number of predicted (x, y) keypoints
    pub num_keypoints: usize,
    /// Output channels of each conv block
    pub conv_channels: Vec<usize>,
    pub kernel_size: usize,
    pub stride: usize,
    pub padding: usize,
    /// Max pooling window and stride
    pub pool_size: usize,
    /// Width of the hidden fully connected layer
    pub fc_size: usize,
    /// Dropout rate after the hidden fully connected layer
    pub dropout: f64,
}

impl Default for KeypointConfig {
    fn default() -> Self {
        Self {
            in_channels: 1,
            image_size: 96,
            num_keypoints: 15,
            conv_channels: vec![32, 64, 128, 256],
            kernel_size: 3,
            stride: 1,
            padding: 1,
            pool_size: 2,
            fc_size: 256,
            dropout: 0.0,
        }
    }
}

impl KeypointConfig {
    /// Smaller network for quick experiments
    pub fn small() -> Self {
        Self {
            conv_channels: vec![8, 16],
            fc_size: 32,
            ..Default::default()
        }
    }

    /// Load from a JSON file; missing fields keep their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Number of values in the output layer (x and y per keypoint)
    pub fn num_outputs(&self) -> usize {
        self.num_keypoints * 2
    }

    /// Spatial size after each conv block, or `None` if it collapses to zero
    pub fn feature_map_sizes(&self) -> Option<Vec<usize>> {
        let mut size = self.image_size;
        let mut sizes = Vec::with_capacity(self.conv_channels.len());
        for _ in &self.conv_channels {
            let padded = size + 2 * self.padding;
            if padded < self.kernel_size || self.stride == 0 || self.pool_size == 0 {
                return None;
            }
            size = (padded - self.kernel_size) / self.stride + 1;
            size /= self.pool_size;
            if size == 0 {
                return None;
            }
            sizes.push(size);
        }
        Some(sizes)
    }

    /// Input width of the first fully connected layer, or `None` if the
    /// feature maps collapse to zero
    pub fn flatten_size(&self) -> Option<usize> {
        let channels = self.conv_channels.last().copied().unwrap_or(self.in_channels);
        let sizes = self.feature_map_sizes()?;
        let size = sizes.last().copied().unwrap_or(self.image_size);
        Some(channels * size * size)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.in_channels == 0 {
            return invalid("in_channels must be > 0");
        }
        if self.image_size == 0 {
            return invalid("image_size must be > 0");
        }
        if self.num_keypoints == 0 {
            return invalid("num_keypoints must be > 0");
        }
        if self.conv_channels.iter().any(|&c| c == 0) {
            return invalid("conv_channels must all be > 0");
        }
        if self.kernel_size == 0 || self.stride == 0 || self.pool_size == 0 {
            return invalid("kernel_size, stride and pool_size must be > 0");
        }
        if self.fc_size == 0 {
            return invalid("fc_size must be > 0");
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return invalid("dropout must be in [0, 1)");
        }
        if self.feature_map_sizes().is_none() {
            return Err(ConfigError::Invalid(format!(
                "image_size {} collapses to zero after {} conv blocks",
                self.image_size,
                self.conv_channels.len()
            )));
        }
        Ok(())
    }
}

fn invalid(message: &str) -> Result<(), ConfigError> {
    Err(ConfigError::Invalid(message.to_string()))
}
