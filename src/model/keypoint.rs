//! Keypoint CNN architecture
//!
//! Conv blocks (conv, max pool, ReLU) followed by two fully connected layers.
//! The tanh output keeps every coordinate in `[-1, 1]`.

use burn::{
    module::Module,
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{MaxPool2d, MaxPool2dConfig},
        Dropout, DropoutConfig, Linear, LinearConfig, PaddingConfig2d, Relu,
    },
    tensor::{activation::tanh, backend::Backend, Tensor},
};
use tracing::debug;

use super::config::KeypointConfig;
use crate::error::ConfigError;

/// Convolution, max pooling and ReLU
#[derive(Module, Debug)]
pub struct ConvBlock<B: Backend> {
    conv: Conv2d<B>,
    pool: MaxPool2d,
    activation: Relu,
}

impl<B: Backend> ConvBlock<B> {
    pub fn new(device: &B::Device, in_channels: usize, out_channels: usize, config: &KeypointConfig) -> Self {
        let kernel = config.kernel_size;
        let conv = Conv2dConfig::new([in_channels, out_channels], [kernel, kernel])
            .with_stride([config.stride, config.stride])
            .with_padding(PaddingConfig2d::Explicit(config.padding, config.padding))
            .init(device);
        let pool = MaxPool2dConfig::new([config.pool_size, config.pool_size])
            .with_strides([config.pool_size, config.pool_size])
            .init();

        Self {
            conv,
            pool,
            activation: Relu::new(),
        }
    }

    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.conv.forward(x);
        let x = self.pool.forward(x);
        self.activation.forward(x)
    }
}

/// Facial keypoint detection model
#[derive(Module, Debug)]
pub struct KeypointModel<B: Backend> {
    convs: Vec<ConvBlock<B>>,
    fc1: Linear<B>,
    fc2: Linear<B>,
    dropout: Dropout,
    activation: Relu,
}

impl<B: Backend> KeypointModel<B> {
    /// Build the model from its hyperparameters.
    ///
    /// Fails if the config does not pass [`KeypointConfig::validate`].
    pub fn new(device: &B::Device, config: &KeypointConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let flatten_size = config.flatten_size().ok_or_else(|| {
            ConfigError::Invalid("feature maps collapse to zero".to_string())
        })?;

        let mut in_channels = config.in_channels;
        let mut convs = Vec::with_capacity(config.conv_channels.len());
        for &out_channels in &config.conv_channels {
            convs.push(ConvBlock::new(device, in_channels, out_channels, config));
            in_channels = out_channels;
        }

        debug!(
            blocks = convs.len(),
            flatten_size,
            outputs = config.num_outputs(),
            "building keypoint model"
        );

        let fc1 = LinearConfig::new(flatten_size, config.fc_size).init(device);
        let fc2 = LinearConfig::new(config.fc_size, config.num_outputs()).init(device);

        Ok(Self {
            convs,
            fc1,
            fc2,
            dropout: DropoutConfig::new(config.dropout).init(),
            activation: Relu::new(),
        })
    }

    /// Images `[N, C, H, W]` to keypoints `[N, 2K]`
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let mut x = images;
        for block in &self.convs {
            x = block.forward(x);
        }

        let x: Tensor<B, 2> = x.flatten(1, 3);
        let x = self.activation.forward(self.fc1.forward(x));
        let x = self.dropout.forward(x);

        tanh(self.fc2.forward(x))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_small_forward_pass() {
        let device = Default::default();
        let config = KeypointConfig::small();
        let model: KeypointModel<TestBackend> = KeypointModel::new(&device, &config).unwrap();

        let input = Tensor::<TestBackend, 4>::zeros([2, 1, 96, 96], &device);
        let output = model.forward(input);
        assert_eq!(output.dims(), [2, 30]);
    }

    #[test]
    fn test_rejects_collapsing_config() {
        let device = Default::default();
        let config = KeypointConfig {
            image_size: 8,
            conv_channels: vec![4; 5],
            ..Default::default()
        };
        let result: Result<KeypointModel<TestBackend>, _> = KeypointModel::new(&device, &config);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_conv_block_halves_spatial_size() {
        let device = Default::default();
        let config = KeypointConfig::default();
        let block: ConvBlock<TestBackend> = ConvBlock::new(&device, 1, 4, &config);

        let input = Tensor::<TestBackend, 4>::ones([1, 1, 10, 10], &device);
        assert_eq!(block.forward(input).dims(), [1, 4, 5, 5]);
    }
}
