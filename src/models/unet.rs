//! A small convolutional noise predictor.
//!
//! Two stride-2 convolutions encode the input, two transposed convolutions decode
//! it back with additive skip connections. The normalised timestep is embedded and
//! added to the bottleneck features.

use burn::config::Config;
use burn::module::Module;
use burn::nn::conv::{Conv2d, Conv2dConfig, ConvTranspose2d, ConvTranspose2dConfig};
use burn::nn::PaddingConfig2d;
use burn::tensor::activation::relu;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use super::embeddings::{TimestepEmbedding, TimestepEmbeddingConfig};
use super::NoisePredictor;
use crate::error::DiffusionError;

/// Configuration of the [UNet](UNet) noise predictor.
#[derive(Config, Debug)]
pub struct UNetConfig {
    /// Number of diffusion steps of the schedule the model is used with.
    pub horizon: usize,
    /// Number of channels of the images.
    #[config(default = 1)]
    pub channels: usize,
    /// Number of channels after the input convolution, doubled at each downsampling.
    #[config(default = 64)]
    pub base_channels: usize,
}

impl UNetConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> UNet<B> {
        assert!(
            self.channels > 0 && self.base_channels > 0,
            "the number of channels must be positive"
        );

        let c1 = self.base_channels;
        let c2 = 2 * c1;
        let c3 = 4 * c1;

        let conv3x3 = |channels: [usize; 2], stride: usize| {
            Conv2dConfig::new(channels, [3, 3])
                .with_stride([stride, stride])
                .with_padding(PaddingConfig2d::Explicit(1, 1))
                .init(device)
        };
        let up2x2 = |channels: [usize; 2]| {
            ConvTranspose2dConfig::new(channels, [2, 2])
                .with_stride([2, 2])
                .init(device)
        };

        UNet {
            conv_in: conv3x3([self.channels, c1], 1),
            down1: conv3x3([c1, c2], 2),
            down2: conv3x3([c2, c3], 2),
            up1: up2x2([c3, c2]),
            up2: up2x2([c2, c1]),
            conv_out: conv3x3([c1, self.channels], 1),
            time_embedding: TimestepEmbeddingConfig::new(self.horizon, c3).init(device),
            channels: self.channels,
        }
    }
}

#[derive(Module, Debug)]
pub struct UNet<B: Backend> {
    conv_in: Conv2d<B>,
    down1: Conv2d<B>,
    down2: Conv2d<B>,
    up1: ConvTranspose2d<B>,
    up2: ConvTranspose2d<B>,
    conv_out: Conv2d<B>,
    time_embedding: TimestepEmbedding<B>,
    channels: usize,
}

impl<B: Backend> UNet<B> {
    /// Predicts the noise of `xs` at the given timesteps.
    ///
    /// `timesteps` holds either one timestep per batch element or a single timestep
    /// shared by the whole batch.
    ///
    /// # Shapes
    ///
    /// - xs: `[batch_size, channels, height, width]`, height and width non-zero multiples of 4
    /// - output: `[batch_size, channels, height, width]`
    pub fn forward(
        &self,
        xs: Tensor<B, 4>,
        timesteps: &[usize],
    ) -> Result<Tensor<B, 4>, DiffusionError> {
        let [batch_size, channels, height, width] = xs.dims();
        if height == 0 || width == 0 || height % 4 != 0 || width % 4 != 0 {
            return Err(DiffusionError::InvalidShape(format!(
                "expected height and width to be non-zero multiples of 4, got {height}x{width}"
            )));
        }
        if channels != self.channels {
            return Err(DiffusionError::InvalidShape(format!(
                "expected {} channels, got {channels}",
                self.channels
            )));
        }
        if timesteps.len() != 1 && timesteps.len() != batch_size {
            return Err(DiffusionError::BatchSizeMismatch {
                expected: batch_size,
                actual: timesteps.len(),
            });
        }

        let temb = self.time_embedding.forward(timesteps, &xs.device());
        let [n_timesteps, temb_dim] = temb.dims();

        let x1 = relu(self.conv_in.forward(xs));
        let x2 = relu(self.down1.forward(x1.clone()));
        let x3 = relu(self.down2.forward(x2.clone()))
            + temb.reshape([n_timesteps, temb_dim, 1, 1]);

        let xs = relu(self.up1.forward(x3)) + x2;
        let xs = relu(self.up2.forward(xs)) + x1;

        Ok(self.conv_out.forward(xs))
    }
}

impl<B: Backend> NoisePredictor<B, 4> for UNet<B> {
    type Error = DiffusionError;

    fn predict_noise(
        &self,
        xt: Tensor<B, 4>,
        timestep: usize,
    ) -> Result<Tensor<B, 4>, Self::Error> {
        self.forward(xt, &[timestep])
    }
}
