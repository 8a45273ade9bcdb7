use burn::config::Config;
use burn::module::Module;
use burn::nn::{Linear, LinearConfig};
use burn::tensor::backend::Backend;
use burn::tensor::{Data, ElementConversion, Shape, Tensor};

#[derive(Config, Debug)]
pub struct TimestepEmbeddingConfig {
    /// Number of diffusion steps, timesteps are divided by it before embedding.
    horizon: usize,
    time_embed_dim: usize,
}

/// Learned embedding of a timestep normalised to `[0, 1)`.
#[derive(Module, Debug)]
pub struct TimestepEmbedding<B: Backend> {
    linear: Linear<B>,
    horizon: usize,
}

impl TimestepEmbeddingConfig {
    /// Initialize a new [embedding](TimestepEmbedding) module.
    pub fn init<B: Backend>(&self, device: &B::Device) -> TimestepEmbedding<B> {
        assert!(self.horizon > 0, "the diffusion horizon must be at least one step");

        let linear = LinearConfig::new(1, self.time_embed_dim).init(device);
        TimestepEmbedding {
            linear,
            horizon: self.horizon,
        }
    }
}

impl<B: Backend> TimestepEmbedding<B> {
    /// Embeds one timestep per batch element.
    ///
    /// # Shapes
    ///
    /// - output: `[timesteps.len(), time_embed_dim]`
    pub fn forward(&self, timesteps: &[usize], device: &B::Device) -> Tensor<B, 2> {
        self.linear
            .forward(normalize_timesteps(timesteps, self.horizon, device))
    }
}

/// `t / horizon` for every timestep, as a `[timesteps.len(), 1]` column.
pub fn normalize_timesteps<B: Backend>(
    timesteps: &[usize],
    horizon: usize,
    device: &B::Device,
) -> Tensor<B, 2> {
    let values: Vec<B::FloatElem> = timesteps
        .iter()
        .map(|&t| (t as f64 / horizon as f64).elem())
        .collect();

    Tensor::from_data(Data::new(values, Shape::new([timesteps.len(), 1])), device)
}
