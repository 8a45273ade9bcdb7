//! # Denoising diffusion probabilistic models
//!
//! Noise schedules, the closed-form forward process and the ancestral sampler of
//! [DDPM](https://arxiv.org/abs/2006.11239), written against
//! [Burn](https://github.com/burn-rs/burn).
//!
//! ```ignore
//! let schedule = NoiseScheduleConfig::new().with_train_timesteps(100).init()?;
//! let process = DiffusionProcess::new(schedule);
//! let model = UNetConfig::new(process.horizon()).init::<B>(&device);
//! let samples = process.sample(&model, [16, 1, 32, 32], &device, &mut rng)?;
//! ```

pub mod error;
pub mod models;
pub mod schedulers;
pub mod utils;

pub use error::DiffusionError;
pub use models::{predictor_fn, NoisePredictor};
pub use schedulers::{BetaSchedule, DiffusionProcess, NoiseSchedule, NoiseScheduleConfig};

#[cfg(test)]
pub(crate) type TestBackend = burn::backend::NdArray<f32>;
