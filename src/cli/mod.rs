use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use burn::config::Config;
use clap::Args;
use ddpm_burn::{BetaSchedule, NoiseScheduleConfig};

pub mod sample;
pub mod schedule;

#[cfg(feature = "wgpu")]
pub type Backend = burn::backend::Wgpu;

#[cfg(all(feature = "torch", not(feature = "wgpu")))]
pub type Backend = burn::backend::LibTorch<f32>;

#[cfg(not(any(feature = "wgpu", feature = "torch")))]
pub type Backend = burn::backend::NdArray<f32>;

/// Noise schedule selection shared by the subcommands.
///
/// Values given on the command line override the ones of `--config`.
#[derive(Args, Debug)]
pub struct ScheduleOptions {
    /// JSON noise schedule configuration, see `init-config`
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// The number of diffusion steps
    #[arg(long)]
    timesteps: Option<usize>,

    /// The beta schedule, `linear` or `cosine`
    #[arg(long)]
    schedule: Option<BetaSchedule>,

    /// The value of beta at the first step (linear schedule)
    #[arg(long)]
    beta_start: Option<f64>,

    /// The value of beta at the last step (linear schedule)
    #[arg(long)]
    beta_end: Option<f64>,
}

impl ScheduleOptions {
    /// Resolves the configuration, starting from `default` when no file is given.
    pub fn resolve(&self, default: NoiseScheduleConfig) -> Result<NoiseScheduleConfig> {
        let mut config = match &self.config {
            Some(path) => NoiseScheduleConfig::load(path)
                .map_err(|err| anyhow!("failed to load {}: {err:?}", path.display()))?,
            None => default,
        };

        if let Some(timesteps) = self.timesteps {
            config.train_timesteps = timesteps;
        }
        if let Some(schedule) = self.schedule {
            config.beta_schedule = schedule;
        }
        if let Some(beta_start) = self.beta_start {
            config.beta_start = beta_start;
        }
        if let Some(beta_end) = self.beta_end {
            config.beta_end = beta_end;
        }

        Ok(config)
    }
}

pub fn handle_init_config(output: &Path) -> Result<()> {
    NoiseScheduleConfig::new()
        .save(output)
        .with_context(|| format!("failed to write {}", output.display()))?;
    tracing::info!(path = %output.display(), "wrote default noise schedule configuration");

    Ok(())
}
