use anyhow::{bail, Context, Result};
use burn::tensor::backend::Backend as _;
use clap::Args;
use ddpm_burn::models::unet::UNetConfig;
use ddpm_burn::utils::to_vec_f64;
use ddpm_burn::{DiffusionProcess, NoiseScheduleConfig};
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::{Backend, ScheduleOptions};

#[derive(Args, Debug)]
pub struct SampleArgs {
    #[clap(flatten)]
    pub schedule: ScheduleOptions,

    /// The number of samples to generate.
    #[arg(long, default_value_t = 16)]
    pub batch_size: usize,

    /// The number of channels of the generated images.
    #[arg(long, default_value_t = 1)]
    pub channels: usize,

    /// The height in pixels of the generated images, a multiple of 4.
    #[arg(long, default_value_t = 8)]
    pub height: usize,

    /// The width in pixels of the generated images, a multiple of 4.
    #[arg(long, default_value_t = 8)]
    pub width: usize,

    /// Number of channels of the first UNet layer.
    #[arg(long, default_value_t = 64)]
    pub base_channels: usize,

    /// The random seed to be used for the generation.
    #[arg(long, default_value_t = 32)]
    pub seed: u64,
}

impl SampleArgs {
    /// Rejects image and model sizes the UNet cannot be built or run with.
    pub fn validate(&self) -> Result<()> {
        let sizes = [
            ("batch-size", self.batch_size),
            ("channels", self.channels),
            ("height", self.height),
            ("width", self.width),
            ("base-channels", self.base_channels),
        ];
        if let Some((name, _)) = sizes.iter().find(|(_, size)| *size == 0) {
            bail!("--{name} must be positive");
        }
        if self.height % 4 != 0 || self.width % 4 != 0 {
            bail!(
                "height and width must be multiples of 4, got {}x{}",
                self.height,
                self.width
            );
        }

        Ok(())
    }

    pub fn config(&self) -> Result<NoiseScheduleConfig> {
        self.schedule
            .resolve(NoiseScheduleConfig::new().with_train_timesteps(100))
    }
}

pub fn handle_sample(args: &SampleArgs) -> Result<()> {
    args.validate()?;

    let device = <Backend as burn::tensor::backend::Backend>::Device::default();
    Backend::seed(args.seed);
    let mut rng = StdRng::seed_from_u64(args.seed);

    let schedule = args.config()?.init().context("invalid noise schedule")?;
    let process = DiffusionProcess::new(schedule);
    let unet = UNetConfig::new(process.horizon())
        .with_channels(args.channels)
        .with_base_channels(args.base_channels)
        .init::<Backend>(&device);

    tracing::info!(
        horizon = process.horizon(),
        schedule = %process.schedule().kind(),
        batch_size = args.batch_size,
        "sampling"
    );
    let shape = [args.batch_size, args.channels, args.height, args.width];
    let samples = process.sample(&unet, shape, &device, &mut rng)?;

    let values = to_vec_f64(samples);
    let sample_len = args.channels * args.height * args.width;

    println!(
        "{:>6} {:>10} {:>10} {:>10} {:>10}",
        "sample", "mean", "std", "min", "max"
    );
    for (i, sample) in values.chunks(sample_len).enumerate() {
        let n = sample.len() as f64;
        let mean = sample.iter().sum::<f64>() / n;
        let std = (sample.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt();
        let min = sample.iter().copied().fold(f64::INFINITY, f64::min);
        let max = sample.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        println!("{i:>6} {mean:>10.4} {std:>10.4} {min:>10.4} {max:>10.4}");
    }

    Ok(())
}
