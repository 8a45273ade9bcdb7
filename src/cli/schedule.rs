use anyhow::{Context, Result};
use clap::Args;
use ddpm_burn::NoiseScheduleConfig;

use super::ScheduleOptions;

#[derive(Args, Debug)]
pub struct ScheduleArgs {
    #[clap(flatten)]
    pub schedule: ScheduleOptions,

    /// Print every n-th timestep (the last one is always printed)
    #[arg(long, default_value_t = 1)]
    pub every: usize,
}

impl ScheduleArgs {
    pub fn config(&self) -> Result<NoiseScheduleConfig> {
        self.schedule.resolve(NoiseScheduleConfig::new())
    }
}

pub fn handle_schedule(args: &ScheduleArgs) -> Result<()> {
    let schedule = args.config()?.init().context("invalid noise schedule")?;
    let every = args.every.max(1);
    let last = schedule.horizon() - 1;

    println!(
        "{:>6} {:>12} {:>12} {:>12} {:>12}",
        "t", "beta", "alpha", "alpha_bar", "sigma"
    );
    for t in (0..schedule.horizon()).filter(|t| t % every == 0 || *t == last) {
        println!(
            "{:>6} {:>12.6e} {:>12.6} {:>12.6e} {:>12.6e}",
            t,
            schedule.betas()[t],
            schedule.alphas()[t],
            schedule.alphas_cumprod()[t],
            schedule.sigmas()[t],
        );
    }

    Ok(())
}
