use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod cli;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the coefficients of a noise schedule
    Schedule {
        #[clap(flatten)]
        args: cli::schedule::ScheduleArgs,
    },
    /// Generate samples with a freshly initialised UNet
    Sample {
        #[clap(flatten)]
        args: cli::sample::SampleArgs,
    },
    /// Write the default noise schedule configuration as JSON
    InitConfig {
        /// Path of the configuration file to write
        output: std::path::PathBuf,
    },
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Schedule { args } => {
            cli::schedule::handle_schedule(args)?;
        }
        Commands::Sample { args } => {
            cli::sample::handle_sample(args)?;
        }
        Commands::InitConfig { output } => {
            cli::handle_init_config(output)?;
        }
    }

    Ok(())
}
