use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DiffusionError;

pub mod ddpm;
pub mod schedule;

pub use ddpm::DiffusionProcess;
pub use schedule::{NoiseSchedule, NoiseScheduleConfig};

/// This represents how beta ranges from its minimum value to the maximum
/// during training.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BetaSchedule {
    /// Linear interpolation between the configured bounds.
    Linear,
    /// Improved DDPM cosine schedule, ignores the configured bounds.
    Cosine,
}

impl BetaSchedule {
    pub fn as_str(&self) -> &'static str {
        match self {
            BetaSchedule::Linear => "linear",
            BetaSchedule::Cosine => "cosine",
        }
    }
}

impl fmt::Display for BetaSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BetaSchedule {
    type Err = DiffusionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linear" => Ok(BetaSchedule::Linear),
            "cosine" => Ok(BetaSchedule::Cosine),
            _ => Err(DiffusionError::UnsupportedSchedule(s.to_string())),
        }
    }
}
