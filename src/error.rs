use thiserror::Error;

/// Errors raised by the noise schedule and the diffusion process.
///
/// Failures of a [noise predictor](crate::models::NoisePredictor) are never
/// wrapped in this type, they reach the caller unchanged.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DiffusionError {
    /// The requested beta schedule kind is not known.
    #[error("unsupported beta schedule `{0}`, expected one of: linear, cosine")]
    UnsupportedSchedule(String),
    /// The schedule configuration is invalid (horizon, bounds, ...).
    #[error("invalid diffusion configuration: {0}")]
    InvalidConfiguration(String),
    /// A timestep does not index into the schedule.
    #[error("timestep {timestep} is outside the diffusion horizon [0, {horizon})")]
    InvalidTimestep { timestep: usize, horizon: usize },
    /// The number of per-example timesteps differs from the batch size.
    #[error("expected {expected} timesteps (one per batch element), got {actual}")]
    BatchSizeMismatch { expected: usize, actual: usize },
    /// A model received an input it cannot process.
    #[error("invalid input shape: {0}")]
    InvalidShape(String),
}

impl DiffusionError {
    /// Whether the error was raised while validating a schedule configuration.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            DiffusionError::UnsupportedSchedule(_) | DiffusionError::InvalidConfiguration(_)
        )
    }
}

pub type Result<T> = core::result::Result<T, DiffusionError>;
