use burn::config::Config;

use super::BetaSchedule;
use crate::error::{self, DiffusionError};

/// Offset keeping the cosine schedule away from `beta = 0` near `t = 0`.
const COSINE_OFFSET: f64 = 0.008;
/// Upper clip applied to cosine betas so that `alpha` never reaches zero.
const COSINE_MAX_BETA: f64 = 0.999;

/// The configuration of a [noise schedule](NoiseSchedule).
#[derive(Config, Debug, PartialEq)]
pub struct NoiseScheduleConfig {
    /// Number of diffusion steps used to train the model.
    #[config(default = 1000)]
    pub train_timesteps: usize,
    /// How beta evolves over the diffusion horizon.
    #[config(default = "BetaSchedule::Linear")]
    pub beta_schedule: BetaSchedule,
    /// The value of beta at the first timestep (linear schedule only).
    #[config(default = 1e-4)]
    pub beta_start: f64,
    /// The value of beta at the last timestep (linear schedule only).
    #[config(default = 0.02)]
    pub beta_end: f64,
}

impl NoiseScheduleConfig {
    /// Validate the configuration and precompute the [schedule](NoiseSchedule).
    pub fn init(&self) -> error::Result<NoiseSchedule> {
        NoiseSchedule::new(
            self.train_timesteps,
            self.beta_schedule,
            self.beta_start,
            self.beta_end,
        )
    }
}

/// Per-timestep noise coefficients of a diffusion process.
///
/// All arrays have one entry per timestep in `[0, horizon)` and never change
/// after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct NoiseSchedule {
    horizon: usize,
    kind: BetaSchedule,
    betas: Vec<f64>,
    alphas: Vec<f64>,
    alphas_cumprod: Vec<f64>,
    sigmas: Vec<f64>,
}

impl NoiseSchedule {
    /// Build a schedule of `horizon` steps.
    ///
    /// `beta_start` and `beta_end` are only read by [BetaSchedule::Linear], they must
    /// lie in `(0, 1)` with `beta_start <= beta_end`.
    pub fn new(
        horizon: usize,
        kind: BetaSchedule,
        beta_start: f64,
        beta_end: f64,
    ) -> error::Result<Self> {
        if horizon == 0 {
            return Err(DiffusionError::InvalidConfiguration(
                "the diffusion horizon must be at least one step".into(),
            ));
        }

        let betas = match kind {
            BetaSchedule::Linear => {
                check_linear_bounds(beta_start, beta_end)?;
                linear_betas(beta_start, beta_end, horizon)
            }
            BetaSchedule::Cosine => cosine_betas(horizon, COSINE_MAX_BETA),
        };

        let alphas: Vec<f64> = betas.iter().map(|beta| 1.0 - beta).collect();
        let mut alphas_cumprod = Vec::with_capacity(horizon);
        for alpha in &alphas {
            alphas_cumprod.push(alpha * alphas_cumprod.last().copied().unwrap_or(1.0));
        }
        let sigmas = betas.iter().map(|beta| beta.sqrt()).collect();

        tracing::debug!(
            horizon,
            schedule = %kind,
            final_alpha_bar = alphas_cumprod[horizon - 1],
            "built noise schedule"
        );

        Ok(Self {
            horizon,
            kind,
            betas,
            alphas,
            alphas_cumprod,
            sigmas,
        })
    }

    /// Number of diffusion steps `T`.
    pub fn horizon(&self) -> usize {
        self.horizon
    }

    pub fn kind(&self) -> BetaSchedule {
        self.kind
    }

    /// Noise variance injected at each step.
    pub fn betas(&self) -> &[f64] {
        &self.betas
    }

    /// `1 - beta` for each step.
    pub fn alphas(&self) -> &[f64] {
        &self.alphas
    }

    /// Cumulative product of the alphas, `alpha_bar[t] = alpha[0] * ... * alpha[t]`.
    pub fn alphas_cumprod(&self) -> &[f64] {
        &self.alphas_cumprod
    }

    /// Standard deviation of the noise injected by a reverse step, `sqrt(beta)`.
    pub fn sigmas(&self) -> &[f64] {
        &self.sigmas
    }

    pub fn beta(&self, timestep: usize) -> error::Result<f64> {
        self.check_timestep(timestep).map(|t| self.betas[t])
    }

    pub fn alpha(&self, timestep: usize) -> error::Result<f64> {
        self.check_timestep(timestep).map(|t| self.alphas[t])
    }

    pub fn alpha_bar(&self, timestep: usize) -> error::Result<f64> {
        self.check_timestep(timestep).map(|t| self.alphas_cumprod[t])
    }

    pub fn sigma(&self, timestep: usize) -> error::Result<f64> {
        self.check_timestep(timestep).map(|t| self.sigmas[t])
    }

    /// Returns the timestep unchanged when it indexes into the schedule.
    pub fn check_timestep(&self, timestep: usize) -> error::Result<usize> {
        if timestep < self.horizon {
            Ok(timestep)
        } else {
            Err(DiffusionError::InvalidTimestep {
                timestep,
                horizon: self.horizon,
            })
        }
    }
}

fn check_linear_bounds(beta_start: f64, beta_end: f64) -> error::Result<()> {
    let in_unit_interval = |beta: f64| beta.is_finite() && beta > 0.0 && beta < 1.0;

    if !in_unit_interval(beta_start) || !in_unit_interval(beta_end) {
        return Err(DiffusionError::InvalidConfiguration(format!(
            "linear beta bounds must lie in (0, 1), got [{beta_start}, {beta_end}]"
        )));
    }
    if beta_start > beta_end {
        return Err(DiffusionError::InvalidConfiguration(format!(
            "beta_start ({beta_start}) must not exceed beta_end ({beta_end})"
        )));
    }

    Ok(())
}

/// `num_steps` values evenly spaced over `[start, end]`, both ends included.
///
/// The first half is stepped up from `start` and the second half down from `end`,
/// so both endpoints are reproduced exactly.
fn linear_betas(start: f64, end: f64, num_steps: usize) -> Vec<f64> {
    if num_steps == 1 {
        return vec![start];
    }

    let step = (end - start) / (num_steps - 1) as f64;
    let half = num_steps / 2;

    (0..num_steps)
        .map(|i| {
            if i < half {
                start + step * i as f64
            } else {
                end - step * (num_steps - 1 - i) as f64
            }
        })
        .collect()
}

/// Cosine schedule from "Improved Denoising Diffusion Probabilistic Models".
///
/// `f(t) = cos(((t / T + s) / (1 + s)) * pi / 2)^2` and `beta[t] = 1 - f(t) / f(0)`,
/// clipped to `[0, max_beta]`.
fn cosine_betas(num_steps: usize, max_beta: f64) -> Vec<f64> {
    let f = |t: usize| {
        let progress = t as f64 / num_steps as f64;
        let angle = (progress + COSINE_OFFSET) / (1.0 + COSINE_OFFSET);
        f64::cos(angle * core::f64::consts::FRAC_PI_2).powi(2)
    };
    let f0 = f(0);

    (0..num_steps)
        .map(|t| (1.0 - f(t) / f0).clamp(0.0, max_beta))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-12, "{actual:?} != {expected:?}");
        }
    }

    #[test]
    fn test_arrays_have_horizon_length() {
        for kind in [BetaSchedule::Linear, BetaSchedule::Cosine] {
            for horizon in [1, 2, 10, 1000] {
                let schedule = NoiseSchedule::new(horizon, kind, 1e-4, 0.02).unwrap();

                assert_eq!(schedule.horizon(), horizon);
                assert_eq!(schedule.betas().len(), horizon);
                assert_eq!(schedule.alphas().len(), horizon);
                assert_eq!(schedule.alphas_cumprod().len(), horizon);
                assert_eq!(schedule.sigmas().len(), horizon);
                assert!((schedule.alphas_cumprod()[0] - schedule.alphas()[0]).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_linear_betas() {
        let schedule = NoiseSchedule::new(5, BetaSchedule::Linear, 0.1, 0.5).unwrap();

        assert_close(schedule.betas(), &[0.1, 0.2, 0.3, 0.4, 0.5]);
        assert_eq!(schedule.betas()[0], 0.1);
        assert_eq!(schedule.betas()[4], 0.5);
        assert_close(schedule.alphas(), &[0.9, 0.8, 0.7, 0.6, 0.5]);
        assert_close(
            schedule.alphas_cumprod(),
            &[0.9, 0.72, 0.504, 0.3024, 0.1512],
        );
        assert_close(
            schedule.sigmas(),
            &[0.1f64.sqrt(), 0.2f64.sqrt(), 0.3f64.sqrt(), 0.4f64.sqrt(), 0.5f64.sqrt()],
        );
    }

    #[test]
    fn test_linear_alpha_bar_strictly_decreasing() {
        let schedule = NoiseScheduleConfig::new().init().unwrap();

        assert_eq!(schedule.horizon(), 1000);
        assert!(schedule
            .alphas_cumprod()
            .windows(2)
            .all(|pair| pair[1] < pair[0]));
        assert!(schedule.alphas_cumprod()[999] > 0.0);
    }

    #[test]
    fn test_single_step_linear_uses_lower_bound() {
        let schedule = NoiseSchedule::new(1, BetaSchedule::Linear, 0.1, 0.1).unwrap();

        assert_eq!(schedule.betas(), &[0.1]);
        assert_close(schedule.alphas_cumprod(), &[0.9]);
    }

    #[test]
    fn test_cosine_betas_are_clipped() {
        for horizon in [1, 2, 10, 100, 1000] {
            let schedule = NoiseSchedule::new(horizon, BetaSchedule::Cosine, 0.0, 0.0).unwrap();

            assert_eq!(schedule.betas()[0], 0.0);
            assert!(schedule
                .betas()
                .iter()
                .all(|beta| (0.0..=COSINE_MAX_BETA).contains(beta)));
            assert!(schedule
                .alphas_cumprod()
                .windows(2)
                .all(|pair| pair[1] <= pair[0]));
        }
    }

    #[test]
    fn test_cosine_ignores_bounds() {
        let a = NoiseSchedule::new(50, BetaSchedule::Cosine, 0.5, 0.1).unwrap();
        let b = NoiseSchedule::new(50, BetaSchedule::Cosine, 1e-4, 0.02).unwrap();

        assert_eq!(a, b);
    }

    #[test]
    fn test_zero_horizon_is_rejected() {
        let err = NoiseScheduleConfig::new()
            .with_train_timesteps(0)
            .init()
            .unwrap_err();

        assert!(matches!(err, DiffusionError::InvalidConfiguration(_)));
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_invalid_linear_bounds_are_rejected() {
        for (start, end) in [(0.5, 0.1), (0.0, 0.1), (0.1, 1.0), (f64::NAN, 0.1)] {
            let err = NoiseSchedule::new(10, BetaSchedule::Linear, start, end).unwrap_err();
            assert!(matches!(err, DiffusionError::InvalidConfiguration(_)));
        }
    }

    #[test]
    fn test_timestep_accessors() {
        let schedule = NoiseSchedule::new(5, BetaSchedule::Linear, 0.1, 0.5).unwrap();

        assert_eq!(schedule.beta(0), Ok(0.1));
        assert_eq!(schedule.sigma(4), Ok(0.5f64.sqrt()));
        assert_eq!(
            schedule.alpha_bar(5),
            Err(DiffusionError::InvalidTimestep {
                timestep: 5,
                horizon: 5
            })
        );
    }

    #[test]
    fn test_config_round_trip() {
        let config = NoiseScheduleConfig::new()
            .with_train_timesteps(100)
            .with_beta_schedule(BetaSchedule::Cosine);

        let loaded = NoiseScheduleConfig::load_binary(config.to_string().as_bytes()).unwrap();

        assert_eq!(loaded, config);
        assert!(config.to_string().contains("\"cosine\""));
    }

    #[test]
    fn test_config_rejects_unknown_schedule() {
        let json = r#"{
            "train_timesteps": 10,
            "beta_schedule": "sigmoid",
            "beta_start": 0.0001,
            "beta_end": 0.02
        }"#;

        assert!(NoiseScheduleConfig::load_binary(json.as_bytes()).is_err());
    }
}
