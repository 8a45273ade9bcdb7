use burn::tensor::backend::Backend;
use burn::tensor::{Shape, Tensor};
use rand::Rng;

use super::NoiseSchedule;
use crate::error::{DiffusionError, Result};
use crate::models::NoisePredictor;
use crate::utils::{per_example, standard_normal};

/// Denoising diffusion probabilistic model.
///
/// Holds an immutable [noise schedule](NoiseSchedule) and implements the closed-form
/// forward (noising) process and the ancestral reverse sampler of Ho et al., 2020.
/// https://arxiv.org/abs/2006.11239
///
/// All randomness is drawn from the generator passed to each call.
#[derive(Debug, Clone)]
pub struct DiffusionProcess {
    schedule: NoiseSchedule,
}

impl DiffusionProcess {
    pub fn new(schedule: NoiseSchedule) -> Self {
        Self { schedule }
    }

    pub fn schedule(&self) -> &NoiseSchedule {
        &self.schedule
    }

    /// Number of diffusion steps `T`.
    pub fn horizon(&self) -> usize {
        self.schedule.horizon()
    }

    /// Noises `original` to `timestep` with the given noise:
    /// `sqrt(alpha_bar[t]) * original + sqrt(1 - alpha_bar[t]) * noise`.
    pub fn add_noise<B: Backend, const D: usize>(
        &self,
        original: Tensor<B, D>,
        noise: Tensor<B, D>,
        timestep: usize,
    ) -> Result<Tensor<B, D>> {
        let alpha_bar = self.schedule.alpha_bar(timestep)?;

        Ok(original.mul_scalar(alpha_bar.sqrt()) + noise.mul_scalar((1. - alpha_bar).sqrt()))
    }

    /// Same as [add_noise](Self::add_noise) with one timestep per batch element.
    ///
    /// The coefficients of each example are broadcast over its remaining dimensions.
    pub fn add_noise_batch<B: Backend, const D: usize>(
        &self,
        original: Tensor<B, D>,
        noise: Tensor<B, D>,
        timesteps: &[usize],
    ) -> Result<Tensor<B, D>> {
        let alphas_cumprod = self.batch_alphas_cumprod(original.dims()[0], timesteps)?;
        let device = original.device();

        let sqrt_alpha_prod: Tensor<B, D> =
            per_example(alphas_cumprod.iter().map(|a| a.sqrt()), &device);
        let sqrt_one_minus_alpha_prod: Tensor<B, D> =
            per_example(alphas_cumprod.iter().map(|a| (1. - a).sqrt()), &device);

        Ok(original * sqrt_alpha_prod + noise * sqrt_one_minus_alpha_prod)
    }

    /// Samples `x_t ~ q(x_t | x_0)` in a single jump.
    ///
    /// Returns the noised data together with the standard-normal noise that was added.
    pub fn diffuse<B: Backend, const D: usize, R: Rng + ?Sized>(
        &self,
        x0: Tensor<B, D>,
        timestep: usize,
        rng: &mut R,
    ) -> Result<(Tensor<B, D>, Tensor<B, D>)> {
        self.schedule.check_timestep(timestep)?;

        let noise = standard_normal(x0.shape(), &x0.device(), rng);
        let xt = self.add_noise(x0, noise.clone(), timestep)?;

        Ok((xt, noise))
    }

    /// Same as [diffuse](Self::diffuse) with one timestep per batch element.
    pub fn diffuse_batch<B: Backend, const D: usize, R: Rng + ?Sized>(
        &self,
        x0: Tensor<B, D>,
        timesteps: &[usize],
        rng: &mut R,
    ) -> Result<(Tensor<B, D>, Tensor<B, D>)> {
        self.batch_alphas_cumprod(x0.dims()[0], timesteps)?;

        let noise = standard_normal(x0.shape(), &x0.device(), rng);
        let xt = self.add_noise_batch(x0, noise.clone(), timesteps)?;

        Ok((xt, noise))
    }

    /// Draws `batch_size` timesteps uniformly from `[0, T)`, one per training example.
    pub fn sample_timesteps<R: Rng + ?Sized>(&self, batch_size: usize, rng: &mut R) -> Vec<usize> {
        (0..batch_size)
            .map(|_| rng.gen_range(0..self.horizon()))
            .collect()
    }

    /// Perform a backward step, from `x_t` to `x_{t-1}`, given the predicted noise.
    ///
    /// No noise is injected when `timestep == 0`.
    pub fn step<B: Backend, const D: usize, R: Rng + ?Sized>(
        &self,
        sample: Tensor<B, D>,
        model_output: Tensor<B, D>,
        timestep: usize,
        rng: &mut R,
    ) -> Result<Tensor<B, D>> {
        let timestep = self.schedule.check_timestep(timestep)?;

        Ok(self.reverse_step(sample, model_output, timestep, rng))
    }

    /// Generates samples of `shape` starting from pure noise.
    ///
    /// The predictor is called exactly `T` times, with timesteps `T-1, ..., 0`.
    /// Its first error aborts generation and is returned as is.
    pub fn sample<B, P, R, const D: usize>(
        &self,
        predictor: &P,
        shape: impl Into<Shape<D>>,
        device: &B::Device,
        rng: &mut R,
    ) -> core::result::Result<Tensor<B, D>, P::Error>
    where
        B: Backend,
        P: NoisePredictor<B, D> + ?Sized,
        R: Rng + ?Sized,
    {
        let initial_noise = standard_normal(shape, device, rng);

        self.sample_from(predictor, initial_noise, rng)
    }

    /// Runs the reverse process from a caller-provided `x_T`.
    pub fn sample_from<B, P, R, const D: usize>(
        &self,
        predictor: &P,
        initial_noise: Tensor<B, D>,
        rng: &mut R,
    ) -> core::result::Result<Tensor<B, D>, P::Error>
    where
        B: Backend,
        P: NoisePredictor<B, D> + ?Sized,
        R: Rng + ?Sized,
    {
        tracing::debug!(
            horizon = self.horizon(),
            shape = ?initial_noise.dims(),
            "starting reverse diffusion"
        );

        let mut xt = initial_noise;
        for timestep in (0..self.horizon()).rev() {
            tracing::trace!(timestep, "denoising step");
            let noise_pred = predictor.predict_noise(xt.clone(), timestep)?;
            xt = self.reverse_step(xt, noise_pred, timestep, rng);
        }

        tracing::debug!("reverse diffusion finished");

        Ok(xt)
    }

    fn reverse_step<B: Backend, const D: usize, R: Rng + ?Sized>(
        &self,
        sample: Tensor<B, D>,
        model_output: Tensor<B, D>,
        timestep: usize,
        rng: &mut R,
    ) -> Tensor<B, D> {
        let alpha = self.schedule.alphas()[timestep];
        let alpha_prod_t = self.schedule.alphas_cumprod()[timestep];
        let sigma = self.schedule.sigmas()[timestep];

        let mean = (sample - model_output.mul_scalar(noise_coefficient(alpha, alpha_prod_t)))
            .div_scalar(alpha.sqrt());

        if timestep > 0 {
            let noise = standard_normal(mean.shape(), &mean.device(), rng);
            mean + noise.mul_scalar(sigma)
        } else {
            mean
        }
    }

    fn batch_alphas_cumprod(&self, batch_size: usize, timesteps: &[usize]) -> Result<Vec<f64>> {
        if timesteps.len() != batch_size {
            return Err(DiffusionError::BatchSizeMismatch {
                expected: batch_size,
                actual: timesteps.len(),
            });
        }

        timesteps
            .iter()
            .map(|&timestep| self.schedule.alpha_bar(timestep))
            .collect()
    }
}

/// `(1 - alpha) / sqrt(1 - alpha_bar)`, the weight of the predicted noise in the
/// posterior mean.
///
/// A step that adds no noise (`beta = 0`, first step of a cosine schedule) has a
/// zero numerator and denominator, its weight is zero.
fn noise_coefficient(alpha: f64, alpha_prod_t: f64) -> f64 {
    let beta_prod_t = 1. - alpha_prod_t;
    if beta_prod_t <= 0. {
        0.
    } else {
        (1. - alpha) / beta_prod_t.sqrt()
    }
}
