//! # Models
//!
//! Noise predictors to be used in a diffusion loop.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

pub mod embeddings;
pub mod unet;

/// Estimates the noise present in a batch of noised samples.
///
/// This is the only capability the [diffusion process](crate::schedulers::DiffusionProcess)
/// needs from a model. The returned tensor has the shape of `xt`.
pub trait NoisePredictor<B: Backend, const D: usize> {
    type Error;

    fn predict_noise(
        &self,
        xt: Tensor<B, D>,
        timestep: usize,
    ) -> Result<Tensor<B, D>, Self::Error>;
}

/// A [noise predictor](NoisePredictor) backed by a closure, see [predictor_fn].
#[derive(Clone, Copy)]
pub struct FnPredictor<F> {
    f: F,
}

/// Wraps `f(xt, timestep)` into a [noise predictor](NoisePredictor).
pub fn predictor_fn<B, F, E, const D: usize>(f: F) -> FnPredictor<F>
where
    B: Backend,
    F: Fn(Tensor<B, D>, usize) -> Result<Tensor<B, D>, E>,
{
    FnPredictor { f }
}

impl<B, F, E, const D: usize> NoisePredictor<B, D> for FnPredictor<F>
where
    B: Backend,
    F: Fn(Tensor<B, D>, usize) -> Result<Tensor<B, D>, E>,
{
    type Error = E;

    fn predict_noise(
        &self,
        xt: Tensor<B, D>,
        timestep: usize,
    ) -> Result<Tensor<B, D>, Self::Error> {
        (self.f)(xt, timestep)
    }
}
