use burn::tensor::backend::Backend;
use burn::tensor::{Data, ElementConversion, Shape, Tensor};
use num_traits::ToPrimitive;
use rand::Rng;
use rand_distr::StandardNormal;

/// Draws a tensor of independent standard-normal values from `rng`.
///
/// Values are produced in row-major order, so a given generator state always
/// yields the same tensor for the same shape.
pub fn standard_normal<B: Backend, const D: usize, R: Rng + ?Sized>(
    shape: impl Into<Shape<D>>,
    device: &B::Device,
    rng: &mut R,
) -> Tensor<B, D> {
    let shape = shape.into();
    let values: Vec<B::FloatElem> = (0..shape.num_elements())
        .map(|_| rng.sample::<f64, _>(StandardNormal).elem())
        .collect();

    Tensor::from_data(Data::new(values, shape), device)
}

/// Lays one coefficient per batch element along the first dimension, with every
/// other dimension of size one so that it broadcasts over a `D`-dimensional batch.
pub(crate) fn per_example<B: Backend, const D: usize>(
    coefficients: impl IntoIterator<Item = f64>,
    device: &B::Device,
) -> Tensor<B, D> {
    let values: Vec<B::FloatElem> = coefficients.into_iter().map(|c| c.elem()).collect();
    let mut dims = [1; D];
    dims[0] = values.len();

    Tensor::from_data(Data::new(values, Shape::new(dims)), device)
}

/// Copies the tensor values to the host, in row-major order.
pub fn to_vec_f64<B: Backend, const D: usize>(tensor: Tensor<B, D>) -> Vec<f64> {
    tensor
        .into_data()
        .value
        .into_iter()
        .map(|value| value.to_f64().unwrap_or(f64::NAN))
        .collect()
}
