//! Utilities.
mod named_tensors;
use anyhow::Result;
use candle_core::{Device, Tensor};
use ddqn_core::ObsBatch;
use ndarray::Array2;
pub use named_tensors::NamedTensors;

/// Converts a batch of observations to a `[batch, channels, height, width]` tensor.
pub fn obs_to_tensor(obs: &ObsBatch, device: &Device) -> Result<Tensor> {
    let shape = obs.shape().to_vec();
    let data = obs.iter().copied().collect::<Vec<f32>>();
    Ok(Tensor::from_vec(data, shape, device)?)
}

/// Converts a `[batch, n]` tensor to an array.
pub fn tensor_to_array2(t: &Tensor) -> Result<Array2<f32>> {
    let (n, m) = t.dims2()?;
    let data = t.flatten_all()?.to_vec1::<f32>()?;
    Ok(Array2::from_shape_vec((n, m), data)?)
}
