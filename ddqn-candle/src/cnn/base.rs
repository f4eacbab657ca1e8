use super::CnnConfig;
use anyhow::{anyhow, Result};
use candle_core::{DType::F32, Tensor};
use candle_nn::{
    conv::Conv2dConfig,
    conv2d_no_bias, linear,
    sequential::{seq, Sequential},
    Module, VarBuilder,
};

#[allow(clippy::upper_case_acronyms)]
/// Convolutional neural network, which has the same architecture of the DQN paper.
///
/// Takes `[batch, n_stack, height, width]` and returns `[batch, n_actions]`.
pub struct Cnn {
    seq: Sequential,
}

impl Cnn {
    fn stride(s: usize) -> Conv2dConfig {
        Conv2dConfig {
            stride: s,
            ..Default::default()
        }
    }

    /// Builds the network with variables created by `vb`.
    pub fn build(vb: &VarBuilder, config: &CnnConfig) -> Result<Self> {
        let (h, w) = config.conv_out_size().ok_or_else(|| {
            anyhow!(
                "Image size {}x{} is too small for the network",
                config.height,
                config.width
            )
        })?;
        let [c1, c2, c3] = config.size.channels();
        let hidden = config.size.hidden();
        let scale = config.input_scale as f64;

        let seq = seq()
            .add_fn(move |xs| xs.to_dtype(F32)?.affine(scale, 0.0))
            .add(conv2d_no_bias(
                config.n_stack,
                c1,
                8,
                Self::stride(4),
                vb.pp("c1"),
            )?)
            .add_fn(|xs| xs.relu())
            .add(conv2d_no_bias(c1, c2, 4, Self::stride(2), vb.pp("c2"))?)
            .add_fn(|xs| xs.relu())
            .add(conv2d_no_bias(c2, c3, 3, Self::stride(1), vb.pp("c3"))?)
            .add_fn(|xs| xs.relu()?.flatten_from(1))
            .add(linear(c3 * h * w, hidden, vb.pp("l1"))?)
            .add_fn(|xs| xs.relu())
            .add(linear(hidden, config.n_actions, vb.pp("l2"))?);

        Ok(Self { seq })
    }

    /// Returns action values.
    pub fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        Ok(self.seq.forward(xs)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NetSize;
    use candle_core::Device;
    use candle_nn::VarMap;

    #[test]
    fn test_output_shape() -> Result<()> {
        for size in [NetSize::Small, NetSize::Normal] {
            let varmap = VarMap::new();
            let vb = VarBuilder::from_varmap(&varmap, F32, &Device::Cpu);
            let config = CnnConfig::new(2, 3).image_size(36, 44).size(size);
            let cnn = Cnn::build(&vb, &config)?;

            let xs = Tensor::zeros((5, 2, 36, 44), F32, &Device::Cpu)?;
            assert_eq!(cnn.forward(&xs)?.dims(), &[5, 3]);
        }
        Ok(())
    }
}
