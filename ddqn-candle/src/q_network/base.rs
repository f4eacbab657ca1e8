use super::QNetworkConfig;
use crate::{
    util::{obs_to_tensor, tensor_to_array2, NamedTensors},
    Cnn, Optimizer,
};
use anyhow::{anyhow, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::{VarBuilder, VarMap};
use ddqn_core::{error::DdqnError, ObsBatch, ValueFunction};
use log::info;
use ndarray::{Array1, Array2};
use std::path::Path;

/// A [`Cnn`] with its variables and optimizer.
///
/// Parameters are saved in the safetensors format.
pub struct QNetwork {
    device: Device,
    varmap: VarMap,
    cnn: Cnn,
    opt: Optimizer,
    config: QNetworkConfig,
}

impl QNetwork {
    /// Constructs [`QNetwork`] with randomly initialized parameters.
    pub fn build(config: QNetworkConfig) -> Result<Self> {
        if config.cnn.n_actions == 0 {
            return Err(DdqnError::InvalidConfig("n_actions must be positive".into()).into());
        }

        let device = config.device.to_candle()?;
        let varmap = VarMap::new();
        let cnn = {
            let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
            Cnn::build(&vb, &config.cnn)?
        };
        let opt = config.opt.build(varmap.all_vars())?;

        Ok(Self {
            device,
            varmap,
            cnn,
            opt,
            config,
        })
    }

    /// The configuration.
    pub fn config(&self) -> &QNetworkConfig {
        &self.config
    }

    /// The variables of the network.
    pub fn varmap(&self) -> &VarMap {
        &self.varmap
    }

    fn input(&self, obs: &ObsBatch) -> Result<Tensor> {
        let (_, c, h, w) = obs.dim();
        let cnn = &self.config.cnn;
        if (c, h, w) != (cnn.n_stack, cnn.height, cnn.width) {
            return Err(DdqnError::BatchShape(format!(
                "observation shape {:?} differs from network input {:?}",
                (c, h, w),
                (cnn.n_stack, cnn.height, cnn.width)
            ))
            .into());
        }
        obs_to_tensor(obs, &self.device)
    }
}

impl ValueFunction for QNetwork {
    type Snapshot = NamedTensors;

    fn n_actions(&self) -> usize {
        self.config.cnn.n_actions
    }

    fn predict(&self, obs: &ObsBatch) -> Result<Array2<f32>> {
        let xs = self.input(obs)?;
        let q = self.cnn.forward(&xs)?.detach();
        tensor_to_array2(&q)
    }

    fn apply_gradient_step(
        &mut self,
        obs: &ObsBatch,
        actions: &[usize],
        grad: &Array1<f32>,
    ) -> Result<()> {
        let n = actions.len();
        if grad.len() != n || obs.dim().0 != n {
            return Err(DdqnError::BatchShape(format!(
                "{} observations, {} actions and {} gradients",
                obs.dim().0,
                n,
                grad.len()
            ))
            .into());
        }

        let xs = self.input(obs)?;
        let actions = actions.iter().map(|&a| a as u32).collect::<Vec<_>>();
        let actions = Tensor::from_vec(actions, (n, 1), &self.device)?;
        let grad = Tensor::from_vec(grad.to_vec(), n, &self.device)?;

        // The gradient of sum_i pred_i * grad_i with respect to the parameters equals
        // that of the loss, since grad_i is dL/dpred_i.
        let pred = self.cnn.forward(&xs)?.gather(&actions, 1)?.squeeze(1)?;
        let surrogate = (pred * grad)?.sum_all()?;
        self.opt.backward_step(&surrogate)
    }

    fn snapshot(&self) -> Result<Self::Snapshot> {
        NamedTensors::copy_from(&self.varmap)
    }

    fn restore(&mut self, snapshot: &Self::Snapshot) -> Result<()> {
        snapshot.copy_to(&self.varmap)
    }

    fn save(&self, path: &Path) -> Result<()> {
        self.varmap.save(path)?;
        info!("Save q-network to {:?}", path);
        Ok(())
    }

    fn load(&mut self, path: &Path) -> Result<()> {
        if !path.exists() {
            return Err(anyhow!("No such file: {:?}", path));
        }
        self.varmap.load(path)?;
        info!("Load q-network from {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CnnConfig, NetSize, OptimizerConfig};
    use ddqn_core::smooth_l1_grad;
    use ndarray::{array, Array4};
    use tempdir::TempDir;

    fn config() -> QNetworkConfig {
        QNetworkConfig::default()
            .cnn(CnnConfig::new(2, 3).image_size(36, 36).size(NetSize::Small))
            .opt(OptimizerConfig::Adam { lr: 1e-3 })
    }

    fn obs(n: usize) -> ObsBatch {
        Array4::from_shape_fn((n, 2, 36, 36), |(b, c, h, w)| {
            ((b * 7 + c * 3 + h * 5 + w) as f32 * 0.1).sin()
        })
    }

    #[test]
    fn test_predict_shape() -> Result<()> {
        let q = QNetwork::build(config())?;
        assert_eq!(q.predict(&obs(4))?.dim(), (4, 3));

        let err = q.predict(&Array4::zeros((1, 2, 36, 40))).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DdqnError>(),
            Some(DdqnError::BatchShape(_))
        ));
        Ok(())
    }

    #[test]
    fn test_snapshot_restore() -> Result<()> {
        let mut online = QNetwork::build(config())?;
        let mut target = QNetwork::build(config())?;
        let x = obs(2);
        assert_ne!(online.predict(&x)?, target.predict(&x)?);

        target.restore(&online.snapshot()?)?;
        let q_before = online.predict(&x)?;
        assert_eq!(q_before, target.predict(&x)?);

        // Updating the online network leaves the copy untouched
        online.apply_gradient_step(&x, &[0, 2], &array![1.0, -1.0])?;
        assert_ne!(online.predict(&x)?, q_before);
        assert_eq!(target.predict(&x)?, q_before);
        Ok(())
    }

    #[test]
    fn test_gradient_step_follows_gradient() -> Result<()> {
        let mut q = QNetwork::build(config().opt(OptimizerConfig::Adam { lr: 1e-2 }))?;
        let x = obs(1);
        let before = q.predict(&x)?;

        // A positive gradient decreases the prediction of the selected action
        for _ in 0..5 {
            q.apply_gradient_step(&x, &[1], &array![1.0])?;
        }
        let after = q.predict(&x)?;
        assert!(after[[0, 1]] < before[[0, 1]]);
        Ok(())
    }

    #[test]
    fn test_surrogate_matches_loss_gradient() -> Result<()> {
        let q = QNetwork::build(config())?;
        let xs = q.input(&obs(3))?;
        let actions = Tensor::from_vec(vec![0u32, 2, 1], (3, 1), &q.device)?;
        let pred = q.cnn.forward(&xs)?.gather(&actions, 1)?.squeeze(1)?;
        let pred_arr = Array1::from(pred.to_vec1::<f32>()?);
        let target_arr = &pred_arr + &array![0.3, -2.0, 1.5];
        let target = Tensor::from_vec(target_arr.to_vec(), 3, &q.device)?;

        // Smooth L1 with beta = 1 and mean reduction
        let d = (&pred - &target)?.abs()?;
        let quad = (d.sqr()? * 0.5)?;
        let lin = (&d - 0.5)?;
        let loss = d.lt(1.0)?.where_cond(&quad, &lin)?.mean_all()?;
        let grads_loss = loss.backward()?;

        let grad = smooth_l1_grad(pred_arr.view(), target_arr.view());
        let grad = Tensor::from_vec(grad.to_vec(), 3, &q.device)?;
        let grads_surrogate = (&pred * grad)?.sum_all()?.backward()?;

        for var in q.varmap.all_vars() {
            let g1 = grads_loss.get(var.as_tensor()).unwrap();
            let g2 = grads_surrogate.get(var.as_tensor()).unwrap();
            let diff = (g1 - g2)?.abs()?.flatten_all()?.max(0)?.to_scalar::<f32>()?;
            assert!(diff < 1e-5, "{}", diff);
        }
        Ok(())
    }

    #[test]
    fn test_save_load() -> Result<()> {
        let dir = TempDir::new("q_network")?;
        let path = dir.path().join("q.safetensors");
        let q1 = QNetwork::build(config())?;
        q1.save(&path)?;

        let mut q2 = QNetwork::build(config())?;
        q2.load(&path)?;
        let x = obs(3);
        assert_eq!(q1.predict(&x)?, q2.predict(&x)?);
        assert!(q2.load(&dir.path().join("missing")).is_err());
        Ok(())
    }
}
