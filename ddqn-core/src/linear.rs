//! A linear action-value function on flattened observations.
use crate::{error::DdqnError, ObsBatch, ValueFunction};
use anyhow::{Context, Result};
use log::trace;
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, BufWriter},
    path::Path,
};

/// `Q(s, a) = w_a · flatten(s) + b_a`, trained with plain SGD.
///
/// Useful for tests and for environments with tiny observations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearQFunction {
    weights: Array2<f32>,
    bias: Array1<f32>,
    learning_rate: f32,
}

impl LinearQFunction {
    /// Zero-initialized parameters for observations of `obs_shape`.
    pub fn new(obs_shape: (usize, usize, usize), n_actions: usize, learning_rate: f32) -> Self {
        let obs_dim = obs_shape.0 * obs_shape.1 * obs_shape.2;
        Self {
            weights: Array2::zeros((n_actions, obs_dim)),
            bias: Array1::zeros(n_actions),
            learning_rate,
        }
    }

    /// Builds from given parameters.
    ///
    /// `weights` has shape `[n_actions, obs_dim]` and `bias` has length `n_actions`.
    pub fn from_params(weights: Array2<f32>, bias: Array1<f32>, learning_rate: f32) -> Result<Self> {
        if weights.nrows() != bias.len() {
            return Err(DdqnError::InvalidConfig(format!(
                "{} weight rows but {} biases",
                weights.nrows(),
                bias.len()
            ))
            .into());
        }
        Ok(Self {
            weights,
            bias,
            learning_rate,
        })
    }

    /// The weight matrix.
    pub fn weights(&self) -> &Array2<f32> {
        &self.weights
    }

    /// The bias vector.
    pub fn bias(&self) -> &Array1<f32> {
        &self.bias
    }

    fn flatten(&self, obs: &ObsBatch) -> Result<Array2<f32>> {
        let (n, c, h, w) = obs.dim();
        let obs_dim = c * h * w;
        if obs_dim != self.weights.ncols() {
            return Err(DdqnError::BatchShape(format!(
                "observation has {} elements, expected {}",
                obs_dim,
                self.weights.ncols()
            ))
            .into());
        }
        let flat = obs
            .as_standard_layout()
            .into_owned()
            .into_shape((n, obs_dim))
            .map_err(|e| DdqnError::BatchShape(e.to_string()))?;
        Ok(flat)
    }
}

impl ValueFunction for LinearQFunction {
    type Snapshot = (Array2<f32>, Array1<f32>);

    fn n_actions(&self) -> usize {
        self.bias.len()
    }

    fn predict(&self, obs: &ObsBatch) -> Result<Array2<f32>> {
        let x = self.flatten(obs)?;
        Ok(x.dot(&self.weights.t()) + &self.bias)
    }

    fn apply_gradient_step(
        &mut self,
        obs: &ObsBatch,
        actions: &[usize],
        grad: &Array1<f32>,
    ) -> Result<()> {
        let x = self.flatten(obs)?;
        for ((row, &a), &g) in x.axis_iter(Axis(0)).zip(actions.iter()).zip(grad.iter()) {
            let step = self.learning_rate * g;
            self.weights.row_mut(a).scaled_add(-step, &row);
            self.bias[a] -= step;
        }
        trace!("Applied SGD step on {} rows", actions.len());
        Ok(())
    }

    fn snapshot(&self) -> Result<Self::Snapshot> {
        Ok((self.weights.clone(), self.bias.clone()))
    }

    fn restore(&mut self, snapshot: &Self::Snapshot) -> Result<()> {
        let (weights, bias) = snapshot;
        if weights.dim() != self.weights.dim() || bias.len() != self.bias.len() {
            return Err(DdqnError::BatchShape("snapshot shape differs from parameters".into()).into());
        }
        self.weights.assign(weights);
        self.bias.assign(bias);
        Ok(())
    }

    fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
        bincode::serialize_into(BufWriter::new(file), self)?;
        Ok(())
    }

    fn load(&mut self, path: &Path) -> Result<()> {
        let file = File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
        let loaded: Self = bincode::deserialize_from(BufReader::new(file))?;
        self.restore(&(loaded.weights, loaded.bias))?;
        self.learning_rate = loaded.learning_rate;
        Ok(())
    }
}
