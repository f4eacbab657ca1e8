//! Action-value function.
use super::ObsBatch;
use anyhow::Result;
use ndarray::{Array1, Array2};
use std::path::Path;

/// A trainable mapping from an observation to one value per action.
///
/// The architecture is up to the implementor. [`DoubleQLearner`](crate::DoubleQLearner)
/// owns two instances, the online and the target network, and moves parameters
/// between them only through [`ValueFunction::snapshot`] and [`ValueFunction::restore`].
pub trait ValueFunction {
    /// An owned copy of the parameters, independent of the network it was taken from.
    type Snapshot;

    /// The number of actions, i.e., the width of the output of [`ValueFunction::predict`].
    fn n_actions(&self) -> usize;

    /// Returns action values with shape `[batch, n_actions]`.
    fn predict(&self, obs: &ObsBatch) -> Result<Array2<f32>>;

    /// Applies one optimization step.
    ///
    /// `grad[i]` is the derivative of the loss with respect to the predicted value
    /// of `actions[i]` for `obs[i]`. The implementor backpropagates it through the
    /// network and updates its parameters with its optimizer.
    ///
    /// With autograd, backpropagating `sum_i Q(obs[i], actions[i]) * grad[i]`, with
    /// `grad` held constant, yields the parameter gradient of the loss.
    fn apply_gradient_step(
        &mut self,
        obs: &ObsBatch,
        actions: &[usize],
        grad: &Array1<f32>,
    ) -> Result<()>;

    /// Takes a deep copy of the parameters.
    fn snapshot(&self) -> Result<Self::Snapshot>;

    /// Overwrites the parameters with a snapshot.
    fn restore(&mut self, snapshot: &Self::Snapshot) -> Result<()>;

    /// Saves the parameters. The file format is up to the implementor.
    fn save(&self, path: &Path) -> Result<()>;

    /// Loads parameters saved with [`ValueFunction::save`].
    fn load(&mut self, path: &Path) -> Result<()>;
}
