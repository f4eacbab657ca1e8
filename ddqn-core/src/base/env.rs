//! Environment.
use super::{Observation, Step};
use anyhow::Result;

/// Represents an environment with image observations and a discrete action space.
///
/// Observation preprocessing (frame skipping, stacking, scaling) is the
/// responsibility of the implementor: [`Env::reset`] and [`Env::step`] must return
/// observations of one fixed shape for the lifetime of a run.
pub trait Env {
    /// The number of actions. Valid actions are `0..n_actions()`.
    fn n_actions(&self) -> usize;

    /// Starts a new episode and returns its first observation.
    fn reset(&mut self) -> Result<Observation>;

    /// Performs an environment step.
    ///
    /// An action outside of the action space should be reported as
    /// [`DdqnError::InvalidAction`](crate::error::DdqnError::InvalidAction).
    fn step(&mut self, action: usize) -> Result<Step>;
}
