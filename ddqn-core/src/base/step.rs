//! Environment step.
use super::Observation;

/// The outcome of applying an action to an environment.
///
/// An environment emits a [`Step`] at every interaction step. The trainer turns it
/// into a [`Transition`](crate::Transition) `(o_t, a_t, r_t, o_t+1)`, where `o_t` is
/// kept by the [`Sampler`](crate::Sampler).
#[derive(Clone, Debug)]
pub struct Step {
    /// Observation after the action.
    pub obs: Observation,

    /// Reward.
    pub reward: f32,

    /// Flag denoting if the episode ended with this step.
    pub is_done: bool,
}

impl Step {
    /// Constructs a [`Step`] object.
    pub fn new(obs: Observation, reward: f32, is_done: bool) -> Self {
        Self {
            obs,
            reward,
            is_done,
        }
    }
}
