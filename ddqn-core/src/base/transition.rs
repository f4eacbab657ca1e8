//! Transition.
use super::Observation;

/// A single interaction step `(s, a, r, s')`.
///
/// When the episode ended with this step, `next_state` is the all-zero observation
/// of the same shape as `state` and `is_terminal` is `true`. The flag is what the
/// learner looks at; an all-zero `next_state` alone does not mark a transition
/// as terminal.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    /// Observation before the action.
    pub state: Observation,

    /// Index of the action taken.
    pub action: usize,

    /// Reward received.
    pub reward: f32,

    /// Observation after the action, or the zero sentinel at episode end.
    pub next_state: Observation,

    /// The episode ended after this transition.
    pub is_terminal: bool,
}

impl Transition {
    /// A transition in the middle of an episode.
    pub fn new(state: Observation, action: usize, reward: f32, next_state: Observation) -> Self {
        Self {
            state,
            action,
            reward,
            next_state,
            is_terminal: false,
        }
    }

    /// A transition ending an episode.
    ///
    /// `next_state` is set to the zero sentinel.
    pub fn terminal(state: Observation, action: usize, reward: f32) -> Self {
        let next_state = state.zeros_like();
        Self {
            state,
            action,
            reward,
            next_state,
            is_terminal: true,
        }
    }
}
