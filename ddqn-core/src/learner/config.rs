//! Configuration of [`DoubleQLearner`](super::DoubleQLearner).
use serde::{Deserialize, Serialize};

/// Configuration of [`DoubleQLearner`](super::DoubleQLearner).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct DoubleQConfig {
    /// Discount factor.
    pub gamma: f32,
}

impl Default for DoubleQConfig {
    fn default() -> Self {
        Self { gamma: 0.99 }
    }
}

impl DoubleQConfig {
    /// Sets the discount factor.
    pub fn gamma(mut self, v: f32) -> Self {
        self.gamma = v;
        self
    }
}
