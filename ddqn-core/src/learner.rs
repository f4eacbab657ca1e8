//! Double Q-learning.
mod base;
mod config;
mod loss;
pub use base::DoubleQLearner;
pub use config::DoubleQConfig;
pub use loss::{smooth_l1_grad, smooth_l1_loss};
