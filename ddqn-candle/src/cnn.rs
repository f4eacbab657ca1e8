//! Convolutional neural network for image observations.
//!
//! The architecture is the same as in the DQN Nature paper: three convolution layers
//! followed by two linear layers. Its width is scaled with [`NetSize`].
mod base;
mod config;
pub use base::Cnn;
pub use config::{CnnConfig, NetSize};
