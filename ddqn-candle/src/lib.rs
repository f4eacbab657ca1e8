//! A convolutional action-value function for [`ddqn_core`] built with [candle].
//!
//! [`QNetwork`] implements [`ddqn_core::ValueFunction`] with the network of the DQN
//! Nature paper. Its width is chosen with [`NetSize`].
//!
//! ```no_run
//! use ddqn_candle::{CnnConfig, Device, NetSize, QNetwork, QNetworkConfig};
//! use ddqn_core::{DoubleQConfig, DoubleQLearner};
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = QNetworkConfig::default()
//!     .cnn(CnnConfig::new(4, 6).size(NetSize::Normal))
//!     .device(Device::Cpu);
//! let online = QNetwork::build(config.clone())?;
//! let target = QNetwork::build(config)?;
//! let learner = DoubleQLearner::build(DoubleQConfig::default(), online, target)?;
//! # Ok(())
//! # }
//! ```
//!
//! [candle]: https://github.com/huggingface/candle
pub mod cnn;
pub mod opt;
mod q_network;
pub mod util;
pub use cnn::{Cnn, CnnConfig, NetSize};
pub use opt::{Optimizer, OptimizerConfig};
pub use q_network::{QNetwork, QNetworkConfig};
use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Copy, Deserialize, Serialize, PartialEq, Default)]
/// Device for using candle.
///
/// This enum is added because [`candle_core::Device`] does not support serialization.
pub enum Device {
    /// The main CPU device.
    #[default]
    Cpu,

    /// The GPU device with the given ordinal.
    Cuda(usize),
}

impl Device {
    /// Creates the corresponding [`candle_core::Device`].
    pub fn to_candle(self) -> Result<candle_core::Device> {
        Ok(match self {
            Self::Cpu => candle_core::Device::Cpu,
            Self::Cuda(n) => candle_core::Device::new_cuda(n)?,
        })
    }
}
