use crate::{CnnConfig, Device, OptimizerConfig};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`QNetwork`](super::QNetwork).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone, Default)]
pub struct QNetworkConfig {
    /// Network architecture.
    pub cnn: CnnConfig,

    /// Optimizer.
    pub opt: OptimizerConfig,

    /// Device where the parameters live.
    pub device: Device,
}

impl QNetworkConfig {
    /// Sets the network architecture.
    pub fn cnn(mut self, v: CnnConfig) -> Self {
        self.cnn = v;
        self
    }

    /// Sets the optimizer.
    pub fn opt(mut self, v: OptimizerConfig) -> Self {
        self.opt = v;
        self
    }

    /// Sets the device.
    pub fn device(mut self, v: Device) -> Self {
        self.device = v;
        self
    }

    /// Constructs [`QNetworkConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`QNetworkConfig`] as a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
