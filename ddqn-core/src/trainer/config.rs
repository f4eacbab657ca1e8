//! Configuration of [`Trainer`](super::Trainer).
use crate::{error::DdqnError, EpsilonSchedule, ReplayMemoryConfig};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`Trainer`](super::Trainer).
///
/// Intervals are counted in environment steps, except `save_interval`, which is
/// counted in episodes.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct TrainerConfig {
    /// The number of environment steps.
    pub max_iterations: usize,

    /// The number of transitions in a learning batch.
    pub batch_size: usize,

    /// Learning starts after this many environment steps.
    pub warmup_steps: usize,

    /// Interval of learning steps.
    pub learn_every: usize,

    /// Interval of target network synchronization.
    ///
    /// Synchronization is checked on learning steps only, so this should be a
    /// multiple of `learn_every`.
    pub target_sync_every: usize,

    /// Configuration of the replay memory.
    pub memory: ReplayMemoryConfig,

    /// Exploration schedule.
    pub explorer: EpsilonSchedule,

    /// Interval of progress logs.
    pub log_interval: usize,

    /// Interval of checkpoints in episodes.
    pub save_interval: usize,

    /// Where checkpoints are saved. No checkpoint is saved if `None`.
    pub model_dir: Option<String>,

    /// Seed of the random number generator used for action selection.
    pub seed: u64,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            max_iterations: 1_000_000,
            batch_size: 32,
            warmup_steps: 10_000,
            learn_every: 4,
            target_sync_every: 1_000,
            memory: ReplayMemoryConfig::default(),
            explorer: EpsilonSchedule::default(),
            log_interval: 1_000,
            save_interval: 100,
            model_dir: None,
            seed: 42,
        }
    }
}

impl TrainerConfig {
    /// Sets the number of environment steps.
    pub fn max_iterations(mut self, v: usize) -> Self {
        self.max_iterations = v;
        self
    }

    /// Sets the batch size.
    pub fn batch_size(mut self, v: usize) -> Self {
        self.batch_size = v;
        self
    }

    /// Sets the warmup period.
    pub fn warmup_steps(mut self, v: usize) -> Self {
        self.warmup_steps = v;
        self
    }

    /// Sets the interval of learning steps.
    pub fn learn_every(mut self, v: usize) -> Self {
        self.learn_every = v;
        self
    }

    /// Sets the interval of target network synchronization.
    pub fn target_sync_every(mut self, v: usize) -> Self {
        self.target_sync_every = v;
        self
    }

    /// Sets the configuration of the replay memory.
    pub fn memory(mut self, v: ReplayMemoryConfig) -> Self {
        self.memory = v;
        self
    }

    /// Sets the exploration schedule.
    pub fn explorer(mut self, v: EpsilonSchedule) -> Self {
        self.explorer = v;
        self
    }

    /// Sets the interval of progress logs.
    pub fn log_interval(mut self, v: usize) -> Self {
        self.log_interval = v;
        self
    }

    /// Sets the interval of checkpoints in episodes.
    pub fn save_interval(mut self, v: usize) -> Self {
        self.save_interval = v;
        self
    }

    /// Sets the directory where checkpoints are saved.
    pub fn model_dir(mut self, v: impl Into<String>) -> Self {
        self.model_dir = Some(v.into());
        self
    }

    /// Sets the seed of action selection.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }

    /// Checks the preconditions of the training loop.
    pub fn validate(&self) -> Result<()> {
        let err = |msg: String| -> Result<()> { Err(DdqnError::InvalidConfig(msg).into()) };

        if self.batch_size == 0 {
            return err("batch_size must be positive".into());
        }
        if self.warmup_steps < self.batch_size {
            return err(format!(
                "warmup_steps ({}) must not be smaller than batch_size ({})",
                self.warmup_steps, self.batch_size
            ));
        }
        if self.batch_size > self.memory.capacity {
            return err(format!(
                "batch_size ({}) exceeds memory capacity ({})",
                self.batch_size, self.memory.capacity
            ));
        }
        for (name, v) in [
            ("learn_every", self.learn_every),
            ("target_sync_every", self.target_sync_every),
            ("log_interval", self.log_interval),
            ("save_interval", self.save_interval),
            ("explorer.eps_step", self.explorer.eps_step),
        ] {
            if v == 0 {
                return err(format!("{} must be positive", name));
            }
        }
        Ok(())
    }

    /// Loads the configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves the configuration as a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
