#![warn(missing_docs)]
//! Learning mechanics of double deep Q-learning.
//!
//! This crate provides the components needed to train a value-based agent
//! on an environment with image observations and a discrete action space:
//!
//! * [`ReplayMemory`] - a bounded FIFO store of [`Transition`]s with uniform sampling
//!   without replacement.
//! * [`EpsilonSchedule`] and [`EpsilonGreedy`] - a linear exploration schedule and the
//!   action selection rule consuming it.
//! * [`DoubleQLearner`] - owns the online and target value functions, computes double-Q
//!   regression targets and applies gradient steps.
//! * [`Trainer`] - the training loop interleaving environment steps, memory insertion,
//!   learning and target synchronization.
//!
//! The environment, the function approximator and the reporting sink are collaborators
//! described by the traits [`Env`], [`ValueFunction`] and [`record::Recorder`].
//! A deep-learning backed [`ValueFunction`] lives in a separate crate; [`LinearQFunction`]
//! in this crate is a small ndarray implementation for tests and tiny observations.
pub mod error;
pub mod explorer;
pub mod record;
pub mod replay_memory;

mod base;
pub use base::{Env, ObsBatch, Observation, Step, Transition, ValueFunction};

mod learner;
pub use learner::{smooth_l1_grad, smooth_l1_loss, DoubleQConfig, DoubleQLearner};

mod linear;
pub use linear::LinearQFunction;

mod trainer;
pub use trainer::{EpisodeStats, Sampler, TrainStats, Trainer, TrainerConfig, TransitionStore};

pub use explorer::{argmax, EpsilonGreedy, EpsilonSchedule};
pub use replay_memory::{ReplayMemory, ReplayMemoryConfig};
