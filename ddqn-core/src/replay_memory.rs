//! Replay memory.
mod base;
mod config;
pub use base::ReplayMemory;
pub use config::ReplayMemoryConfig;
