//! Convolutional action-value function.
mod base;
mod config;
pub use base::QNetwork;
pub use config::QNetworkConfig;
