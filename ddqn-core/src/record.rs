//! Reporting of training progress.
//!
//! The [`Trainer`](crate::Trainer) reports the end of every episode and the loss of
//! every learning step to a [`Recorder`] as a [`Record`], a set of named values.
//!
//! ```rust
//! use ddqn_core::record::{Record, RecordValue};
//!
//! let mut record = Record::from_scalar("episode_return", 21.0);
//! record.insert("phase", RecordValue::String("train".to_string()));
//! assert_eq!(record.get_scalar("episode_return").unwrap(), 21.0);
//! ```
mod base;
mod buffered_recorder;
mod null_recorder;
mod recorder;

pub use base::{Record, RecordValue};
pub use buffered_recorder::BufferedRecorder;
pub use null_recorder::NullRecorder;
pub use recorder::Recorder;
