//! Core functionalities.
mod env;
mod obs;
mod step;
mod transition;
mod value_function;
pub use env::Env;
pub use obs::{ObsBatch, Observation};
pub use step::Step;
pub use transition::Transition;
pub use value_function::ValueFunction;
