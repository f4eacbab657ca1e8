//! Retention of the last transitions of a training run.
use crate::{ReplayMemory, Transition};
use anyhow::Result;

/// Receives the transitions of the final iterations of [`Trainer::train_with_store`].
///
/// The trainer forwards every transition of iteration `i` with
/// `i >= max_iterations - capacity()`, so a store sees at most `capacity()`
/// transitions per run. The transitions are the same ones pushed into the replay
/// memory, e.g., for building a distillation dataset after training.
///
/// [`Trainer::train_with_store`]: super::Trainer::train_with_store
pub trait TransitionStore {
    /// The number of final iterations whose transitions are stored.
    fn capacity(&self) -> usize;

    /// Stores a transition.
    fn store(&mut self, transition: &Transition) -> Result<()>;
}

impl TransitionStore for ReplayMemory {
    fn capacity(&self) -> usize {
        ReplayMemory::capacity(self)
    }

    fn store(&mut self, transition: &Transition) -> Result<()> {
        self.push(transition.clone());
        Ok(())
    }
}
