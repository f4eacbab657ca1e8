//! Bounded replay memory with uniform sampling.
use super::ReplayMemoryConfig;
use crate::{error::DdqnError, Transition};
use anyhow::Result;
use log::trace;
use rand::{rngs::StdRng, seq::index, SeedableRng};
use std::collections::VecDeque;

/// A bounded store of [`Transition`]s.
///
/// Once `capacity` transitions are stored, every [`push`](ReplayMemory::push)
/// evicts the oldest one. Sampling is uniform over the current contents and does
/// not depend on insertion order.
pub struct ReplayMemory {
    capacity: usize,
    buffer: VecDeque<Transition>,
    rng: StdRng,
}

impl ReplayMemory {
    /// Builds an empty replay memory.
    ///
    /// Fails with [`DdqnError::InvalidConfig`] if `config.capacity` is zero.
    pub fn build(config: &ReplayMemoryConfig) -> Result<Self> {
        if config.capacity == 0 {
            return Err(DdqnError::InvalidConfig("replay memory capacity must be positive".into()).into());
        }

        Ok(Self {
            capacity: config.capacity,
            buffer: VecDeque::with_capacity(config.capacity),
            rng: StdRng::seed_from_u64(config.seed),
        })
    }

    /// Stores a transition, evicting the oldest one if the memory is full.
    pub fn push(&mut self, transition: Transition) {
        if self.buffer.len() == self.capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(transition);
    }

    /// Draws `batch_size` distinct transitions uniformly at random.
    ///
    /// Fails with [`DdqnError::InsufficientMemory`] if fewer than `batch_size`
    /// transitions are stored.
    pub fn sample(&mut self, batch_size: usize) -> Result<Vec<&Transition>> {
        let available = self.buffer.len();
        if batch_size > available {
            return Err(DdqnError::InsufficientMemory {
                requested: batch_size,
                available,
            }
            .into());
        }

        trace!("Sample {} of {} transitions", batch_size, available);
        let ixs = index::sample(&mut self.rng, available, batch_size);
        Ok(ixs.iter().map(|ix| &self.buffer[ix]).collect())
    }

    /// The number of stored transitions.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns `true` if no transition is stored.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// The maximum number of transitions.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterates over stored transitions from the oldest to the newest.
    pub fn iter(&self) -> impl Iterator<Item = &Transition> {
        self.buffer.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Observation;
    use ndarray::Array3;

    fn transition(i: usize) -> Transition {
        let state = Observation::new(Array3::from_elem((1, 2, 2), i as f32));
        let next_state = Observation::new(Array3::from_elem((1, 2, 2), i as f32 + 1.0));
        Transition::new(state, i % 4, i as f32, next_state)
    }

    fn memory(capacity: usize) -> ReplayMemory {
        ReplayMemory::build(&ReplayMemoryConfig::default().capacity(capacity)).unwrap()
    }

    #[test]
    fn test_fifo_eviction() {
        let mut memory = memory(3);
        let ts = (1..=4).map(transition).collect::<Vec<_>>();
        for t in ts.iter() {
            memory.push(t.clone());
        }

        assert_eq!(memory.len(), 3);
        let contents = memory.iter().cloned().collect::<Vec<_>>();
        assert_eq!(contents, ts[1..].to_vec());
    }

    #[test]
    fn test_size_never_exceeds_capacity() {
        let mut memory = memory(5);
        for i in 0..20 {
            memory.push(transition(i));
            assert!(memory.len() <= memory.capacity());
            assert_eq!(memory.len(), (i + 1).min(5));
        }

        // After capacity + k pushes the first k transitions are gone
        let rewards = memory.iter().map(|t| t.reward).collect::<Vec<_>>();
        assert_eq!(rewards, vec![15.0, 16.0, 17.0, 18.0, 19.0]);
    }

    #[test]
    fn test_sample_distinct_stored() -> Result<()> {
        let mut memory = memory(100);
        for i in 0..50 {
            memory.push(transition(i));
        }

        for n in [1, 10, 50] {
            let batch = memory.sample(n)?;
            assert_eq!(batch.len(), n);

            let mut rewards = batch.iter().map(|t| t.reward as usize).collect::<Vec<_>>();
            rewards.sort_unstable();
            rewards.dedup();
            assert_eq!(rewards.len(), n);
            assert!(rewards.iter().all(|&r| r < 50));
        }
        Ok(())
    }

    #[test]
    fn test_sample_insufficient() {
        let mut memory = memory(10);
        memory.push(transition(0));
        memory.push(transition(1));

        let err = memory.sample(3).unwrap_err();
        assert_eq!(
            err.downcast_ref::<DdqnError>(),
            Some(&DdqnError::InsufficientMemory {
                requested: 3,
                available: 2
            })
        );
        assert!(memory.sample(2).is_ok());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let config = ReplayMemoryConfig::default().capacity(0);
        assert!(ReplayMemory::build(&config).is_err());
    }
}
