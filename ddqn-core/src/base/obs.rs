//! Observation.
use crate::error::DdqnError;
use anyhow::Result;
use ndarray::{Array3, Array4, ArrayView3, Axis};
use std::sync::Arc;

/// A batch of observations with shape `[batch, channels, height, width]`.
pub type ObsBatch = Array4<f32>;

/// An image observation with shape `[channels, height, width]`.
///
/// Stacked frames are expected to be folded into the channel axis by the
/// environment, so that a single observation is Markovian.
///
/// The frames are shared by reference counting: the `next_state` of a transition
/// and the `state` of the following one point to the same allocation, which halves
/// the memory used by the replay memory.
#[derive(Clone, Debug, PartialEq)]
pub struct Observation(Arc<Array3<f32>>);

impl Observation {
    /// Wraps an image array.
    pub fn new(frames: Array3<f32>) -> Self {
        Self(Arc::new(frames))
    }

    /// The all-zero observation of the given shape.
    ///
    /// Used as the `next_state` of transitions ending an episode.
    pub fn zeros(shape: (usize, usize, usize)) -> Self {
        Self::new(Array3::zeros(shape))
    }

    /// The all-zero observation with the same shape as `self`.
    pub fn zeros_like(&self) -> Self {
        Self::zeros(self.shape())
    }

    /// Returns `(channels, height, width)`.
    pub fn shape(&self) -> (usize, usize, usize) {
        self.0.dim()
    }

    /// A view of the underlying array.
    pub fn view(&self) -> ArrayView3<'_, f32> {
        self.0.view()
    }

    /// Returns `true` if every element is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&v| v == 0.0)
    }

    /// Returns `true` if both observations share the same allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Stacks observations into a batch along a new leading axis.
    ///
    /// Fails with [`DdqnError::BatchShape`] if there are no observations or if
    /// their shapes differ.
    pub fn stack<'a, I>(observations: I) -> Result<ObsBatch>
    where
        I: IntoIterator<Item = &'a Observation>,
    {
        let views = observations
            .into_iter()
            .map(|obs| obs.view())
            .collect::<Vec<_>>();

        let shape = match views.first() {
            Some(v) => v.dim(),
            None => return Err(DdqnError::BatchShape("no observations to stack".into()).into()),
        };
        if let Some(v) = views.iter().find(|v| v.dim() != shape) {
            return Err(DdqnError::BatchShape(format!(
                "observation shape {:?} differs from {:?}",
                v.dim(),
                shape
            ))
            .into());
        }

        ndarray::stack(Axis(0), &views).map_err(|e| DdqnError::BatchShape(e.to_string()).into())
    }
}

impl From<Array3<f32>> for Observation {
    fn from(frames: Array3<f32>) -> Self {
        Self::new(frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_sentinel() {
        let obs = Observation::new(Array3::from_elem((2, 3, 3), 0.5));
        let zero = obs.zeros_like();
        assert_eq!(zero.shape(), (2, 3, 3));
        assert!(zero.is_zero());
        assert!(!obs.is_zero());
    }

    #[test]
    fn test_clone_shares_frames() {
        let obs = Observation::zeros((1, 2, 2));
        let obs2 = obs.clone();
        assert!(obs.ptr_eq(&obs2));
        assert!(!obs.ptr_eq(&Observation::zeros((1, 2, 2))));
    }

    #[test]
    fn test_stack() -> Result<()> {
        let a = Observation::new(Array3::from_elem((1, 2, 2), 1.0));
        let b = Observation::new(Array3::from_elem((1, 2, 2), 2.0));
        let batch = Observation::stack([&a, &b])?;
        assert_eq!(batch.dim(), (2, 1, 2, 2));
        assert_eq!(batch[[1, 0, 1, 1]], 2.0);
        Ok(())
    }

    #[test]
    fn test_stack_mismatched_shapes() {
        let a = Observation::zeros((1, 2, 2));
        let b = Observation::zeros((1, 3, 2));
        let err = Observation::stack([&a, &b]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DdqnError>(),
            Some(DdqnError::BatchShape(_))
        ));
        assert!(Observation::stack(std::iter::empty()).is_err());
    }
}
