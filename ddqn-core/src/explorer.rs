//! Epsilon-greedy exploration.
use anyhow::Result;
use ndarray::{Array1, ArrayView1};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Linear annealing of the exploration rate.
///
/// `epsilon` moves linearly from `eps_start` at step 0 to `eps_end` at `eps_step`
/// and stays at `eps_end` afterwards. The schedule is a pure function of the step
/// counter; it keeps no state.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct EpsilonSchedule {
    /// Exploration rate at step 0.
    pub eps_start: f64,

    /// Exploration rate from `eps_step` on.
    pub eps_end: f64,

    /// The number of steps over which the rate is annealed.
    pub eps_step: usize,
}

impl Default for EpsilonSchedule {
    fn default() -> Self {
        Self {
            eps_start: 1.0,
            eps_end: 0.1,
            eps_step: 100_000,
        }
    }
}

impl EpsilonSchedule {
    /// Sets the exploration rate at step 0.
    pub fn eps_start(mut self, v: f64) -> Self {
        self.eps_start = v;
        self
    }

    /// Sets the final exploration rate.
    pub fn eps_end(mut self, v: f64) -> Self {
        self.eps_end = v;
        self
    }

    /// Sets the number of annealing steps.
    pub fn eps_step(mut self, v: usize) -> Self {
        self.eps_step = v;
        self
    }

    /// Returns the exploration rate at `step`.
    ///
    /// A zero `eps_step` means no annealing, i.e., `eps_end` from the start.
    pub fn epsilon(&self, step: usize) -> f64 {
        if step >= self.eps_step {
            return self.eps_end;
        }
        let frac = step as f64 / self.eps_step as f64;
        self.eps_start + (self.eps_end - self.eps_start) * frac
    }
}

/// Returns the index of the largest value, the lowest index among ties.
///
/// NaN values are never selected unless every value is NaN, in which case 0 is returned.
pub fn argmax(values: ArrayView1<f32>) -> usize {
    let mut best = 0;
    let mut best_value = f32::NEG_INFINITY;
    for (i, &v) in values.iter().enumerate() {
        if v > best_value {
            best = i;
            best_value = v;
        }
    }
    best
}

/// Epsilon-greedy action selection.
#[derive(Debug, Default, Clone, Copy)]
pub struct EpsilonGreedy;

impl EpsilonGreedy {
    /// Chooses one of `n_actions` actions.
    ///
    /// Draws `u ~ U[0, 1)`. If `u < epsilon` the action is drawn uniformly from
    /// `0..n_actions`, otherwise the greedy action on the values returned by
    /// `q_values` is taken. `q_values` is evaluated only when exploiting.
    pub fn select<F>(
        n_actions: usize,
        epsilon: f64,
        rng: &mut impl Rng,
        q_values: F,
    ) -> Result<usize>
    where
        F: FnOnce() -> Result<Array1<f32>>,
    {
        let u = rng.gen::<f64>();
        if u < epsilon {
            Ok(rng.gen_range(0..n_actions))
        } else {
            Ok(argmax(q_values()?.view()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::{rngs::StdRng, SeedableRng};

    fn schedule() -> EpsilonSchedule {
        EpsilonSchedule::default()
            .eps_start(1.0)
            .eps_end(0.1)
            .eps_step(100)
    }

    #[test]
    fn test_linear_schedule() {
        let s = schedule();
        assert!((s.epsilon(0) - 1.0).abs() < 1e-9);
        assert!((s.epsilon(50) - 0.55).abs() < 1e-9);
        assert_eq!(s.epsilon(100), 0.1);
        assert_eq!(s.epsilon(500), 0.1);
    }

    #[test]
    fn test_schedule_monotone_and_pure() {
        let s = schedule();
        let mut prev = s.epsilon(0);
        for step in 1..300 {
            let eps = s.epsilon(step);
            assert!(eps <= prev);
            assert_eq!(eps, s.epsilon(step));
            prev = eps;
        }
    }

    #[test]
    fn test_zero_annealing_steps() {
        let s = schedule().eps_step(0);
        assert_eq!(s.epsilon(0), 0.1);
    }

    #[test]
    fn test_argmax_ties_lowest_index() {
        assert_eq!(argmax(array![0.5, 2.0, 2.0, 1.0].view()), 1);
        assert_eq!(argmax(array![3.0, 3.0].view()), 0);
        assert_eq!(argmax(array![-1.0, f32::NAN, -0.5].view()), 2);
    }

    #[test]
    fn test_select() -> Result<()> {
        let mut rng = StdRng::seed_from_u64(42);
        let q = || -> Result<Array1<f32>> { Ok(array![0.0, 1.0, 0.5]) };

        // Greedy when epsilon is zero
        for _ in 0..100 {
            assert_eq!(EpsilonGreedy::select(3, 0.0, &mut rng, q)?, 1);
        }

        // Every action appears when epsilon is one
        let mut counts = [0usize; 3];
        for _ in 0..300 {
            counts[EpsilonGreedy::select(3, 1.0, &mut rng, q)?] += 1;
        }
        assert!(counts.iter().all(|&c| c > 0));
        Ok(())
    }

    #[test]
    fn test_select_evaluates_values_only_when_exploiting() -> Result<()> {
        let mut rng = StdRng::seed_from_u64(7);
        let mut n_calls = 0;
        for _ in 0..50 {
            EpsilonGreedy::select(4, 1.0, &mut rng, || {
                n_calls += 1;
                Ok(array![0.0, 0.0, 0.0, 0.0])
            })?;
        }
        assert_eq!(n_calls, 0);

        let failing = || -> Result<Array1<f32>> { Err(anyhow::anyhow!("forward pass failed")) };
        assert!(EpsilonGreedy::select(4, 0.0, &mut rng, failing).is_err());
        Ok(())
    }
}
