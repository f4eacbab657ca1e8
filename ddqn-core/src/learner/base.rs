//! Double Q-learner.
use super::{smooth_l1_grad, smooth_l1_loss, DoubleQConfig};
use crate::{
    error::DdqnError, explorer::argmax, ObsBatch, Observation, Transition, ValueFunction,
};
use anyhow::{Context, Result};
use log::{debug, info, trace};
use ndarray::{Array1, Array2, Axis};
use std::{fs, path::Path};

const ONLINE_FILE: &str = "q_online";

/// A training batch after validation.
struct Batch {
    states: ObsBatch,
    actions: Vec<usize>,
    rewards: Array1<f32>,
    next_states: ObsBatch,
    is_terminal: Vec<bool>,
}

/// Owns the online and the target value functions and trains the online one with
/// double Q-learning.
///
/// The online network selects the greedy next action, the target network evaluates
/// it. The target network changes only in [`DoubleQLearner::sync_target`].
pub struct DoubleQLearner<V: ValueFunction> {
    gamma: f32,
    online: V,
    target: V,
    n_updates: usize,
}

impl<V: ValueFunction> DoubleQLearner<V> {
    /// Builds a learner and copies the parameters of `online` into `target`.
    pub fn build(config: DoubleQConfig, online: V, target: V) -> Result<Self> {
        if online.n_actions() != target.n_actions() {
            return Err(DdqnError::InvalidConfig(format!(
                "online network has {} actions, target network has {}",
                online.n_actions(),
                target.n_actions()
            ))
            .into());
        }

        let mut learner = Self {
            gamma: config.gamma,
            online,
            target,
            n_updates: 0,
        };
        learner.sync_target()?;
        Ok(learner)
    }

    /// The number of actions.
    pub fn n_actions(&self) -> usize {
        self.online.n_actions()
    }

    /// The number of gradient steps performed so far.
    pub fn n_updates(&self) -> usize {
        self.n_updates
    }

    /// The online network.
    pub fn online(&self) -> &V {
        &self.online
    }

    /// Action values of the online network for a single observation.
    pub fn predict(&self, obs: &Observation) -> Result<Array1<f32>> {
        Self::predict_one(&self.online, obs)
    }

    /// Action values of the target network for a single observation.
    pub fn target_predict(&self, obs: &Observation) -> Result<Array1<f32>> {
        Self::predict_one(&self.target, obs)
    }

    /// The action with the largest online value, the lowest index among ties.
    pub fn greedy_action(&self, obs: &Observation) -> Result<usize> {
        Ok(argmax(self.predict(obs)?.view()))
    }

    /// Regression targets `r + gamma * Q_target(s', argmax_a Q_online(s', a))`,
    /// with the bootstrap term set to zero for terminal transitions.
    pub fn compute_targets(&self, batch: &[&Transition]) -> Result<Array1<f32>> {
        let batch = self.prepare(batch)?;
        self.targets(&batch)
    }

    /// Performs one gradient step on the online network and returns the loss.
    ///
    /// The batch is validated before any parameter changes. On error both networks
    /// are left as they were.
    pub fn update(&mut self, batch: &[&Transition]) -> Result<f32> {
        let batch = self.prepare(batch)?;
        let targets = self.targets(&batch)?;

        let q = Self::checked_predict(&self.online, &batch.states)?;
        let pred = batch
            .actions
            .iter()
            .enumerate()
            .map(|(i, &a)| q[[i, a]])
            .collect::<Array1<f32>>();

        let loss = smooth_l1_loss(pred.view(), targets.view());
        let grad = smooth_l1_grad(pred.view(), targets.view());
        self.online
            .apply_gradient_step(&batch.states, &batch.actions, &grad)?;
        self.n_updates += 1;
        trace!("Update {}: loss = {}", self.n_updates, loss);

        Ok(loss)
    }

    /// Copies the online parameters into the target network.
    pub fn sync_target(&mut self) -> Result<()> {
        let snapshot = self.online.snapshot()?;
        self.target.restore(&snapshot)?;
        debug!("Synchronized target network after {} updates", self.n_updates);
        Ok(())
    }

    /// Saves the online network in `dir`.
    pub fn save_params<T: AsRef<Path>>(&self, dir: T) -> Result<()> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).with_context(|| format!("Failed to create {:?}", dir))?;
        self.online.save(&dir.join(ONLINE_FILE))?;
        info!("Saved parameters in {:?}", dir);
        Ok(())
    }

    /// Loads the online network from `dir` and synchronizes the target network.
    pub fn load_params<T: AsRef<Path>>(&mut self, dir: T) -> Result<()> {
        let dir = dir.as_ref();
        self.online.load(&dir.join(ONLINE_FILE))?;
        self.sync_target()?;
        info!("Loaded parameters from {:?}", dir);
        Ok(())
    }

    fn predict_one(vf: &V, obs: &Observation) -> Result<Array1<f32>> {
        let x = obs.view().insert_axis(Axis(0)).to_owned();
        let q = Self::check_output(vf, vf.predict(&x)?, 1)?;
        Ok(q.index_axis_move(Axis(0), 0))
    }

    fn checked_predict(vf: &V, obs: &ObsBatch) -> Result<Array2<f32>> {
        Self::check_output(vf, vf.predict(obs)?, obs.len_of(Axis(0)))
    }

    fn check_output(vf: &V, q: Array2<f32>, n: usize) -> Result<Array2<f32>> {
        if q.dim() != (n, vf.n_actions()) {
            return Err(DdqnError::BatchShape(format!(
                "value function returned shape {:?}, expected {:?}",
                q.dim(),
                (n, vf.n_actions())
            ))
            .into());
        }
        Ok(q)
    }

    fn prepare(&self, batch: &[&Transition]) -> Result<Batch> {
        if batch.is_empty() {
            return Err(DdqnError::BatchShape("empty batch".into()).into());
        }

        let n_actions = self.n_actions();
        if let Some(t) = batch.iter().find(|t| t.action >= n_actions) {
            return Err(DdqnError::BatchShape(format!(
                "action {} out of range for {} actions",
                t.action, n_actions
            ))
            .into());
        }

        let states = Observation::stack(batch.iter().map(|t| &t.state))?;
        let next_states = Observation::stack(batch.iter().map(|t| &t.next_state))?;
        if states.dim() != next_states.dim() {
            return Err(DdqnError::BatchShape(format!(
                "states {:?} and next states {:?} differ in shape",
                states.dim(),
                next_states.dim()
            ))
            .into());
        }

        Ok(Batch {
            states,
            actions: batch.iter().map(|t| t.action).collect(),
            rewards: batch.iter().map(|t| t.reward).collect(),
            next_states,
            is_terminal: batch.iter().map(|t| t.is_terminal).collect(),
        })
    }

    fn targets(&self, batch: &Batch) -> Result<Array1<f32>> {
        let q_online = Self::checked_predict(&self.online, &batch.next_states)?;
        let q_target = Self::checked_predict(&self.target, &batch.next_states)?;

        let targets = q_online
            .axis_iter(Axis(0))
            .zip(q_target.axis_iter(Axis(0)))
            .zip(batch.rewards.iter().zip(batch.is_terminal.iter()))
            .map(|((online, target), (&r, &is_terminal))| {
                let next_value = if is_terminal {
                    0.0
                } else {
                    target[argmax(online)]
                };
                r + self.gamma * next_value
            })
            .collect();

        Ok(targets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LinearQFunction;
    use ndarray::{array, Array3};
    use tempdir::TempDir;

    // Observations with two pixels. Q(s) = [2 * s0 + 5, 0.5 * s1 + 5], so the all-zero
    // observation evaluates to [5, 5] and [1, 1] evaluates to [7, 5.5].
    fn linear_q() -> Result<LinearQFunction> {
        LinearQFunction::from_params(array![[2.0, 0.0], [0.0, 0.5]], array![5.0, 5.0], 0.1)
    }

    fn learner() -> Result<DoubleQLearner<LinearQFunction>> {
        let online = linear_q()?;
        let target = LinearQFunction::new((1, 1, 2), 2, 0.1);
        DoubleQLearner::build(DoubleQConfig::default(), online, target)
    }

    fn obs(v0: f32, v1: f32) -> Observation {
        Observation::new(Array3::from_shape_vec((1, 1, 2), vec![v0, v1]).unwrap())
    }

    #[test]
    fn test_build_syncs_target() -> Result<()> {
        let learner = learner()?;
        let o = obs(1.0, 1.0);
        assert_eq!(learner.predict(&o)?, learner.target_predict(&o)?);
        assert_eq!(learner.predict(&o)?, array![7.0, 5.5]);
        Ok(())
    }

    #[test]
    fn test_batch_of_two_targets() -> Result<()> {
        let learner = learner()?;
        let s = obs(0.3, 0.3);

        // Q(next_state) = [2.0, 0.5]
        let q = LinearQFunction::from_params(array![[2.0, 0.0], [0.0, 0.5]], array![0.0, 0.0], 0.1)?;
        let learner_b = DoubleQLearner::build(DoubleQConfig::default(), q, linear_q()?)?;
        let next_state = obs(1.0, 1.0);
        assert_eq!(learner_b.predict(&next_state)?, array![2.0, 0.5]);

        let t_terminal = Transition::terminal(s.clone(), 0, 1.0);
        let t_running = Transition::new(s, 1, 0.0, next_state);
        let targets = learner_b.compute_targets(&[&t_terminal, &t_running])?;
        assert!((targets[0] - 1.0).abs() < 1e-6);
        assert!((targets[1] - 1.98).abs() < 1e-6);

        // Terminal rows ignore the bootstrap term even though Q(0) = [5, 5] here
        let targets = learner.compute_targets(&[&t_terminal])?;
        assert_eq!(targets, array![1.0]);
        Ok(())
    }

    #[test]
    fn test_online_selects_target_evaluates() -> Result<()> {
        let mut learner = learner()?;
        let next_state = obs(1.0, 1.0);

        // Lower Q_online(., 0) without syncing: 10 steps of -0.1 on w_0 and b_0
        let o = obs(1.0, 0.0);
        let t = Transition::terminal(o, 0, 0.0);
        for _ in 0..10 {
            learner.update(&[&t])?;
        }

        let q_online = learner.predict(&next_state)?;
        let q_target = learner.target_predict(&next_state)?;
        assert!((q_online[0] - 5.0).abs() < 1e-4);
        assert_eq!(q_target, array![7.0, 5.5]);
        assert_eq!(learner.greedy_action(&next_state)?, 1);
        assert_eq!(argmax(q_target.view()), 0);

        let t = Transition::new(obs(0.3, 0.3), 0, 1.0, next_state);
        let targets = learner.compute_targets(&[&t])?;
        let double_q = 1.0 + 0.99 * q_target[1];
        let single_q = 1.0 + 0.99 * q_target[0];
        assert!((targets[0] - double_q).abs() < 1e-5);
        assert!((targets[0] - single_q).abs() > 1.0);
        Ok(())
    }

    #[test]
    fn test_zero_next_state_not_terminal_without_flag() -> Result<()> {
        let learner = learner()?;
        let s = obs(0.3, 0.3);
        let t = Transition::new(s.clone(), 0, 1.0, s.zeros_like());
        let targets = learner.compute_targets(&[&t])?;
        assert!((targets[0] - (1.0 + 0.99 * 5.0)).abs() < 1e-5);
        Ok(())
    }

    #[test]
    fn test_target_lags_until_sync() -> Result<()> {
        let mut learner = learner()?;
        let o = obs(1.0, 1.0);
        let before = learner.target_predict(&o)?;

        let t = Transition::new(o.clone(), 0, 10.0, obs(0.0, 1.0));
        let loss = learner.update(&[&t])?;
        assert!(loss > 0.0);
        assert_eq!(learner.n_updates(), 1);
        assert_ne!(learner.predict(&o)?, before);
        assert_eq!(learner.target_predict(&o)?, before);

        learner.sync_target()?;
        assert_eq!(learner.target_predict(&o)?, learner.predict(&o)?);
        learner.sync_target()?;
        assert_eq!(learner.target_predict(&o)?, learner.predict(&o)?);
        Ok(())
    }

    #[test]
    fn test_update_moves_prediction_towards_target() -> Result<()> {
        let mut learner = learner()?;
        let o = obs(1.0, 0.0);
        let t = Transition::terminal(o.clone(), 0, 0.0);
        let q0 = learner.predict(&o)?[0];
        for _ in 0..10 {
            learner.update(&[&t])?;
        }
        let q1 = learner.predict(&o)?[0];
        assert!(q1.abs() < q0.abs());
        Ok(())
    }

    #[test]
    fn test_invalid_batches_leave_parameters() -> Result<()> {
        let mut learner = learner()?;
        let o = obs(1.0, 1.0);
        let before = learner.online().clone();

        let is_batch_shape = |e: anyhow::Error| {
            matches!(
                e.downcast_ref::<DdqnError>(),
                Some(DdqnError::BatchShape(_))
            )
        };

        assert!(is_batch_shape(learner.update(&[]).unwrap_err()));

        let bad_action = Transition::terminal(o.clone(), 2, 0.0);
        assert!(is_batch_shape(learner.update(&[&bad_action]).unwrap_err()));

        let small = Observation::zeros((1, 1, 1));
        let mismatched = Transition::new(o.clone(), 0, 0.0, small);
        assert!(is_batch_shape(learner.update(&[&mismatched]).unwrap_err()));

        let good = Transition::terminal(o, 0, 0.0);
        assert!(is_batch_shape(
            learner.update(&[&good, &bad_action]).unwrap_err()
        ));

        assert_eq!(learner.online(), &before);
        assert_eq!(learner.n_updates(), 0);
        Ok(())
    }

    #[test]
    fn test_save_load_params() -> Result<()> {
        let dir = TempDir::new("double_q")?;
        let mut learner = learner()?;
        let o = obs(1.0, 1.0);
        let t = Transition::terminal(o.clone(), 1, 3.0);
        learner.update(&[&t])?;
        learner.save_params(dir.path().join("1"))?;

        let mut learner2 = DoubleQLearner::build(
            DoubleQConfig::default(),
            LinearQFunction::new((1, 1, 2), 2, 0.1),
            LinearQFunction::new((1, 1, 2), 2, 0.1),
        )?;
        learner2.load_params(dir.path().join("1"))?;
        assert_eq!(learner2.predict(&o)?, learner.predict(&o)?);
        assert_eq!(learner2.target_predict(&o)?, learner.predict(&o)?);
        Ok(())
    }
}
