//! Pull-based trajectory production.
use crate::{Env, Observation, Transition};
use anyhow::Result;

/// Summary of a finished episode.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeStats {
    /// Index of the episode, starting from 0.
    pub episode: usize,

    /// Sum of rewards.
    pub total_reward: f32,

    /// The number of steps.
    pub length: usize,
}

/// Steps an environment one transition at a time.
///
/// The environment is reset on the first call and right after every episode end,
/// so the caller never sees a reset.
pub struct Sampler<E: Env> {
    env: E,
    prev_obs: Option<Observation>,
    episode: usize,
    episode_reward: f32,
    episode_length: usize,
}

impl<E: Env> Sampler<E> {
    /// Wraps an environment.
    pub fn new(env: E) -> Self {
        Self {
            env,
            prev_obs: None,
            episode: 0,
            episode_reward: 0.0,
            episode_length: 0,
        }
    }

    /// The wrapped environment.
    pub fn env(&self) -> &E {
        &self.env
    }

    /// The number of finished episodes.
    pub fn n_episodes(&self) -> usize {
        self.episode
    }

    /// Takes an action chosen by `policy` and returns the resulting transition.
    ///
    /// When the episode ends with this step, the transition is terminal and the
    /// statistics of the episode are returned along with it.
    pub fn sample<F>(&mut self, mut policy: F) -> Result<(Transition, Option<EpisodeStats>)>
    where
        F: FnMut(&Observation) -> Result<usize>,
    {
        let state = match &self.prev_obs {
            Some(obs) => obs.clone(),
            None => {
                let obs = self.env.reset()?;
                self.prev_obs = Some(obs.clone());
                obs
            }
        };

        let action = policy(&state)?;
        let step = self.env.step(action)?;
        self.episode_reward += step.reward;
        self.episode_length += 1;

        if step.is_done {
            let next_obs = self.env.reset()?;
            let stats = EpisodeStats {
                episode: self.episode,
                total_reward: self.episode_reward,
                length: self.episode_length,
            };
            self.episode += 1;
            self.episode_reward = 0.0;
            self.episode_length = 0;
            self.prev_obs = Some(next_obs);

            Ok((Transition::terminal(state, action, step.reward), Some(stats)))
        } else {
            self.prev_obs = Some(step.obs.clone());
            Ok((Transition::new(state, action, step.reward, step.obs), None))
        }
    }
}
