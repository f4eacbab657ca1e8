//! Training loop.
mod config;
mod sampler;
mod store;
use crate::{
    error::DdqnError, record::Recorder, DoubleQLearner, Env, EpsilonGreedy, EpsilonSchedule,
    ReplayMemory, Transition, ValueFunction,
};
use anyhow::Result;
pub use config::TrainerConfig;
use log::{info, warn};
use rand::{rngs::StdRng, SeedableRng};
pub use sampler::{EpisodeStats, Sampler};
pub use store::TransitionStore;
use std::{path::Path, time::SystemTime};

/// Counters at the end of [`Trainer::train`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TrainStats {
    /// The number of environment steps.
    pub iterations: usize,

    /// The number of finished episodes.
    pub episodes: usize,

    /// The number of learning steps.
    pub n_updates: usize,

    /// The number of target network synchronizations.
    pub n_syncs: usize,
}

/// Interleaves environment steps, replay memory insertion, learning and target
/// network synchronization.
///
/// At every step `i`:
///
/// 1. An action is chosen epsilon-greedily with `epsilon(i)`. The online network
///    is evaluated only when exploiting.
/// 2. The environment is stepped and the transition pushed into the replay memory.
/// 3. If `i > warmup_steps` and `i % learn_every == 0`, a batch is sampled and the
///    learner performs one update. If also `i % target_sync_every == 0`, the target
///    network is synchronized.
/// 4. If the episode ended, its statistics go to the [`Recorder`] and a checkpoint
///    is saved every `save_interval` episodes.
pub struct Trainer<E: Env, V: ValueFunction> {
    config: TrainerConfig,
    sampler: Sampler<E>,
    learner: DoubleQLearner<V>,
    memory: ReplayMemory,
    explorer: EpsilonSchedule,
    rng: StdRng,
    n_syncs: usize,
    timer: SystemTime,
}

impl<E: Env, V: ValueFunction> Trainer<E, V> {
    /// Constructs a trainer.
    ///
    /// Fails with [`DdqnError::InvalidConfig`] if the configuration is invalid or the
    /// action spaces of the environment and the learner differ.
    pub fn build(config: TrainerConfig, env: E, learner: DoubleQLearner<V>) -> Result<Self> {
        config.validate()?;
        if env.n_actions() != learner.n_actions() {
            return Err(DdqnError::InvalidConfig(format!(
                "environment has {} actions, value function has {}",
                env.n_actions(),
                learner.n_actions()
            ))
            .into());
        }

        Ok(Self {
            memory: ReplayMemory::build(&config.memory)?,
            explorer: config.explorer.clone(),
            rng: StdRng::seed_from_u64(config.seed),
            sampler: Sampler::new(env),
            learner,
            n_syncs: 0,
            timer: SystemTime::now(),
            config,
        })
    }

    /// The learner.
    pub fn learner(&self) -> &DoubleQLearner<V> {
        &self.learner
    }

    /// The replay memory.
    pub fn memory(&self) -> &ReplayMemory {
        &self.memory
    }

    /// The environment.
    pub fn env(&self) -> &E {
        self.sampler.env()
    }

    /// The number of target network synchronizations performed so far.
    pub fn n_syncs(&self) -> usize {
        self.n_syncs
    }

    /// Performs iteration `i` of the training loop.
    ///
    /// Returns the statistics of the episode if it ended with this step.
    pub fn train_step(
        &mut self,
        i: usize,
        recorder: &mut dyn Recorder,
    ) -> Result<Option<EpisodeStats>> {
        let (transition, stats) = self.sample(i)?;
        self.memory.push(transition);
        self.after_push(i, stats, recorder)
    }

    /// Runs `max_iterations` steps of the training loop and saves the final model.
    pub fn train(&mut self, recorder: &mut dyn Recorder) -> Result<TrainStats> {
        self.run(recorder, None)
    }

    /// Same as [`Trainer::train`], also handing the transitions of the last
    /// `store.capacity()` iterations to `store`.
    pub fn train_with_store(
        &mut self,
        recorder: &mut dyn Recorder,
        store: &mut dyn TransitionStore,
    ) -> Result<TrainStats> {
        self.run(recorder, Some(store))
    }

    fn run(
        &mut self,
        recorder: &mut dyn Recorder,
        mut store: Option<&mut dyn TransitionStore>,
    ) -> Result<TrainStats> {
        let max_iterations = self.config.max_iterations;
        let store_from = store
            .as_ref()
            .map_or(max_iterations, |s| max_iterations.saturating_sub(s.capacity()));
        info!("Start training for {} iterations", max_iterations);
        if store.is_some() {
            info!("Store transitions from iteration {}", store_from);
        }
        self.timer = SystemTime::now();

        for i in 0..max_iterations {
            let (transition, stats) = self.sample(i)?;
            if i >= store_from {
                if let Some(store) = store.as_mut() {
                    store.store(&transition)?;
                }
            }
            self.memory.push(transition);
            self.after_push(i, stats, recorder)?;
        }
        self.save_checkpoint("final");

        Ok(TrainStats {
            iterations: max_iterations,
            episodes: self.sampler.n_episodes(),
            n_updates: self.learner.n_updates(),
            n_syncs: self.n_syncs,
        })
    }

    /// Takes one epsilon-greedy step in the environment.
    fn sample(&mut self, i: usize) -> Result<(Transition, Option<EpisodeStats>)> {
        let epsilon = self.explorer.epsilon(i);
        let learner = &self.learner;
        let rng = &mut self.rng;
        self.sampler.sample(|obs| {
            EpsilonGreedy::select(learner.n_actions(), epsilon, rng, || learner.predict(obs))
        })
    }

    /// Learning, target synchronization, reporting and logging of iteration `i`.
    fn after_push(
        &mut self,
        i: usize,
        stats: Option<EpisodeStats>,
        recorder: &mut dyn Recorder,
    ) -> Result<Option<EpisodeStats>> {
        if i > self.config.warmup_steps && i % self.config.learn_every == 0 {
            let batch = self.memory.sample(self.config.batch_size)?;
            let loss = self.learner.update(&batch)?;
            recorder.on_learn_step(self.learner.n_updates(), loss);

            if i % self.config.target_sync_every == 0 {
                self.learner.sync_target()?;
                self.n_syncs += 1;
            }
        }

        if let Some(stats) = &stats {
            info!(
                "Episode {}: return = {}, steps = {}, epsilon = {:.4}",
                stats.episode,
                stats.total_reward,
                stats.length,
                self.explorer.epsilon(i)
            );
            recorder.on_episode_end(stats.episode, stats.total_reward, stats.length);

            if stats.episode % self.config.save_interval == 0 {
                self.save_checkpoint(&stats.episode.to_string());
            }
        }

        if i != 0 && i % self.config.log_interval == 0 {
            let elapsed = self.timer.elapsed()?.as_secs_f32();
            self.timer = SystemTime::now();
            info!(
                "{} iterations cost {:.5}s, memory size: {}, progress: {:.2}%",
                self.config.log_interval,
                elapsed,
                self.memory.len(),
                i as f32 * 100.0 / self.config.max_iterations as f32
            );
        }

        Ok(stats)
    }

    fn save_checkpoint(&self, name: &str) {
        if let Some(model_dir) = &self.config.model_dir {
            let path = Path::new(model_dir).join(name);
            if let Err(e) = self.learner.save_params(&path) {
                warn!("Failed to save the model in {:?}: {}", path, e);
            }
        }
    }
}
