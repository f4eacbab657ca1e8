use super::{Record, RecordValue};

/// Writes a record to an output destination with [`Recorder::write`].
pub trait Recorder {
    /// Writes a record.
    fn write(&mut self, record: Record);

    /// Reports the end of an episode.
    fn on_episode_end(&mut self, episode: usize, total_reward: f32, length: usize) {
        self.write(Record::from_slice(&[
            ("episode", RecordValue::Scalar(episode as f32)),
            ("episode_return", RecordValue::Scalar(total_reward)),
            ("episode_length", RecordValue::Scalar(length as f32)),
        ]));
    }

    /// Reports the loss of a learning step.
    fn on_learn_step(&mut self, opt_steps: usize, loss: f32) {
        self.write(Record::from_slice(&[
            ("opt_steps", RecordValue::Scalar(opt_steps as f32)),
            ("loss", RecordValue::Scalar(loss)),
        ]));
    }
}
