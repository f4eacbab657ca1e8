use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Width presets of [`Cnn`](super::Cnn).
///
/// `Normal` is the network of the DQN Nature paper. The other presets scale the
/// number of channels and hidden units by 1/2, 2 and 4.
#[derive(Debug, Deserialize, Serialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
pub enum NetSize {
    /// Half width.
    Small,

    /// 32, 64 and 64 channels and 512 hidden units.
    #[default]
    Normal,

    /// Double width.
    Big,

    /// Quadruple width.
    Super,
}

impl NetSize {
    /// Output channels of the three convolution layers.
    pub fn channels(&self) -> [usize; 3] {
        let [c1, c2, c3] = [32, 64, 64];
        let (num, den) = self.scale();
        [c1 * num / den, c2 * num / den, c3 * num / den]
    }

    /// Units of the hidden linear layer.
    pub fn hidden(&self) -> usize {
        let (num, den) = self.scale();
        512 * num / den
    }

    fn scale(&self) -> (usize, usize) {
        match self {
            Self::Small => (1, 2),
            Self::Normal => (1, 1),
            Self::Big => (2, 1),
            Self::Super => (4, 1),
        }
    }
}

/// Configuration of [`Cnn`](super::Cnn).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct CnnConfig {
    /// Input channels, i.e., the number of stacked frames.
    pub n_stack: usize,

    /// Height of input images.
    pub height: usize,

    /// Width of input images.
    pub width: usize,

    /// Output dimension, i.e., the number of actions.
    pub n_actions: usize,

    /// Width preset.
    pub size: NetSize,

    /// Inputs are multiplied by this value before the first layer.
    pub input_scale: f32,
}

impl Default for CnnConfig {
    fn default() -> Self {
        Self {
            n_stack: 4,
            height: 84,
            width: 84,
            n_actions: 0,
            size: NetSize::Normal,
            input_scale: 1.0,
        }
    }
}

impl CnnConfig {
    /// Configuration for 84x84 inputs.
    pub fn new(n_stack: usize, n_actions: usize) -> Self {
        Self {
            n_stack,
            n_actions,
            ..Self::default()
        }
    }

    /// Sets the image size.
    pub fn image_size(mut self, height: usize, width: usize) -> Self {
        self.height = height;
        self.width = width;
        self
    }

    /// Sets the width preset.
    pub fn size(mut self, v: NetSize) -> Self {
        self.size = v;
        self
    }

    /// Sets the input scale, e.g., `1.0 / 255.0` for raw pixel intensities.
    pub fn input_scale(mut self, v: f32) -> Self {
        self.input_scale = v;
        self
    }

    /// Height and width of the output of the last convolution layer.
    ///
    /// Returns `None` if the image is too small for the kernels.
    pub fn conv_out_size(&self) -> Option<(usize, usize)> {
        let conv = |x: usize, k: usize, s: usize| x.checked_sub(k).map(|x| x / s + 1);
        let h = conv(conv(conv(self.height, 8, 4)?, 4, 2)?, 3, 1)?;
        let w = conv(conv(conv(self.width, 8, 4)?, 4, 2)?, 3, 1)?;
        Some((h, w))
    }

    /// Constructs [`CnnConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`CnnConfig`] as a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
