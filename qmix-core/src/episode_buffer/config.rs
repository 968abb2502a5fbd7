//! Configuration of [`EpisodeReplayBuffer`](super::EpisodeReplayBuffer).
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    default::Default,
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`EpisodeReplayBuffer`](super::EpisodeReplayBuffer).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct EpisodeBufferConfig {
    /// Length of the contiguous window returned by
    /// [`sample`](super::EpisodeReplayBuffer::sample).
    pub batch_size: usize,

    /// Random seed used for sampling.
    pub seed: u64,
}

impl Default for EpisodeBufferConfig {
    fn default() -> Self {
        Self {
            batch_size: 32,
            seed: 42,
        }
    }
}

impl EpisodeBufferConfig {
    /// Sets the length of sampled windows.
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Sets the random seed for sampling.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Loads the configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves the configuration to a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
