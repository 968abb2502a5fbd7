//! Configuration of [`PrioritizedEpisodeBuffer`](super::PrioritizedEpisodeBuffer).
use crate::Device;
use anyhow::Result;
use qmix_core::{episode_buffer::EpisodeBufferConfig, priority::PerConfig};
use serde::{Deserialize, Serialize};
use std::{
    default::Default,
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`PrioritizedEpisodeBuffer`](super::PrioritizedEpisodeBuffer).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct PrioritizedEpisodeBufferConfig {
    /// Configuration of the underlying episode buffer.
    pub buffer: EpisodeBufferConfig,

    /// Maximum number of stored transitions.
    pub capacity: usize,

    /// Prioritization parameters.
    pub per: PerConfig,

    /// Device on which transitions are stored.
    pub device: Device,

    /// Weight of samples with a non-negative td-error in the weighted loss.
    pub weighted_alpha: f32,
}

impl Default for PrioritizedEpisodeBufferConfig {
    fn default() -> Self {
        Self {
            buffer: EpisodeBufferConfig::default(),
            capacity: 50000,
            per: PerConfig::default(),
            device: Device::Cpu,
            weighted_alpha: 0.5,
        }
    }
}

impl PrioritizedEpisodeBufferConfig {
    /// Sets the configuration of the underlying episode buffer.
    pub fn buffer(mut self, buffer: EpisodeBufferConfig) -> Self {
        self.buffer = buffer;
        self
    }

    /// Sets the capacity in transitions.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets prioritization parameters.
    pub fn per(mut self, per: PerConfig) -> Self {
        self.per = per;
        self
    }

    /// Sets the device.
    pub fn device(mut self, device: Device) -> Self {
        self.device = device;
        self
    }

    /// Sets the weight of the weighted loss.
    pub fn weighted_alpha(mut self, weighted_alpha: f32) -> Self {
        self.weighted_alpha = weighted_alpha;
        self
    }

    /// Constructs [`PrioritizedEpisodeBufferConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`PrioritizedEpisodeBufferConfig`] as a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qmix_core::priority::PrioritizationMode;
    use tempdir::TempDir;

    #[test]
    fn test_serde_per_buffer_config() -> Result<()> {
        let config = PrioritizedEpisodeBufferConfig::default()
            .capacity(1000)
            .per(PerConfig::default().mode(PrioritizationMode::Proportional))
            .buffer(EpisodeBufferConfig::default().batch_size(8));
        let dir = TempDir::new("per_buffer_config")?;
        let path = dir.path().join("per_buffer_config.yaml");
        config.save(&path)?;
        assert_eq!(config, PrioritizedEpisodeBufferConfig::load(&path)?);
        Ok(())
    }
}
