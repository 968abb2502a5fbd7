//! Configuration of prioritized episode replay.
use super::PrioritizationMode;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    default::Default,
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of prioritized episode replay.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct PerConfig {
    /// Policy computing priorities from td-errors.
    pub mode: PrioritizationMode,

    /// Exponent of rank-based priorities.
    pub alpha: f32,

    /// Exponent of importance-sampling weights.
    pub beta: f32,

    /// Offset added to absolute td-errors in proportional mode.
    pub eps: f32,
}

impl Default for PerConfig {
    fn default() -> Self {
        Self {
            mode: PrioritizationMode::RankBased,
            alpha: 0.7,
            beta: 0.5,
            eps: 1e-5,
        }
    }
}

impl PerConfig {
    /// Sets the prioritization mode.
    pub fn mode(mut self, mode: PrioritizationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the exponent of rank-based priorities.
    pub fn alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }

    /// Sets the exponent of importance-sampling weights.
    pub fn beta(mut self, beta: f32) -> Self {
        self.beta = beta;
        self
    }

    /// Sets the offset of proportional priorities.
    pub fn eps(mut self, eps: f32) -> Self {
        self.eps = eps;
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
