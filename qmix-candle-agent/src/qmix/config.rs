//! Configuration of [`Qmix`](super::Qmix).
use crate::{
    agent::{CentralizedRnnAgentConfig, RnnAgentConfig},
    mixer::MixerConfig,
    opt::OptimizerConfig,
    util::Reduction,
    Device,
};
use anyhow::Result;
use qmix_core::AgentId;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Architecture of the value networks.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub enum ValueNetworksConfig {
    /// One recurrent network per agent, combined by a mixer.
    Factorized {
        /// Network of each agent.
        agents: BTreeMap<AgentId, RnnAgentConfig>,
        /// Mixer.
        mixer: MixerConfig,
    },

    /// A single recurrent network over the joint action space.
    Centralized {
        /// The network.
        agent: CentralizedRnnAgentConfig,
    },
}

/// Configuration of [`Qmix`](super::Qmix).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct QmixConfig {
    /// Architecture of the value networks.
    pub networks: ValueNetworksConfig,

    /// Optimizer of the online networks.
    pub optimizer: OptimizerConfig,

    /// Discount factor.
    pub gamma: f64,

    /// Number of optimization steps between target synchronizations.
    pub target_update_interval: usize,

    /// If `true`, episode losses are scaled by importance-sampling weights.
    pub use_isweight: bool,

    /// If `true`, the weighted loss is used with [`MixerConfig::QMix`].
    pub weighted: bool,

    /// Reduction of per-step losses within an episode.
    pub reduction: Reduction,

    /// If `true`, td-errors of all stored episodes are recomputed before
    /// prioritization, otherwise only those of sampled episodes are fresh.
    pub prioritize_all: bool,

    /// Device of the networks.
    pub device: Device,
}

impl QmixConfig {
    /// Creates a configuration with default hyperparameters.
    pub fn new(networks: ValueNetworksConfig) -> Self {
        Self {
            networks,
            optimizer: OptimizerConfig::default(),
            gamma: 0.99,
            target_update_interval: 200,
            use_isweight: true,
            weighted: false,
            reduction: Reduction::Mean,
            prioritize_all: false,
            device: Device::Cpu,
        }
    }

    /// Sets the optimizer.
    pub fn optimizer(mut self, v: OptimizerConfig) -> Self {
        self.optimizer = v;
        self
    }

    /// Sets the discount factor.
    pub fn gamma(mut self, v: f64) -> Self {
        self.gamma = v;
        self
    }

    /// Sets the interval of target synchronization.
    pub fn target_update_interval(mut self, v: usize) -> Self {
        self.target_update_interval = v;
        self
    }

    /// Enables or disables importance-sampling weights.
    pub fn use_isweight(mut self, v: bool) -> Self {
        self.use_isweight = v;
        self
    }

    /// Enables or disables the weighted loss.
    pub fn weighted(mut self, v: bool) -> Self {
        self.weighted = v;
        self
    }

    /// Sets the reduction of per-step losses.
    pub fn reduction(mut self, v: Reduction) -> Self {
        self.reduction = v;
        self
    }

    /// Enables or disables recomputing all td-errors before prioritization.
    pub fn prioritize_all(mut self, v: bool) -> Self {
        self.prioritize_all = v;
        self
    }

    /// Sets the device.
    pub fn device(mut self, v: Device) -> Self {
        self.device = v;
        self
    }

    /// Constructs [`QmixConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`QmixConfig`] as a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_serde_qmix_config() -> Result<()> {
        let agents = ["a", "b"]
            .iter()
            .map(|a| (a.to_string(), RnnAgentConfig::new(4, 3)))
            .collect();
        let mixer = MixerConfig::QMixRevised {
            n_state_dim: 6,
            n_agents: 2,
            n_embedding_dim: 8,
        };
        let config = QmixConfig::new(ValueNetworksConfig::Factorized { agents, mixer })
            .gamma(0.9)
            .optimizer(OptimizerConfig::Adam { lr: 1e-3 })
            .reduction(Reduction::Sum);

        let dir = TempDir::new("qmix_config")?;
        let path = dir.path().join("qmix_config.yaml");
        config.save(&path)?;
        assert_eq!(config, QmixConfig::load(&path)?);
        Ok(())
    }
}
