use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`RnnAgent`](super::RnnAgent).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct RnnAgentConfig {
    /// Dimension of the observation.
    pub in_dim: usize,

    /// Dimension of the hidden state.
    pub hidden_dim: usize,

    /// Number of actions of the agent.
    pub n_actions: usize,
}

impl RnnAgentConfig {
    /// Creates a configuration with a 64-dimensional hidden state.
    pub fn new(in_dim: usize, n_actions: usize) -> Self {
        Self {
            in_dim,
            hidden_dim: 64,
            n_actions,
        }
    }

    /// Sets the dimension of the hidden state.
    pub fn hidden_dim(mut self, v: usize) -> Self {
        self.hidden_dim = v;
        self
    }

    /// Constructs [`RnnAgentConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`RnnAgentConfig`] as a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

/// Configuration of [`CentralizedRnnAgent`](super::CentralizedRnnAgent).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct CentralizedRnnAgentConfig {
    /// Dimension of the global state.
    pub in_dim: usize,

    /// Dimension of the hidden state.
    pub hidden_dim: usize,

    /// Number of actions of each agent.
    pub n_actions_list: Vec<usize>,
}

impl CentralizedRnnAgentConfig {
    /// Creates a configuration with a 64-dimensional hidden state.
    pub fn new(in_dim: usize, n_actions_list: Vec<usize>) -> Self {
        Self {
            in_dim,
            hidden_dim: 64,
            n_actions_list,
        }
    }

    /// Sets the dimension of the hidden state.
    pub fn hidden_dim(mut self, v: usize) -> Self {
        self.hidden_dim = v;
        self
    }

    /// Constructs [`CentralizedRnnAgentConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`CentralizedRnnAgentConfig`] as a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
