use super::{Mixer, MixerKind, QMixer, QMixerVariant, Vdn};
use anyhow::Result;
use candle_nn::VarBuilder;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`Mixer`].
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub enum MixerConfig {
    /// [`QMixer`] of variant [`QMixerVariant::QMix`].
    QMix {
        /// Dimension of the global state.
        n_state_dim: usize,
        /// Number of agents.
        n_agents: usize,
        /// Number of hidden units of the mixing network.
        n_embedding_dim: usize,
    },

    /// [`QMixer`] of variant [`QMixerVariant::QMixRevised`].
    QMixRevised {
        /// Dimension of the global state.
        n_state_dim: usize,
        /// Number of agents.
        n_agents: usize,
        /// Number of hidden units of the mixing network.
        n_embedding_dim: usize,
    },

    /// [`Vdn`].
    Vdn,
}

impl MixerConfig {
    /// Kind of the mixer built from this configuration.
    pub fn kind(&self) -> MixerKind {
        match self {
            Self::QMix { .. } => MixerKind::QMix,
            Self::QMixRevised { .. } => MixerKind::QMixRevised,
            Self::Vdn => MixerKind::Vdn,
        }
    }

    /// Builds the mixer with its variables registered in `vb`.
    pub fn build(&self, vb: VarBuilder) -> Result<Mixer> {
        match *self {
            Self::QMix {
                n_state_dim,
                n_agents,
                n_embedding_dim,
            } => Ok(Mixer::QMixer(QMixer::build(
                vb,
                QMixerVariant::QMix,
                n_state_dim,
                n_agents,
                n_embedding_dim,
            )?)),
            Self::QMixRevised {
                n_state_dim,
                n_agents,
                n_embedding_dim,
            } => Ok(Mixer::QMixer(QMixer::build(
                vb,
                QMixerVariant::QMixRevised,
                n_state_dim,
                n_agents,
                n_embedding_dim,
            )?)),
            Self::Vdn => Ok(Mixer::Vdn(Vdn)),
        }
    }

    /// Constructs [`MixerConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`MixerConfig`] as a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
