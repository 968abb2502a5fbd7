//! Mixing networks combining per-agent Q-values into a joint Q-value.
//!
//! Two families are provided:
//!
//! * [`QMixer`], a monotonic mixer whose weights are produced by
//!   hypernetworks conditioned on the global state. Mixing weights pass
//!   through `abs`, so the joint value is non-decreasing in every per-agent
//!   value. Two variants differ in the bias paths, see [`QMixerVariant`].
//! * [`Vdn`], the additive mixer without parameters.
//!
//! The mixer kind is fixed when a [`Mixer`] is built from a [`MixerConfig`],
//! and the loss computation dispatches on [`Mixer::kind`] once.
mod config;
mod qmixer;
mod vdn;
pub use config::MixerConfig;
pub use qmixer::{QMixer, QMixerVariant};
pub use vdn::Vdn;

use anyhow::Result;
use candle_core::Tensor;
use serde::{Deserialize, Serialize};

/// Identifies the kind of a [`Mixer`].
#[derive(Debug, Deserialize, Serialize, PartialEq, Eq, Clone, Copy)]
pub enum MixerKind {
    /// Hypernetwork mixer with a state-conditioned second-layer bias.
    QMix,

    /// Hypernetwork mixer with a state value baseline `V(s)`.
    QMixRevised,

    /// Additive mixer.
    Vdn,
}

impl MixerKind {
    /// Returns `true` if the mixer is conditioned on the global state.
    pub fn uses_state(&self) -> bool {
        !matches!(self, Self::Vdn)
    }
}

/// A mixing network.
pub enum Mixer {
    /// Monotonic hypernetwork mixer.
    QMixer(QMixer),

    /// Additive mixer.
    Vdn(Vdn),
}

impl Mixer {
    /// Returns the kind of the mixer.
    pub fn kind(&self) -> MixerKind {
        match self {
            Self::QMixer(m) => match m.variant() {
                QMixerVariant::QMix => MixerKind::QMix,
                QMixerVariant::QMixRevised => MixerKind::QMixRevised,
            },
            Self::Vdn(_) => MixerKind::Vdn,
        }
    }

    /// Number of agents the mixer was built for, `None` for [`Vdn`].
    pub fn n_agents(&self) -> Option<usize> {
        match self {
            Self::QMixer(m) => Some(m.n_agents()),
            Self::Vdn(_) => None,
        }
    }

    /// Returns joint Q-values.
    ///
    /// `agent_qs` has shape `(batch_size, 1, n_agents)`. `state` is ignored by
    /// [`Vdn`]. The output has shape `(batch_size, 1)`.
    pub fn forward(&self, agent_qs: &Tensor, state: &Tensor) -> Result<Tensor> {
        match self {
            Self::QMixer(m) => m.forward(agent_qs, state),
            Self::Vdn(m) => m.forward(agent_qs),
        }
    }
}
