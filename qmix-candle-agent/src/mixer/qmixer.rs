use anyhow::Result;
use candle_core::Tensor;
use candle_nn::{linear, Linear, Module, VarBuilder};
use serde::{Deserialize, Serialize};

/// Variant of the bias paths of [`QMixer`].
#[derive(Debug, Deserialize, Serialize, PartialEq, Eq, Clone, Copy)]
pub enum QMixerVariant {
    /// `b1 = relu(Linear(s))`, `b2 = Linear(relu(Linear(s)))`.
    QMix,

    /// `b1 = Linear(s)`, second-layer bias replaced by a value baseline
    /// `V(s) = Linear(relu(Linear(s)))`.
    QMixRevised,
}

/// Monotonic mixing network generated by hypernetworks.
///
/// See QMIX: Monotonic Value Function Factorisation for Deep Multi-Agent
/// Reinforcement Learning (<https://arxiv.org/abs/1803.11485>).
pub struct QMixer {
    variant: QMixerVariant,
    n_state_dim: usize,
    n_agents: usize,
    n_embedding_dim: usize,
    hyper_w1: Linear,
    hyper_w2: Linear,
    hyper_b1: Linear,
    // Hidden and output layers of `b2` or `V(s)`.
    hyper_b2: (Linear, Linear),
}

impl QMixer {
    /// Builds the mixer.
    pub fn build(
        vb: VarBuilder,
        variant: QMixerVariant,
        n_state_dim: usize,
        n_agents: usize,
        n_embedding_dim: usize,
    ) -> Result<Self> {
        let hyper_w1 = linear(n_state_dim, n_agents * n_embedding_dim, vb.pp("hyper_w1"))?;
        let hyper_w2 = linear(n_state_dim, n_embedding_dim, vb.pp("hyper_w2"))?;
        let hyper_b1 = linear(n_state_dim, n_embedding_dim, vb.pp("hyper_b1"))?;
        let vb_b2 = match variant {
            QMixerVariant::QMix => vb.pp("hyper_b2"),
            QMixerVariant::QMixRevised => vb.pp("v"),
        };
        let hyper_b2 = (
            linear(n_state_dim, n_embedding_dim, vb_b2.pp("ln0"))?,
            linear(n_embedding_dim, 1, vb_b2.pp("ln1"))?,
        );

        Ok(Self {
            variant,
            n_state_dim,
            n_agents,
            n_embedding_dim,
            hyper_w1,
            hyper_w2,
            hyper_b1,
            hyper_b2,
        })
    }

    /// Variant of the mixer.
    pub fn variant(&self) -> QMixerVariant {
        self.variant
    }

    /// Number of agents.
    pub fn n_agents(&self) -> usize {
        self.n_agents
    }

    /// Dimension of the global state.
    pub fn n_state_dim(&self) -> usize {
        self.n_state_dim
    }

    /// Returns joint Q-values of shape `(batch_size, 1)`.
    ///
    /// `agent_qs` is reshaped to `(batch_size, 1, n_agents)` and `state` to
    /// `(batch_size, n_state_dim)`, so trailing unit axes are accepted.
    pub fn forward(&self, agent_qs: &Tensor, state: &Tensor) -> Result<Tensor> {
        let (n_agents, n_emb) = (self.n_agents, self.n_embedding_dim);
        let bs = agent_qs.elem_count() / n_agents;
        let agent_qs = agent_qs.reshape((bs, 1, n_agents))?;
        let state = state.reshape((bs, self.n_state_dim))?;

        // First layer
        let w1 = self
            .hyper_w1
            .forward(&state)?
            .abs()?
            .reshape((bs, n_agents, n_emb))?;
        let b1 = self.hyper_b1.forward(&state)?;
        let b1 = match self.variant {
            QMixerVariant::QMix => b1.relu()?,
            QMixerVariant::QMixRevised => b1,
        }
        .reshape((bs, 1, n_emb))?;
        let hidden = (agent_qs.matmul(&w1)? + b1)?.elu(1.0)?;

        // Second layer
        let w2 = self
            .hyper_w2
            .forward(&state)?
            .abs()?
            .reshape((bs, n_emb, 1))?;
        let b2 = self
            .hyper_b2
            .1
            .forward(&self.hyper_b2.0.forward(&state)?.relu()?)?
            .reshape((bs, 1, 1))?;
        let y = (hidden.matmul(&w2)? + b2)?;

        Ok(y.reshape((bs, 1))?)
    }
}
