use super::{recurrent_step, CentralizedRnnAgentConfig};
use crate::model::RecurrentModel;
use anyhow::Result;
use candle_core::{DType, Device, Tensor};
use candle_nn::{gru, linear, GRUConfig, Linear, Module, VarBuilder, GRU};
use qmix_core::joint_action::n_joint_actions;

/// Centralized recurrent Q-network over the joint action space.
///
/// Takes the global state and returns Q-values of shape
/// `(batch_size, n_1, ..., n_k)`, one axis per agent.
pub struct CentralizedRnnAgent {
    device: Device,
    hidden_dim: usize,
    n_actions_list: Vec<usize>,
    fc1: Linear,
    rnn: GRU,
    fc2: Linear,
}

impl CentralizedRnnAgent {
    /// Number of actions of each agent.
    pub fn n_actions_list(&self) -> &[usize] {
        &self.n_actions_list
    }
}

impl RecurrentModel for CentralizedRnnAgent {
    type Config = CentralizedRnnAgentConfig;

    fn build(vb: VarBuilder, config: Self::Config) -> Result<Self> {
        let device = vb.device().clone();
        let total_joint_actions = n_joint_actions(&config.n_actions_list);
        let fc1 = linear(config.in_dim, config.hidden_dim, vb.pp("fc1"))?;
        let rnn = gru(
            config.hidden_dim,
            config.hidden_dim,
            GRUConfig::default(),
            vb.pp("rnn"),
        )?;
        let fc2 = linear(config.hidden_dim, total_joint_actions, vb.pp("fc2"))?;

        Ok(Self {
            device,
            hidden_dim: config.hidden_dim,
            n_actions_list: config.n_actions_list,
            fc1,
            rnn,
            fc2,
        })
    }

    fn init_hidden(&self, batch_size: usize) -> Result<Tensor> {
        Ok(Tensor::zeros(
            (batch_size, self.hidden_dim),
            DType::F32,
            &self.device,
        )?)
    }

    fn forward(&self, input: &Tensor, hidden: &Tensor) -> Result<(Tensor, Tensor)> {
        let h = recurrent_step(&self.fc1, &self.rnn, input, hidden)?;
        let mut shape = vec![h.dim(0)?];
        shape.extend_from_slice(&self.n_actions_list);
        let q = self.fc2.forward(&h)?.reshape(shape)?;
        Ok((q, h))
    }
}
