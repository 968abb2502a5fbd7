use super::{recurrent_step, RnnAgentConfig};
use crate::model::RecurrentModel;
use anyhow::Result;
use candle_core::{DType, Device, Tensor};
use candle_nn::{gru, linear, GRUConfig, Linear, Module, VarBuilder, GRU};

/// Decentralized recurrent Q-network of a single agent.
///
/// `fc1 -> relu -> GRU cell -> fc2`, one Q-value per action.
pub struct RnnAgent {
    device: Device,
    hidden_dim: usize,
    n_actions: usize,
    fc1: Linear,
    rnn: GRU,
    fc2: Linear,
}

impl RnnAgent {
    /// Number of actions of the agent.
    pub fn n_actions(&self) -> usize {
        self.n_actions
    }
}

impl RecurrentModel for RnnAgent {
    type Config = RnnAgentConfig;

    fn build(vb: VarBuilder, config: Self::Config) -> Result<Self> {
        let device = vb.device().clone();
        let fc1 = linear(config.in_dim, config.hidden_dim, vb.pp("fc1"))?;
        let rnn = gru(
            config.hidden_dim,
            config.hidden_dim,
            GRUConfig::default(),
            vb.pp("rnn"),
        )?;
        let fc2 = linear(config.hidden_dim, config.n_actions, vb.pp("fc2"))?;

        Ok(Self {
            device,
            hidden_dim: config.hidden_dim,
            n_actions: config.n_actions,
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

    /// Returns Q-values of shape `(batch_size, n_actions)`.
    fn forward(&self, input: &Tensor, hidden: &Tensor) -> Result<(Tensor, Tensor)> {
        let h = recurrent_step(&self.fc1, &self.rnn, input, hidden)?;
        let q = self.fc2.forward(&h)?;
        Ok((q, h))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_nn::VarMap;

    #[test]
    fn test_forward_shapes() -> Result<()> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let agent = RnnAgent::build(vb, RnnAgentConfig::new(6, 4).hidden_dim(16))?;

        let h = agent.init_hidden(1)?;
        assert_eq!(h.dims(), &[1, 16]);
        assert_eq!(h.sum_all()?.to_scalar::<f32>()?, 0.0);

        let obs = Tensor::randn(0f32, 1.0, (6,), &Device::Cpu)?;
        let (q, h1) = agent.forward(&obs, &h)?;
        assert_eq!(q.dims(), &[1, 4]);
        assert_eq!(h1.dims(), &[1, 16]);

        // The hidden state carries information across steps.
        let (q2, _) = agent.forward(&obs, &h1)?;
        let diff = (q - q2)?.abs()?.sum_all()?.to_scalar::<f32>()?;
        assert!(diff > 0.0);
        Ok(())
    }
}
