use anyhow::Result;
use candle_core::Tensor;

/// Additive mixer, `Q_tot = sum_i Q_i`.
#[derive(Debug, Default, Clone)]
pub struct Vdn;

impl Vdn {
    /// Sums `agent_qs` of shape `(batch_size, 1, n_agents)` over the agent axis.
    pub fn forward(&self, agent_qs: &Tensor) -> Result<Tensor> {
        Ok(agent_qs.sum(2)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Device;

    #[test]
    fn test_vdn_sums_agent_axis() -> Result<()> {
        let agent_qs = Tensor::new(
            &[[[1f32, 2.0, 3.0]], [[-1.0, 0.5, 0.5]]],
            &Device::Cpu,
        )?;
        let q = Vdn.forward(&agent_qs)?;
        assert_eq!(q.dims(), &[2, 1]);
        assert_eq!(q.to_vec2::<f32>()?, vec![vec![6.0], vec![0.0]]);
        Ok(())
    }
}
