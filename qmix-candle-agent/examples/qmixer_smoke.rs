//! Builds a hypernetwork mixer for 5 agents and prints one forward pass.
use anyhow::Result;
use candle_core::{DType, Device, Tensor};
use candle_nn::{VarBuilder, VarMap};
use log::info;
use qmix_candle_agent::mixer::MixerConfig;

const BATCH_SIZE: usize = 8;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let device = Device::Cpu;
    let varmap = VarMap::new();
    let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
    let config = MixerConfig::QMix {
        n_state_dim: 8,
        n_agents: 5,
        n_embedding_dim: 5,
    };
    let mixer = config.build(vb)?;
    info!("Built {:?} mixer", mixer.kind());

    let agent_qs = Tensor::rand(0f32, 1.0, (BATCH_SIZE, 1, 5), &device)?;
    let state = Tensor::rand(0f32, 1.0, (BATCH_SIZE, 8), &device)?;
    let total_q = mixer.forward(&agent_qs, &state)?;
    println!("Total Q : {}", total_q);

    Ok(())
}
