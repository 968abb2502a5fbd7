#![allow(dead_code)]
use anyhow::Result;
use candle_core::{DType, Device};
use candle_nn::{VarBuilder, VarMap};
use qmix_candle_agent::{
    agent::{CentralizedRnnAgent, CentralizedRnnAgentConfig, RnnAgent, RnnAgentConfig},
    mixer::{Mixer, MixerConfig},
    model::RecurrentModel,
    per::{PrioritizedEpisodeBuffer, PrioritizedEpisodeBufferConfig},
};
use qmix_core::{
    episode_buffer::EpisodeBufferConfig, AgentId, AgentObs, Env, ObservationMap, RawAgentObs,
    RawTransition, Transition,
};
use std::collections::HashMap;

pub const AGENTS: [&str; 3] = ["agent_0", "agent_1", "agent_2"];
pub const OBS_DIM: usize = 4;
pub const STATE_DIM: usize = 6;
pub const N_ACTIONS: usize = 5;

pub struct TestEnv;

impl Env for TestEnv {
    fn state(&self) -> Vec<f32> {
        vec![0.0; STATE_DIM]
    }

    fn scale_observation(
        &self,
        observations: &ObservationMap<RawAgentObs>,
    ) -> ObservationMap<RawAgentObs> {
        observations.clone()
    }
}

pub fn agents() -> Vec<AgentId> {
    AGENTS.iter().map(|a| a.to_string()).collect()
}

fn observations(t: usize) -> ObservationMap<RawAgentObs> {
    AGENTS
        .iter()
        .enumerate()
        .map(|(i, &a)| {
            let obs = AgentObs {
                observation: (0..OBS_DIM).map(|j| ((t + i + j) % 7) as f32 / 7.0).collect(),
                // The last action is never valid.
                action_mask: vec![1, 1, 1, 1, 0],
            };
            (a.to_string(), obs)
        })
        .collect()
}

pub fn transition(episode_id: usize, t: usize) -> RawTransition {
    Transition {
        episode_id,
        previous_observations: observations(t),
        observations: observations(t + 1),
        previous_state: (0..STATE_DIM).map(|j| ((t + j) % 5) as f32 / 5.0).collect(),
        state: (0..STATE_DIM)
            .map(|j| ((t + 1 + j) % 5) as f32 / 5.0)
            .collect(),
        actions: AGENTS
            .iter()
            .enumerate()
            .map(|(i, &a)| (a.to_string(), (t + i) % 4))
            .collect(),
        rewards: if t % 3 == 0 { 1.0 } else { 0.0 },
    }
}

/// Buffer holding episodes `1..=n_episodes` of `len` transitions each.
pub fn buffer(n_episodes: usize, len: usize) -> Result<PrioritizedEpisodeBuffer> {
    let config = PrioritizedEpisodeBufferConfig::default()
        .buffer(EpisodeBufferConfig::default().batch_size(4));
    let mut buffer = PrioritizedEpisodeBuffer::build(agents(), &config)?;
    for episode_id in 1..=n_episodes {
        for t in 0..len {
            buffer.push(transition(episode_id, t), &TestEnv)?;
        }
    }
    Ok(buffer)
}

pub fn agent_nets(varmap: &VarMap) -> Result<HashMap<AgentId, RnnAgent>> {
    let vb = VarBuilder::from_varmap(varmap, DType::F32, &Device::Cpu);
    agents()
        .into_iter()
        .map(|a| -> Result<(AgentId, RnnAgent)> {
            let config = RnnAgentConfig::new(OBS_DIM, N_ACTIONS).hidden_dim(8);
            let net = RnnAgent::build(vb.pp(&a), config)?;
            Ok((a, net))
        })
        .collect()
}

pub fn mixer(varmap: &VarMap, config: &MixerConfig) -> Result<Mixer> {
    let vb = VarBuilder::from_varmap(varmap, DType::F32, &Device::Cpu);
    config.build(vb.pp("mixer"))
}

pub fn centralized_net(varmap: &VarMap, n_agents: usize) -> Result<CentralizedRnnAgent> {
    let vb = VarBuilder::from_varmap(varmap, DType::F32, &Device::Cpu);
    let config = CentralizedRnnAgentConfig::new(STATE_DIM, vec![N_ACTIONS; n_agents]).hidden_dim(8);
    CentralizedRnnAgent::build(vb, config)
}

pub fn qmix_config() -> MixerConfig {
    MixerConfig::QMix {
        n_state_dim: STATE_DIM,
        n_agents: AGENTS.len(),
        n_embedding_dim: 4,
    }
}
