use super::{QmixConfig, ValueNetworksConfig};
use crate::{
    agent::{CentralizedRnnAgent, RnnAgent},
    mixer::Mixer,
    model::RecurrentModel,
    opt::Optimizer,
    per::{PrioritizedEpisodeBuffer, ValueNetworks},
    util::{track, Reduction},
};
use anyhow::Result;
use candle_core::{DType, Device, Tensor};
use candle_nn::{VarBuilder, VarMap};
use log::info;
use qmix_core::{
    error::QmixError,
    record::{Record, RecordValue},
    AgentId,
};
use std::{collections::HashMap, convert::TryFrom, fs, path::Path};

enum Networks {
    Factorized {
        agent_nets: HashMap<AgentId, RnnAgent>,
        mixer: Mixer,
    },
    Centralized {
        agent_net: CentralizedRnnAgent,
    },
}

impl Networks {
    fn build(config: &ValueNetworksConfig, vb: VarBuilder) -> Result<Self> {
        match config {
            ValueNetworksConfig::Factorized { agents, mixer } => {
                let agent_nets = agents
                    .iter()
                    .map(|(a, c)| -> Result<(AgentId, RnnAgent)> {
                        let net = RnnAgent::build(vb.pp(format!("agent_{}", a)), c.clone())?;
                        Ok((a.clone(), net))
                    })
                    .collect::<Result<HashMap<_, _>>>()?;
                let mixer = mixer.build(vb.pp("mixer"))?;
                Ok(Self::Factorized { agent_nets, mixer })
            }
            ValueNetworksConfig::Centralized { agent } => {
                let agent_net = CentralizedRnnAgent::build(vb.pp("agent"), agent.clone())?;
                Ok(Self::Centralized { agent_net })
            }
        }
    }
}

fn value_networks<'a>(
    online: &'a Networks,
    target: &'a Networks,
    agents: &[AgentId],
) -> Result<ValueNetworks<'a>> {
    match (online, target) {
        (
            Networks::Factorized { agent_nets, mixer },
            Networks::Factorized {
                agent_nets: target_agent_nets,
                mixer: target_mixer,
            },
        ) => ValueNetworks::factorized(agents, mixer, target_mixer, agent_nets, target_agent_nets),
        (
            Networks::Centralized { agent_net },
            Networks::Centralized {
                agent_net: target_agent_net,
            },
        ) => ValueNetworks::centralized(agents, agent_net, target_agent_net),
        _ => Err(QmixError::ArchitectureMismatch(
            "online and target networks have different architectures".to_string(),
        )
        .into()),
    }
}

/// QMIX/VDN learner with online and target networks.
pub struct Qmix {
    networks: Networks,
    target_networks: Networks,
    varmap: VarMap,
    target_varmap: VarMap,
    opt: Optimizer,
    gamma: f64,
    target_update_interval: usize,
    use_isweight: bool,
    weighted: bool,
    reduction: Reduction,
    prioritize_all: bool,
    n_opts: usize,
}

impl Qmix {
    /// Constructs the learner.
    ///
    /// The target networks start as a copy of the online networks.
    pub fn build(config: QmixConfig) -> Result<Self> {
        let device = Device::try_from(config.device)?;

        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
        let networks = Networks::build(&config.networks, vb)?;

        let target_varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&target_varmap, DType::F32, &device);
        let target_networks = Networks::build(&config.networks, vb)?;
        track(&target_varmap, &varmap, 1.0)?;

        let opt = config.optimizer.build(varmap.all_vars())?;

        Ok(Self {
            networks,
            target_networks,
            varmap,
            target_varmap,
            opt,
            gamma: config.gamma,
            target_update_interval: config.target_update_interval.max(1),
            use_isweight: config.use_isweight,
            weighted: config.weighted,
            reduction: config.reduction,
            prioritize_all: config.prioritize_all,
            n_opts: 0,
        })
    }

    /// Number of optimization steps taken.
    pub fn n_opts(&self) -> usize {
        self.n_opts
    }

    /// Online and target networks checked against `agents`.
    pub fn value_networks(&self, agents: &[AgentId]) -> Result<ValueNetworks<'_>> {
        value_networks(&self.networks, &self.target_networks, agents)
    }

    /// Copies the online parameters into the target networks.
    pub fn sync_target(&self) -> Result<()> {
        track(&self.target_varmap, &self.varmap, 1.0)?;
        info!("Synchronized target networks at step {}", self.n_opts);
        Ok(())
    }

    /// Takes one optimization step on `n_episodes` episodes selected by priority.
    pub fn opt(
        &mut self,
        buffer: &mut PrioritizedEpisodeBuffer,
        n_episodes: usize,
    ) -> Result<Record> {
        let episode_ids = buffer.select_episodes(n_episodes)?;
        if episode_ids.is_empty() {
            return Err(QmixError::EmptyBuffer.into());
        }

        let loss = {
            let networks = value_networks(&self.networks, &self.target_networks, buffer.agents())?;
            let mut losses = Vec::with_capacity(episode_ids.len());
            for &episode_id in episode_ids.iter() {
                let loss = buffer.calculate_loss(
                    &networks,
                    episode_id,
                    self.gamma,
                    self.weighted,
                    self.reduction,
                )?;
                let loss = match self.use_isweight {
                    true => {
                        let (_, isweight) = buffer.sample_weights(episode_id)?;
                        (loss * isweight as f64)?
                    }
                    false => loss,
                };
                losses.push(loss);
            }
            Tensor::stack(&losses, 0)?.mean_all()?
        };

        self.opt.backward_step(&loss)?;
        self.n_opts += 1;
        if self.n_opts % self.target_update_interval == 0 {
            self.sync_target()?;
        }

        let networks = value_networks(&self.networks, &self.target_networks, buffer.agents())?;
        let mode = buffer.per_config().mode;
        let record = buffer.prioritize(&networks, self.gamma, mode, self.prioritize_all)?;

        Ok(record.merge(Record::from_slice(&[
            ("loss", RecordValue::Scalar(loss.to_scalar::<f32>()?)),
            ("n_opts", RecordValue::Scalar(self.n_opts as f32)),
            (
                "n_sampled_episodes",
                RecordValue::Scalar(episode_ids.len() as f32),
            ),
        ])))
    }

    /// Saves online and target parameters in `path`.
    pub fn save<T: AsRef<Path>>(&self, path: T) -> Result<()> {
        fs::create_dir_all(&path)?;
        self.varmap.save(path.as_ref().join("qmix.safetensors"))?;
        self.target_varmap
            .save(path.as_ref().join("qmix_tgt.safetensors"))?;
        info!("Save qmix to {:?}", path.as_ref());
        Ok(())
    }

    /// Loads online and target parameters from `path`.
    pub fn load<T: AsRef<Path>>(&mut self, path: T) -> Result<()> {
        self.varmap.load(path.as_ref().join("qmix.safetensors"))?;
        self.target_varmap
            .load(path.as_ref().join("qmix_tgt.safetensors"))?;
        info!("Load qmix from {:?}", path.as_ref());
        Ok(())
    }
}
