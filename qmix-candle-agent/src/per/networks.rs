use crate::{
    agent::{CentralizedRnnAgent, RnnAgent},
    mixer::{Mixer, MixerKind},
    model::RecurrentModel,
};
use anyhow::Result;
use qmix_core::{error::QmixError, AgentId};
use std::collections::HashMap;

pub(super) enum Networks<'a, Q> {
    Factorized {
        mixer: &'a Mixer,
        target_mixer: &'a Mixer,
        agent_nets: &'a HashMap<AgentId, Q>,
        target_agent_nets: &'a HashMap<AgentId, Q>,
    },
    Centralized {
        agent_net: &'a CentralizedRnnAgent,
        target_agent_net: &'a CentralizedRnnAgent,
    },
}

/// Online and target networks consumed by the loss computation.
///
/// Either per-agent networks combined by a mixer, or a single network over
/// the joint action space. Constructors check that the networks fit the
/// agents they are built for.
pub struct ValueNetworks<'a, Q = RnnAgent> {
    agents: Vec<AgentId>,
    pub(super) networks: Networks<'a, Q>,
}

impl<'a, Q: RecurrentModel> ValueNetworks<'a, Q> {
    /// Per-agent networks combined by `mixer`.
    ///
    /// Fails if the mixers are of different kinds, a network of some agent is
    /// missing, or a hypernetwork mixer was built for another number of agents.
    pub fn factorized(
        agents: &[AgentId],
        mixer: &'a Mixer,
        target_mixer: &'a Mixer,
        agent_nets: &'a HashMap<AgentId, Q>,
        target_agent_nets: &'a HashMap<AgentId, Q>,
    ) -> Result<Self> {
        if mixer.kind() != target_mixer.kind() {
            return Err(QmixError::ArchitectureMismatch(format!(
                "mixer is {:?} but target mixer is {:?}",
                mixer.kind(),
                target_mixer.kind()
            ))
            .into());
        }
        for m in [mixer, target_mixer] {
            if let Some(n) = m.n_agents() {
                if n != agents.len() {
                    return Err(QmixError::ArchitectureMismatch(format!(
                        "mixer built for {} agents, got {}",
                        n,
                        agents.len()
                    ))
                    .into());
                }
            }
        }
        for a in agents {
            if !agent_nets.contains_key(a) || !target_agent_nets.contains_key(a) {
                return Err(QmixError::ArchitectureMismatch(format!(
                    "no agent network for {}",
                    a
                ))
                .into());
            }
        }

        Ok(Self {
            agents: agents.to_vec(),
            networks: Networks::Factorized {
                mixer,
                target_mixer,
                agent_nets,
                target_agent_nets,
            },
        })
    }
}

impl<'a> ValueNetworks<'a, RnnAgent> {
    /// A network over the joint action space, no mixer.
    ///
    /// Fails unless both networks have one action axis per agent.
    pub fn centralized(
        agents: &[AgentId],
        agent_net: &'a CentralizedRnnAgent,
        target_agent_net: &'a CentralizedRnnAgent,
    ) -> Result<Self> {
        if agent_net.n_actions_list() != target_agent_net.n_actions_list() {
            return Err(QmixError::ArchitectureMismatch(
                "online and target networks have different action spaces".to_string(),
            )
            .into());
        }
        if agent_net.n_actions_list().len() != agents.len() {
            return Err(QmixError::ArchitectureMismatch(format!(
                "centralized network has {} action axes for {} agents",
                agent_net.n_actions_list().len(),
                agents.len()
            ))
            .into());
        }

        Ok(Self {
            agents: agents.to_vec(),
            networks: Networks::Centralized {
                agent_net,
                target_agent_net,
            },
        })
    }
}

impl<Q> ValueNetworks<'_, Q> {
    /// Agents the networks were validated against.
    pub fn agents(&self) -> &[AgentId] {
        &self.agents
    }

    /// Kind of the mixer, `None` for the centralized network.
    pub fn mixer_kind(&self) -> Option<MixerKind> {
        match &self.networks {
            Networks::Factorized { mixer, .. } => Some(mixer.kind()),
            Networks::Centralized { .. } => None,
        }
    }
}
