use super::{networks::Networks, PrioritizedEpisodeBufferConfig, ValueNetworks};
use crate::{
    masking::{centralized_mask_only, get_action_from_q, mask_only},
    mixer::MixerKind,
    model::RecurrentModel,
    util::{huber_loss, huber_loss_elementwise, Reduction},
};
use anyhow::{anyhow, Result};
use candle_core::{Device, Tensor};
use log::{debug, info, warn};
use qmix_core::{
    episode_buffer::EpisodeReplayBuffer,
    error::QmixError,
    joint_action::encode_joint_action,
    priority::{EpisodePriorities, PerConfig, PrioritizationMode},
    record::{Record, RecordValue},
    AgentId, AgentObs, Env, ExperienceBufferBase, ObservationMap, RawAgentObs, RawTransition,
    Transition,
};
use rand::{rngs::StdRng, SeedableRng};
use std::convert::TryFrom;

/// Transition whose observations, masks and states are tensors on the device.
///
/// Observations are 1-D, masks are 1-D `u8` and states have shape
/// `(1, state_dim)`.
pub type DeviceTransition = Transition<AgentObs<Tensor, Tensor>, Tensor>;

/// Prioritized replay buffer of episodes.
pub struct PrioritizedEpisodeBuffer {
    buffer: EpisodeReplayBuffer<AgentObs<Tensor, Tensor>, Tensor>,
    priorities: EpisodePriorities,
    per_config: PerConfig,
    capacity: usize,
    episode_head: usize,
    weighted_alpha: f64,
    device: Device,
    rng: StdRng,
}

impl PrioritizedEpisodeBuffer {
    /// Constructs an empty buffer for the given agents.
    pub fn build(agents: Vec<AgentId>, config: &PrioritizedEpisodeBufferConfig) -> Result<Self> {
        Ok(Self {
            buffer: EpisodeReplayBuffer::build(agents, &config.buffer),
            priorities: EpisodePriorities::new(),
            per_config: config.per.clone(),
            capacity: config.capacity,
            episode_head: 1,
            weighted_alpha: config.weighted_alpha as f64,
            device: Device::try_from(config.device)?,
            rng: StdRng::seed_from_u64(config.buffer.seed),
        })
    }

    /// Agents whose transitions are stored, in the order of the agent axis.
    pub fn agents(&self) -> &[AgentId] {
        self.buffer.agents()
    }

    /// Device on which transitions are stored.
    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Maximum number of stored transitions.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Id of the oldest episode, the next to be evicted.
    pub fn episode_head(&self) -> usize {
        self.episode_head
    }

    /// Prioritization parameters.
    pub fn per_config(&self) -> &PerConfig {
        &self.per_config
    }

    /// Number of stored episodes.
    pub fn num_episodes(&self) -> usize {
        self.buffer.num_episodes()
    }

    /// Ids of stored episodes in ascending order.
    pub fn episode_ids(&self) -> Vec<usize> {
        self.buffer.episode_ids().collect()
    }

    /// Transitions of an episode in temporal order.
    pub fn episode(&self, episode_id: usize) -> Option<&[DeviceTransition]> {
        self.buffer.episode(episode_id)
    }

    /// Priority, importance-sampling weight and td-error bookkeeping.
    pub fn priorities(&self) -> &EpisodePriorities {
        &self.priorities
    }

    /// Copies a transition to the device.
    ///
    /// Observations are rescaled by `env` first. Episode id and actions are
    /// kept as they are; the given transition is left untouched.
    pub fn to_device(&self, tr: &RawTransition, env: &impl Env) -> Result<DeviceTransition> {
        let state_dim = env.state().len();
        for s in [&tr.previous_state, &tr.state] {
            if s.len() != state_dim {
                return Err(QmixError::StateDimMismatch {
                    expected: state_dim,
                    actual: s.len(),
                }
                .into());
            }
        }

        let previous_observations =
            self.obs_to_device(&env.scale_observation(&tr.previous_observations))?;
        let observations = self.obs_to_device(&env.scale_observation(&tr.observations))?;

        Ok(Transition {
            episode_id: tr.episode_id,
            previous_observations,
            observations,
            previous_state: Tensor::from_slice(&tr.previous_state, (1, state_dim), &self.device)?,
            state: Tensor::from_slice(&tr.state, (1, state_dim), &self.device)?,
            actions: tr.actions.clone(),
            rewards: tr.rewards,
        })
    }

    fn obs_to_device(
        &self,
        obs: &ObservationMap<RawAgentObs>,
    ) -> Result<ObservationMap<AgentObs<Tensor, Tensor>>> {
        self.agents()
            .iter()
            .map(|a| -> Result<(AgentId, AgentObs<Tensor, Tensor>)> {
                let o = obs.get(a).ok_or_else(|| QmixError::UnknownAgent(a.clone()))?;
                let observation =
                    Tensor::from_slice(&o.observation, (o.observation.len(),), &self.device)?;
                let action_mask =
                    Tensor::from_slice(&o.action_mask, (o.action_mask.len(),), &self.device)?;
                Ok((
                    a.clone(),
                    AgentObs {
                        observation,
                        action_mask,
                    },
                ))
            })
            .collect()
    }

    /// Stores a transition on the device and marks its episode as new.
    ///
    /// While more transitions than the capacity are stored, episodes are
    /// evicted from the head. The episode of the pushed transition is never
    /// evicted.
    pub fn push(&mut self, tr: RawTransition, env: &impl Env) -> Result<()> {
        let tr = self.to_device(&tr, env)?;
        let episode_id = tr.episode_id;
        self.buffer.push(tr)?;
        self.priorities.mark_new(episode_id);

        while self.buffer.len() > self.capacity && self.episode_head < episode_id {
            if self.buffer.contains(self.episode_head) {
                self.empty_head()?;
            } else {
                self.episode_head += 1;
            }
        }
        Ok(())
    }

    /// Evicts the episode at the head and advances the head by one.
    pub fn empty_head(&mut self) -> Result<()> {
        let episode_id = self.episode_head;
        let episode = self
            .buffer
            .remove(episode_id)
            .ok_or(QmixError::EpisodeNotFound(episode_id))?;
        self.priorities.remove(episode_id);
        info!(
            "Deleted episode {} ({} transitions) from memory",
            episode_id,
            episode.len()
        );
        self.episode_head += 1;
        Ok(())
    }

    /// Samples a contiguous sequence of transitions, see [`EpisodeReplayBuffer::sample`].
    pub fn sample(
        &mut self,
        episode_id: Option<usize>,
        include_last: bool,
        return_whole: bool,
    ) -> Result<&[DeviceTransition]> {
        self.buffer.sample(episode_id, include_last, return_whole)
    }

    /// Adds `advantage` to the reward of every transition of an episode.
    pub fn give_advantage(&mut self, episode_id: usize, advantage: f32) -> Result<()> {
        self.buffer.give_advantage(episode_id, advantage)
    }

    /// Returns the td-error and the importance-sampling weight of an episode.
    pub fn sample_weights(&self, episode_id: usize) -> Result<(f32, f32)> {
        match (
            self.priorities.td_error(episode_id),
            self.priorities.isweight(episode_id),
        ) {
            (Some(td_error), Some(isweight)) => Ok((td_error, isweight)),
            _ => Err(QmixError::EpisodeNotFound(episode_id).into()),
        }
    }

    /// Draws episode ids without replacement according to the priorities.
    pub fn select_episodes(&mut self, num_samples: usize) -> Result<Vec<usize>> {
        self.priorities.select_episodes(&mut self.rng, num_samples)
    }

    /// Computes the loss of a whole episode and stores it as its td-error.
    ///
    /// If `weighted` is `true` and the mixer is [`MixerKind::QMix`], samples
    /// with a non-negative td-error are down-weighted by the configured
    /// weight before the reduction.
    pub fn calculate_loss<Q: RecurrentModel>(
        &mut self,
        networks: &ValueNetworks<Q>,
        episode_id: usize,
        gamma: f64,
        weighted: bool,
        reduction: Reduction,
    ) -> Result<Tensor> {
        let episode = self
            .buffer
            .episode(episode_id)
            .ok_or(QmixError::EpisodeNotFound(episode_id))?;
        let loss = self.episode_loss(networks, episode_id, episode, gamma, weighted, reduction)?;

        let td_error = loss.to_scalar::<f32>()?;
        if !td_error.is_finite() {
            warn!("Non-finite loss {} in episode {}", td_error, episode_id);
        }
        self.priorities.set_td_error(episode_id, td_error)?;
        Ok(loss)
    }

    /// Computes the loss of the window `[starting_index, starting_index + batch_size)`
    /// of an episode.
    ///
    /// The window is truncated at the end of the episode. The td-error of the
    /// episode is not updated.
    pub fn calculate_batch_loss<Q: RecurrentModel>(
        &self,
        networks: &ValueNetworks<Q>,
        episode_id: usize,
        gamma: f64,
        starting_index: usize,
        batch_size: usize,
        weighted: bool,
    ) -> Result<Tensor> {
        let episode = self
            .buffer
            .episode(episode_id)
            .ok_or(QmixError::EpisodeNotFound(episode_id))?;
        let end = starting_index.saturating_add(batch_size).min(episode.len());
        let window = episode
            .get(starting_index..end)
            .ok_or(QmixError::EmptyEpisode(episode_id))?;
        self.episode_loss(networks, episode_id, window, gamma, weighted, Reduction::Mean)
    }

    /// Recomputes priorities and importance-sampling weights of all episodes.
    ///
    /// If `calculate_for_all` is `true` and the mode is not uniform, td-errors
    /// of all stored episodes are recomputed first with the weighted mean loss.
    pub fn prioritize<Q: RecurrentModel>(
        &mut self,
        networks: &ValueNetworks<Q>,
        gamma: f64,
        mode: PrioritizationMode,
        calculate_for_all: bool,
    ) -> Result<Record> {
        info!("Prioritizing {} episodes", self.buffer.num_episodes());
        if mode != PrioritizationMode::Uniform && calculate_for_all {
            for episode_id in self.episode_ids() {
                self.calculate_loss(networks, episode_id, gamma, true, Reduction::Mean)?;
                debug!(
                    "Calculated td error for episode {:<3}: {:.2}",
                    episode_id,
                    self.priorities.td_error(episode_id).unwrap_or(f32::NAN)
                );
            }
        }

        let config = self.per_config.clone().mode(mode);
        self.priorities.prioritize(&config);

        let td_errors = self.priorities.td_errors();
        let mean_td_error = match td_errors.len() {
            0 => 0.0,
            n => td_errors.values().sum::<f32>() / n as f32,
        };
        let max_isweight = self
            .priorities
            .isweights()
            .values()
            .copied()
            .fold(0f32, f32::max);

        Ok(Record::from_slice(&[
            ("mode", RecordValue::String(mode.to_string())),
            (
                "n_episodes",
                RecordValue::Scalar(self.buffer.num_episodes() as f32),
            ),
            ("mean_td_error", RecordValue::Scalar(mean_td_error)),
            ("max_isweight", RecordValue::Scalar(max_isweight)),
        ]))
    }

    fn episode_loss<Q: RecurrentModel>(
        &self,
        networks: &ValueNetworks<Q>,
        episode_id: usize,
        episode: &[DeviceTransition],
        gamma: f64,
        weighted: bool,
        reduction: Reduction,
    ) -> Result<Tensor> {
        if episode.is_empty() {
            return Err(QmixError::EmptyEpisode(episode_id).into());
        }
        if networks.agents() != self.agents() {
            return Err(QmixError::ArchitectureMismatch(
                "networks were validated for other agents".to_string(),
            )
            .into());
        }

        let (total_q, target_q) = match &networks.networks {
            Networks::Factorized {
                mixer,
                target_mixer,
                agent_nets,
                target_agent_nets,
            } => {
                let agents = self.agents();
                let mut hiddens = Vec::with_capacity(agents.len());
                let mut target_hiddens = Vec::with_capacity(agents.len());
                let mut nets = Vec::with_capacity(agents.len());
                for a in agents {
                    let net = agent_net(agent_nets, a)?;
                    let target_net = agent_net(target_agent_nets, a)?;
                    hiddens.push(net.init_hidden(1)?);
                    target_hiddens.push(target_net.init_hidden(1)?);
                    nets.push((net, target_net));
                }

                let mut agent_qs = Vec::with_capacity(episode.len());
                let mut target_qs = Vec::with_capacity(episode.len());
                for tr in episode {
                    let mut step_qs = Vec::with_capacity(agents.len());
                    let mut step_target_qs = Vec::with_capacity(agents.len());

                    for (i, a) in agents.iter().enumerate() {
                        let (net, target_net) = nets[i];
                        let prev_obs = agent_obs(&tr.previous_observations, a)?;
                        let obs = agent_obs(&tr.observations, a)?;

                        let (q, h) = net.forward(&prev_obs.observation, &hiddens[i])?;
                        let q = mask_only(&prev_obs.action_mask, &q)?;
                        hiddens[i] = h;

                        let (target_q, target_h) =
                            target_net.forward(&obs.observation, &target_hiddens[i])?;
                        let target_q = mask_only(&obs.action_mask, &target_q.detach())?;
                        target_hiddens[i] = target_h.detach();

                        step_qs.push(q.flatten_all()?.get(action(tr, a)?)?);

                        // Double DQN
                        let (q_next, _) = net.forward(&obs.observation, &hiddens[i])?;
                        let greedy = mask_only(&obs.action_mask, &q_next.detach())?
                            .flatten_all()?
                            .argmax(0)?
                            .to_scalar::<u32>()? as usize;
                        step_target_qs.push(target_q.flatten_all()?.get(greedy)?);
                    }

                    let n = agents.len();
                    agent_qs.push(Tensor::stack(&step_qs, 0)?.reshape((1, 1, n))?);
                    target_qs.push(Tensor::stack(&step_target_qs, 0)?.reshape((1, 1, n))?);
                }

                let agent_qs = Tensor::cat(&agent_qs, 0)?;
                let target_qs = Tensor::cat(&target_qs, 0)?;
                let previous_states = episode
                    .iter()
                    .map(|tr| tr.previous_state.clone())
                    .collect::<Vec<_>>();
                let states = episode.iter().map(|tr| tr.state.clone()).collect::<Vec<_>>();
                let previous_states = Tensor::cat(&previous_states, 0)?;
                let states = Tensor::cat(&states, 0)?;

                (
                    mixer.forward(&agent_qs, &previous_states)?.flatten_all()?,
                    target_mixer.forward(&target_qs, &states)?.flatten_all()?,
                )
            }
            Networks::Centralized {
                agent_net,
                target_agent_net,
            } => {
                let agents = self.agents();
                let n_actions_list = agent_net.n_actions_list();
                let mut hidden = agent_net.init_hidden(1)?;
                let mut target_hidden = target_agent_net.init_hidden(1)?;

                let mut agent_qs = Vec::with_capacity(episode.len());
                let mut target_qs = Vec::with_capacity(episode.len());
                for tr in episode {
                    let (q, h) = agent_net.forward(&tr.previous_state, &hidden)?;
                    let q = centralized_mask_only(&tr.previous_observations, agents, &q)?;
                    hidden = h;

                    let (target_q, target_h) = target_agent_net.forward(&tr.state, &target_hidden)?;
                    let target_q =
                        centralized_mask_only(&tr.observations, agents, &target_q.detach())?;
                    target_hidden = target_h.detach();

                    let taken = agents
                        .iter()
                        .map(|a| action(tr, a))
                        .collect::<Result<Vec<_>>>()?;
                    let ix = encode_joint_action(&taken, n_actions_list);
                    agent_qs.push(q.flatten_all()?.get(ix)?);

                    // Double DQN
                    let (q_next, _) = agent_net.forward(&tr.state, &hidden)?;
                    let q_next = centralized_mask_only(&tr.observations, agents, &q_next.detach())?;
                    let greedy = get_action_from_q(&q_next, n_actions_list, 1)?
                        .pop()
                        .ok_or_else(|| anyhow!("no greedy joint action"))?;
                    let ix = encode_joint_action(&greedy, n_actions_list);
                    target_qs.push(target_q.flatten_all()?.get(ix)?);
                }

                (Tensor::stack(&agent_qs, 0)?, Tensor::stack(&target_qs, 0)?)
            }
        };

        let rewards = episode.iter().map(|tr| tr.rewards).collect::<Vec<_>>();
        let rewards = Tensor::from_vec(rewards, (episode.len(),), &self.device)?;
        let discounted_reward = (rewards + (gamma * target_q.detach())?)?;

        if weighted && networks.mixer_kind() == Some(MixerKind::QMix) {
            // Weighted QMIX
            let td_error = (&total_q - &discounted_reward)?;
            let ones = td_error.ones_like()?;
            let ws = td_error
                .lt(0.0)?
                .where_cond(&ones, &(&ones * self.weighted_alpha)?)?;
            let loss = huber_loss_elementwise(&total_q, &discounted_reward)?;
            reduction.apply(&(ws * loss)?)
        } else {
            huber_loss(&total_q, &discounted_reward, reduction)
        }
    }
}

fn agent_net<'a, Q>(
    nets: &'a std::collections::HashMap<AgentId, Q>,
    agent: &AgentId,
) -> Result<&'a Q> {
    nets.get(agent)
        .ok_or_else(|| QmixError::UnknownAgent(agent.clone()).into())
}

fn agent_obs<'a>(
    obs: &'a ObservationMap<AgentObs<Tensor, Tensor>>,
    agent: &AgentId,
) -> Result<&'a AgentObs<Tensor, Tensor>> {
    obs.get(agent)
        .ok_or_else(|| QmixError::UnknownAgent(agent.clone()).into())
}

fn action(tr: &DeviceTransition, agent: &AgentId) -> Result<usize> {
    tr.actions
        .get(agent)
        .copied()
        .ok_or_else(|| QmixError::UnknownAgent(agent.clone()).into())
}
