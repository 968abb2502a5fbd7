//! Replay buffer storing transitions keyed by episode.
use super::EpisodeBufferConfig;
use crate::{error::QmixError, AgentId, ExperienceBufferBase, Transition};
use anyhow::Result;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::collections::BTreeMap;

/// Replay buffer storing whole episodes.
///
/// Episodes are kept in a map ordered by episode id, each holding its
/// transitions in the order they were pushed.
pub struct EpisodeReplayBuffer<O, S> {
    agents: Vec<AgentId>,
    batch_size: usize,
    memory: BTreeMap<usize, Vec<Transition<O, S>>>,
    n_transitions: usize,
    rng: StdRng,
}

impl<O, S> EpisodeReplayBuffer<O, S>
where
    O: Clone,
    S: Clone,
{
    /// Constructs an empty buffer for the given agents.
    ///
    /// The order of `agents` fixes the agent axis of every tensor built from
    /// the stored transitions.
    pub fn build(agents: Vec<AgentId>, config: &EpisodeBufferConfig) -> Self {
        Self {
            agents,
            batch_size: config.batch_size,
            memory: BTreeMap::new(),
            n_transitions: 0,
            rng: StdRng::seed_from_u64(config.seed),
        }
    }

    /// Agents whose transitions are stored.
    pub fn agents(&self) -> &[AgentId] {
        &self.agents
    }

    /// Length of windows returned by [`Self::sample`].
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Returns `true` if no transition is stored.
    pub fn is_empty(&self) -> bool {
        self.n_transitions == 0
    }

    /// Number of stored episodes.
    pub fn num_episodes(&self) -> usize {
        self.memory.len()
    }

    /// Ids of stored episodes in ascending order.
    pub fn episode_ids(&self) -> impl Iterator<Item = usize> + '_ {
        self.memory.keys().copied()
    }

    /// Returns `true` if the episode is stored.
    pub fn contains(&self, episode_id: usize) -> bool {
        self.memory.contains_key(&episode_id)
    }

    /// Transitions of an episode in temporal order.
    pub fn episode(&self, episode_id: usize) -> Option<&[Transition<O, S>]> {
        self.memory.get(&episode_id).map(|e| e.as_slice())
    }

    /// Removes an episode and returns its transitions.
    pub fn remove(&mut self, episode_id: usize) -> Option<Vec<Transition<O, S>>> {
        let episode = self.memory.remove(&episode_id)?;
        self.n_transitions -= episode.len();
        Some(episode)
    }

    /// Samples a contiguous sequence of transitions.
    ///
    /// * `episode_id` - Episode to sample from. If `None`, an episode is chosen
    ///   uniformly at random.
    /// * `include_last` - If `true`, the trailing window of the episode is
    ///   returned instead of a random one.
    /// * `return_whole` - If `true`, the whole episode is returned.
    ///
    /// Episodes shorter than the configured batch size yield a random window
    /// of two thirds of their length.
    pub fn sample(
        &mut self,
        episode_id: Option<usize>,
        include_last: bool,
        return_whole: bool,
    ) -> Result<&[Transition<O, S>]> {
        let episode_id = match episode_id {
            Some(episode_id) => episode_id,
            None => {
                if self.memory.is_empty() {
                    return Err(QmixError::EmptyBuffer.into());
                }
                let ix = self.rng.gen_range(0..self.memory.len());
                self.memory
                    .keys()
                    .nth(ix)
                    .copied()
                    .ok_or(QmixError::EmptyBuffer)?
            }
        };

        let len = self
            .memory
            .get(&episode_id)
            .ok_or(QmixError::EpisodeNotFound(episode_id))?
            .len();

        let range = if return_whole {
            0..len
        } else if len < self.batch_size {
            let n = len * 2 / 3;
            let start = self.rng.gen_range(0..=len - n);
            start..start + n
        } else if include_last {
            len - self.batch_size..len
        } else {
            let start = self.rng.gen_range(0..=len - self.batch_size);
            start..start + self.batch_size
        };

        Ok(&self.memory[&episode_id][range])
    }

    /// Adds `advantage` to the reward of every transition of an episode.
    pub fn give_advantage(&mut self, episode_id: usize, advantage: f32) -> Result<()> {
        let episode = self
            .memory
            .get_mut(&episode_id)
            .ok_or(QmixError::EpisodeNotFound(episode_id))?;
        for tr in episode.iter_mut() {
            *tr = tr.with_rewards(tr.rewards + advantage);
        }
        Ok(())
    }
}

impl<O, S> ExperienceBufferBase for EpisodeReplayBuffer<O, S>
where
    O: Clone,
    S: Clone,
{
    type Item = Transition<O, S>;

    /// Appends a transition to its episode, creating the episode if it is new.
    fn push(&mut self, tr: Self::Item) -> Result<()> {
        self.memory.entry(tr.episode_id).or_default().push(tr);
        self.n_transitions += 1;
        Ok(())
    }

    /// Total number of stored transitions.
    fn len(&self) -> usize {
        self.n_transitions
    }
}
