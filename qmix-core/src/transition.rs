//! Transitions produced by a multi-agent environment.
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Identifier of an agent.
pub type AgentId = String;

/// Per-agent mapping of observations.
pub type ObservationMap<O> = HashMap<AgentId, O>;

/// Observation of a single agent together with its action validity mask.
///
/// In the mask, `1` marks a valid action and `0` an invalid one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentObs<X, M> {
    /// Raw observation.
    pub observation: X,

    /// Action validity mask.
    pub action_mask: M,
}

/// Observation of an agent as produced by the environment.
pub type RawAgentObs = AgentObs<Vec<f32>, Vec<u8>>;

/// Record of one environment step of all agents.
///
/// Transitions are treated as immutable once stored in a replay buffer;
/// [`Transition::with_rewards`] builds a modified copy instead of rewriting a
/// field in place.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transition<O, S> {
    /// Episode the transition belongs to, starting from 1.
    pub episode_id: usize,

    /// Observations before the actions were taken.
    pub previous_observations: ObservationMap<O>,

    /// Observations after the actions were taken.
    pub observations: ObservationMap<O>,

    /// Global state before the actions were taken.
    pub previous_state: S,

    /// Global state after the actions were taken.
    pub state: S,

    /// Discrete action chosen by each agent.
    pub actions: HashMap<AgentId, usize>,

    /// Reward shared by the team.
    pub rewards: f32,
}

/// Transition as produced by the environment.
pub type RawTransition = Transition<RawAgentObs, Vec<f32>>;

impl<O: Clone, S: Clone> Transition<O, S> {
    /// Returns a copy of the transition carrying the given reward.
    pub fn with_rewards(&self, rewards: f32) -> Self {
        Self {
            rewards,
            ..self.clone()
        }
    }
}
