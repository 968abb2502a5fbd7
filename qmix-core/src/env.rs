//! Environment collaborator.
use crate::{ObservationMap, RawAgentObs};

/// Interface of the environment consumed by replay buffers.
///
/// Only the parts needed to store transitions are required: the current
/// global state, whose length fixes the state dimension, and the scaling
/// applied to raw observations before they are stored.
pub trait Env {
    /// Returns the current global state vector.
    fn state(&self) -> Vec<f32>;

    /// Rescales raw observations of all agents.
    fn scale_observation(
        &self,
        observations: &ObservationMap<RawAgentObs>,
    ) -> ObservationMap<RawAgentObs>;
}
