#![warn(missing_docs)]
//! Backend-independent core of value-factorized multi-agent Q-learning.
//!
//! This crate holds the parts of a QMIX/VDN training core that do not touch
//! tensors: the [`Transition`] record produced by an environment, the
//! episodic replay buffer that groups transitions by episode, bookkeeping of
//! per-episode priorities and importance-sampling weights, and helpers for
//! joint action spaces. Tensor-backed pieces (mixers, agent networks and the
//! loss computation) live in `qmix-candle-agent`.
pub mod episode_buffer;
pub mod error;
pub mod joint_action;
pub mod priority;
pub mod record;

mod base;
mod env;
mod transition;
pub use base::ExperienceBufferBase;
pub use env::Env;
pub use transition::{
    AgentId, AgentObs, ObservationMap, RawAgentObs, RawTransition, Transition,
};
