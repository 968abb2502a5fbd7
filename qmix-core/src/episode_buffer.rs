//! Episodic replay buffer.
//!
//! Transitions are grouped by their `episode_id` and kept in temporal order,
//! since recurrent agent networks thread their hidden state through an
//! episode step by step. Sampling returns contiguous windows of an episode.
//!
//! ```rust
//! use qmix_core::episode_buffer::{EpisodeBufferConfig, EpisodeReplayBuffer};
//! use qmix_core::RawAgentObs;
//!
//! let config = EpisodeBufferConfig::default().batch_size(4).seed(42);
//! let buffer: EpisodeReplayBuffer<RawAgentObs, Vec<f32>> =
//!     EpisodeReplayBuffer::build(vec!["agent_0".to_string()], &config);
//! assert_eq!(buffer.num_episodes(), 0);
//! ```
mod base;
mod config;
pub use base::EpisodeReplayBuffer;
pub use config::EpisodeBufferConfig;
