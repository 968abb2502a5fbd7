//! Prioritized episode replay computing the temporal-difference loss.
//!
//! [`PrioritizedEpisodeBuffer`] stores transitions as tensors on the compute
//! device, keeps per-episode priorities, importance-sampling weights and
//! td-errors in lock-step with the stored episodes, and evicts the oldest
//! episode once the number of stored transitions exceeds its capacity.
//!
//! The loss of an episode is computed by replaying it through recurrent
//! networks in temporal order, with the Double-DQN target evaluated by the
//! target networks at actions chosen by the online networks. The networks
//! are handed over as [`ValueNetworks`], which fixes at construction whether
//! per-agent Q-values are combined by a mixer or a single centralized
//! network scores joint actions.
mod base;
mod config;
mod networks;
pub use base::{DeviceTransition, PrioritizedEpisodeBuffer};
pub use config::PrioritizedEpisodeBufferConfig;
pub use networks::ValueNetworks;
