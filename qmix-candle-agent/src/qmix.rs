//! QMIX/VDN learner.
//!
//! [`Qmix`] owns online and target networks in separate var maps together
//! with the optimizer. One call of [`Qmix::opt`] selects episodes from a
//! [`PrioritizedEpisodeBuffer`](crate::per::PrioritizedEpisodeBuffer) by
//! priority, takes a gradient step on their importance-weighted losses,
//! copies the online parameters into the target networks every
//! `target_update_interval` steps and recomputes the priorities.
mod base;
mod config;
pub use base::Qmix;
pub use config::{QmixConfig, ValueNetworksConfig};
