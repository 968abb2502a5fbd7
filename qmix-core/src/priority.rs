//! Per-episode priorities for prioritized experience replay.
//!
//! Each stored episode carries three scalars kept in lock-step with the
//! episodes of a buffer: a sampling priority, an importance-sampling weight
//! and the latest td-error (the episode loss). Priorities are recomputed from
//! td-errors under one of the [`PrioritizationMode`]s and importance-sampling
//! weights correct the bias of the resulting non-uniform sampling:
//!
//! $w_i = \left(N^{-1} P(i)^{-1}\right)^{\beta}$.
mod base;
mod config;
mod mode;
pub use base::{EpisodePriorities, NEW_EPISODE_PRIORITY};
pub use config::PerConfig;
pub use mode::PrioritizationMode;
