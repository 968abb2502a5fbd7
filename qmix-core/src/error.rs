//! Errors in the library.
use thiserror::Error;

/// Errors in the library.
#[derive(Error, Debug, PartialEq)]
pub enum QmixError {
    /// Sampling was requested from a buffer without episodes.
    #[error("Memory is empty. No episodes to sample.")]
    EmptyBuffer,

    /// The episode is not stored in the buffer.
    #[error("Episode {0} is not stored in the buffer")]
    EpisodeNotFound(usize),

    /// The episode has no transitions.
    #[error("Episode {0} has no transitions")]
    EmptyEpisode(usize),

    /// An agent referenced by a transition or a network map is unknown.
    #[error("Unknown agent: {0}")]
    UnknownAgent(String),

    /// The prioritization mode is not implemented.
    #[error("Prioritization mode of PER is not implemented: {0}")]
    UnsupportedPrioritization(String),

    /// Networks handed to the loss computation do not fit together.
    #[error("Architecture mismatch: {0}")]
    ArchitectureMismatch(String),

    /// Priorities cannot form a sampling distribution.
    #[error("Invalid priorities: {0}")]
    InvalidPriorities(String),

    /// The state vector of a transition does not match the environment.
    #[error("State dimension mismatch: expected {expected}, got {actual}")]
    StateDimMismatch {
        /// Dimension reported by the environment.
        expected: usize,
        /// Dimension found in the transition.
        actual: usize,
    },

    /// Record key error.
    #[error("Record key error: {0}")]
    RecordKeyError(String),

    /// Record value type error.
    #[error("Record value type error: {0}")]
    RecordValueTypeError(String),
}
