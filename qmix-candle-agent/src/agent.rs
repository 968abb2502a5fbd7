//! Recurrent agent networks.
//!
//! [`RnnAgent`] is the decentralized per-agent network producing one Q-value
//! per action of its agent. [`CentralizedRnnAgent`] scores joint actions of
//! all agents from the global state, its output indexed by one axis per agent.
mod centralized;
mod config;
mod rnn;
pub use centralized::CentralizedRnnAgent;
pub use config::{CentralizedRnnAgentConfig, RnnAgentConfig};
pub use rnn::RnnAgent;

use anyhow::Result;
use candle_core::Tensor;
use candle_nn::{
    rnn::{GRUState, GRU, RNN},
    Linear, Module,
};

/// Input layer followed by a GRU cell, shared by both agent networks.
///
/// The input is flattened per row of `hidden`.
fn recurrent_step(fc1: &Linear, rnn: &GRU, input: &Tensor, hidden: &Tensor) -> Result<Tensor> {
    let batch_size = hidden.dim(0)?;
    let x = fc1.forward(&input.reshape((batch_size, ()))?)?.relu()?;
    let state = rnn.step(&x, &GRUState { h: hidden.clone() })?;
    Ok(state.h)
}
