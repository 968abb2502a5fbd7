//! Value-factorized multi-agent Q-learning implemented with
//! [candle](https://crates.io/crates/candle-core).
//!
//! * [`masking`] - action-validity masking of Q-values.
//! * [`mixer`] - monotonic hypernetwork mixers (QMIX) and the additive mixer (VDN).
//! * [`agent`] - recurrent per-agent and centralized Q-networks.
//! * [`per`] - prioritized episode replay computing the temporal-difference loss.
//! * [`qmix`] - online/target networks, optimizer and target synchronization.
pub mod agent;
pub mod masking;
pub mod mixer;
pub mod model;
pub mod opt;
pub mod per;
pub mod qmix;
pub mod util;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;

/// Compute device of networks and stored transitions.
///
/// Serializable stand-in for [`candle_core::Device`] used in configuration
/// files.
#[derive(Clone, Debug, Copy, Deserialize, Serialize, PartialEq, Default)]
pub enum Device {
    /// The main CPU device.
    #[default]
    Cpu,

    /// The GPU device with the given ordinal.
    Cuda(usize),
}

impl TryFrom<Device> for candle_core::Device {
    type Error = anyhow::Error;

    fn try_from(device: Device) -> Result<Self> {
        match device {
            Device::Cpu => Ok(candle_core::Device::Cpu),
            Device::Cuda(n) => Ok(candle_core::Device::new_cuda(n)?),
        }
    }
}
