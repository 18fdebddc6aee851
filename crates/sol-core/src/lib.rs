//! Hardware-independent control core for sol-rs
//!
//! This crate contains all platform-agnostic logic for the sol solar
//! sensor node: the duty-cycle orchestrator, the circular record log and
//! credential store over a byte-addressable EEPROM, the provisioning
//! state machine, and the power-sweep sampler.
//!
//! It is `#![no_std]` (std only under test) so it compiles on both
//! embedded targets and desktop hosts (for the simulator and tests).

#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod error;
pub mod hardware;
pub mod orchestrator;
pub mod provisioning;
pub mod retained;
pub mod sampling;
pub mod storage;
pub mod upload;
pub mod wake;

#[cfg(test)]
mod testing;

pub use config::NodeConfig;
pub use error::SolError;
pub use orchestrator::{CycleOutcome, SolNode};
pub use retained::RetainedState;
pub use wake::{ProvisionRequestFlag, WakeCause};
