//! Board-agnostic core logic for the multistim stimulator firmware
//!
//! Everything here runs on the host as well as the target:
//!
//! - Tick conversion and pulse train timing
//! - Parameter store shared between the command task and the timer interrupt
//! - Transfer slot contract for the multiplexer and DAC
//! - Dual-timer pulse sequencer state machine
//! - Operator command validation
//! - Configuration type definitions

#![no_std]
#![deny(unsafe_code)]

pub mod command;
pub mod config;
pub mod params;
pub mod sequencer;
pub mod timing;
pub mod traits;
