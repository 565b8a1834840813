//! Peripheral drivers for the pulse sequencer
//!
//! This crate provides the transfer slots the sequencer drives, built on the
//! frame transports of `multistim-hal`:
//!
//! - Shift-register analog multiplexer (16 channels, SPI)
//! - MCP4725 DAC (I2C)
//! - Output pin adapter for `embedded-hal` GPIO

#![no_std]
#![deny(unsafe_code)]

pub mod dac;
pub mod mux;
pub mod pin;
pub mod slot;

pub use dac::{dac_slot, frame_time_us, DacSlot, Mcp4725Encoder, MCP4725_ADDRESS};
pub use mux::{mux_slot, MuxSlot, ShiftRegisterEncoder};
pub use pin::HalPin;
pub use slot::{Frame, FrameEncoder, FrameSlot};
