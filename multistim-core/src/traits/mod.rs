//! Peripheral contracts consumed by the sequencer
//!
//! Low-level peripheral traits live in `multistim-hal`; these are the
//! higher-level contracts the drivers crate implements on top of them.

pub mod context;
pub mod transfer;

pub use context::TaskContext;
pub use transfer::{SlotError, SlotState, TransferSlot};
