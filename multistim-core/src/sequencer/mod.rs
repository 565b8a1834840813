//! Pulse sequencer
//!
//! The dual-timer state machine that walks a burst of sub-pulses, arms the
//! downstream transfers ahead of every edge and applies parameter changes
//! between phases.

mod fabric;
mod machine;
mod state;

#[cfg(test)]
mod mock;

pub use fabric::{wire_fabric, FabricRoutes, OutputTasks};
pub use machine::{PulseSequencer, SequencerHardware};
pub use state::{Phase, SequencerState, TimerEvent};
