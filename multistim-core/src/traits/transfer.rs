//! Transfer slot contract
//!
//! One slot per downstream peripheral (multiplexer pattern, DAC amplitude).
//!
//! ```text
//!            prepare              start task
//!   Idle ──────────────► Held ───────────────► InFlight ──► Idle
//!     │                   │                       ▲   (done)
//!     └──────── write ────┼───────────────────────┘
//!                         │ abort (from Held or InFlight)
//!                         ▼
//!                        Idle
//! ```

use multistim_hal::{TaskHandle, TransportError};

use super::context::TaskContext;

/// Slot progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SlotState {
    /// No transfer pending
    Idle,
    /// Loaded and waiting for the hardware start signal
    Held,
    /// On the wire
    InFlight,
}

/// Transfer slot errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SlotError {
    /// A transfer is in flight
    Busy,
    /// The peripheral refused the transfer
    Rejected,
}

impl From<TransportError> for SlotError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Busy => SlotError::Busy,
            TransportError::FrameTooLong => SlotError::Rejected,
        }
    }
}

/// Non-blocking peripheral transfer
///
/// `write`, `prepare`, `abort` and the state queries return in bounded time
/// and may be called from the state timer interrupt. Only
/// [`TransferSlot::wait_ready`] blocks.
pub trait TransferSlot {
    /// Send `value` now
    fn write(&mut self, value: u16) -> Result<(), SlotError>;

    /// Load `value` to go out on the next start signal
    ///
    /// Replaces a value that is already held.
    fn prepare(&mut self, value: u16) -> Result<(), SlotError>;

    /// Cancel a held or in-flight transfer; no-op when idle
    fn abort(&mut self);

    /// Current progress
    fn state(&self) -> SlotState;

    /// No transfer pending
    fn is_ready(&self) -> bool {
        self.state() == SlotState::Idle
    }

    /// Spin until the slot is idle
    ///
    /// A held transfer never completes on its own; abort it first.
    fn wait_ready(&mut self, _cx: &TaskContext) {
        while !self.is_ready() {
            core::hint::spin_loop();
        }
    }

    /// Fabric endpoint that releases a held transfer
    fn start_task(&self) -> TaskHandle;
}
