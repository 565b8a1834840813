//! Frame transports
//!
//! A transport is a DMA-capable serial peripheral (SPI master, I2C master)
//! that can either start a frame immediately or load it and wait for its
//! start task to be triggered through the fabric.

use crate::routing::TaskHandle;

/// Largest frame any sequencer peripheral sends
pub const MAX_FRAME_LEN: usize = 4;

/// When a loaded frame goes out on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Trigger {
    /// Start the transfer now
    Now,
    /// Wait for the start task
    Hold,
}

/// Transport progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportStatus {
    /// Nothing loaded, nothing on the wire
    Idle,
    /// Frame loaded, waiting for the start task
    Armed,
    /// Frame is being clocked out
    Active,
}

/// Transport errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError {
    /// A transfer is on the wire
    Busy,
    /// Frame exceeds [`MAX_FRAME_LEN`]
    FrameTooLong,
}

/// DMA frame transfer with an optional hardware start
///
/// `load` and `cancel` must return in bounded time; they are called from the
/// state timer interrupt.
pub trait FrameTransport {
    /// Copy `frame` into the transfer buffer and start or arm it
    ///
    /// Loading over an `Armed` frame replaces it. Loading while `Active`
    /// fails with [`TransportError::Busy`].
    fn load(&mut self, frame: &[u8], trigger: Trigger) -> Result<(), TransportError>;

    /// Drop an armed frame or stop an active one
    fn cancel(&mut self);

    /// Current progress
    fn status(&self) -> TransportStatus;

    /// Fabric endpoint that starts an armed frame
    fn start_task(&self) -> TaskHandle;
}
