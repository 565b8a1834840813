//! Multistim Hardware Abstraction Layer
//!
//! Traits for the handful of peripherals the pulse sequencer touches. The
//! sequencer never sees registers; chip support lives in the firmware crate
//! and implements these traits.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  multistim-core (sequencer, params)     │
//! └─────────────────────────────────────────┘
//!          │                      │
//!          ▼                      ▼
//! ┌─────────────────┐   ┌─────────────────────┐
//! │ multistim-hal   │   │ multistim-drivers   │
//! │ (this crate)    │◄──│ (mux, DAC slots)    │
//! └─────────────────┘   └─────────────────────┘
//!          ▲
//!          │
//! ┌─────────────────────────────────────────┐
//! │  multistim-firmware (nRF52833 adapters) │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Traits
//!
//! - [`timer::CompareTimer`] - Counter with compare channels (pulse and state timers)
//! - [`gpio::OutputPin`] - Phase indicator and heartbeat LED
//! - [`transport::FrameTransport`] - DMA frame transfer that can be held for a hardware start
//! - [`routing::EventRouter`] - Event-to-task fabric, wired once at boot

#![no_std]
#![deny(unsafe_code)]

pub mod gpio;
pub mod routing;
pub mod timer;
pub mod transport;

// Re-export key traits at crate root for convenience
pub use gpio::{Level, NoPin, OutputPin};
pub use routing::{EventHandle, EventRouter, Route, RoutingError, TaskHandle};
pub use timer::{CompareChannel, CompareTimer};
pub use transport::{FrameTransport, TransportError, TransportStatus, Trigger, MAX_FRAME_LEN};
