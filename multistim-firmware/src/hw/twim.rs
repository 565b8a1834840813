//! TWIM0 frame transport for the MCP4725 DAC
//!
//! Write-only: LASTTX is shorted to STOP, so a transfer ends with the STOPPED
//! event. A NACK raises ERROR without stopping the bus; the transport stops
//! it when the error is observed and counts the failure.
//!
//! The fabric restarts the loaded frame on every preload compare, whether or
//! not it was re-armed. Status therefore consumes STOPPED together with
//! TXSTARTED, so a later hardware start shows up as a fresh TXSTARTED.

use core::sync::atomic::compiler_fence;

use embassy_nrf::pac::twim::vals::{Enable, Frequency};
use embassy_nrf::pac::TWIM0;
use multistim_hal::{FrameTransport, TaskHandle, TransportError, TransportStatus, Trigger, MAX_FRAME_LEN};
use portable_atomic::{AtomicBool, AtomicU32, Ordering};

use super::{configure_open_drain, pins, psel};

/// Transfers the DAC did not acknowledge
pub static NACKS: AtomicU32 = AtomicU32::new(0);

pub struct TwimTransport {
    buf: &'static mut [u8; MAX_FRAME_LEN],
    armed: AtomicBool,
}

impl TwimTransport {
    /// Configure TWIM0 at `bus_khz` for the device at `address`
    ///
    /// build.rs only lets 100, 250 and 400 through; anything else runs at
    /// 100 kHz.
    pub fn new(buf: &'static mut [u8; MAX_FRAME_LEN], address: u8, bus_khz: u32) -> Self {
        configure_open_drain(pins::DAC_SCL);
        configure_open_drain(pins::DAC_SDA);

        let r = TWIM0;
        r.psel().scl().write_value(psel(pins::DAC_SCL));
        r.psel().sda().write_value(psel(pins::DAC_SDA));
        r.address().write(|w| w.set_address(address));
        let frequency = match bus_khz {
            400 => Frequency::K400,
            250 => Frequency::K250,
            _ => Frequency::K100,
        };
        r.frequency().write(|w| w.set_frequency(frequency));
        r.shorts().write(|w| w.set_lasttx_stop(true));
        r.enable().write(|w| w.set_enable(Enable::ENABLED));

        Self {
            buf,
            armed: AtomicBool::new(false),
        }
    }

    /// Stop the bus after a NACK
    fn recover(&self) {
        let r = TWIM0;
        if r.events_error().read() == 0 {
            return;
        }
        r.events_error().write_value(0);
        r.errorsrc().write_value(r.errorsrc().read());
        r.tasks_stop().write_value(1);
        NACKS.fetch_add(1, Ordering::Relaxed);
    }
}

impl FrameTransport for TwimTransport {
    fn load(&mut self, frame: &[u8], trigger: Trigger) -> Result<(), TransportError> {
        if frame.len() > MAX_FRAME_LEN {
            return Err(TransportError::FrameTooLong);
        }
        if self.status() == TransportStatus::Active {
            return Err(TransportError::Busy);
        }

        let r = TWIM0;
        self.buf[..frame.len()].copy_from_slice(frame);
        r.txd().ptr().write_value(self.buf.as_ptr() as u32);
        r.txd().maxcnt().write(|w| w.set_maxcnt(frame.len() as _));
        r.events_txstarted().write_value(0);
        r.events_stopped().write_value(0);
        self.armed.store(true, Ordering::Release);
        compiler_fence(Ordering::SeqCst);

        if trigger == Trigger::Now {
            r.tasks_starttx().write_value(1);
        }
        Ok(())
    }

    fn cancel(&mut self) {
        let r = TWIM0;
        if self.status() == TransportStatus::Active {
            r.tasks_stop().write_value(1);
            // stops after the byte on the wire
            while r.events_stopped().read() == 0 {}
        }
        r.events_stopped().write_value(0);
        r.events_txstarted().write_value(0);
        self.armed.store(false, Ordering::Release);
    }

    fn status(&self) -> TransportStatus {
        self.recover();
        let r = TWIM0;
        if r.events_stopped().read() != 0 {
            r.events_stopped().write_value(0);
            r.events_txstarted().write_value(0);
            self.armed.store(false, Ordering::Release);
            TransportStatus::Idle
        } else if r.events_txstarted().read() != 0 {
            TransportStatus::Active
        } else if self.armed.load(Ordering::Acquire) {
            TransportStatus::Armed
        } else {
            TransportStatus::Idle
        }
    }

    fn start_task(&self) -> TaskHandle {
        TaskHandle(TWIM0.tasks_starttx().as_ptr() as u32)
    }
}
