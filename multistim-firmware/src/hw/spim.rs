//! SPIM3 frame transport for the multiplexer shift register
//!
//! A frame is shifted out MSB first and only reaches the switch outputs
//! when the latch-enable line is pulsed after the END event. The pulse
//! happens in the SPIM3 interrupt, or earlier if task code observes the END
//! event first (e.g. while waiting for the boot frame inside a critical
//! section).

use core::sync::atomic::{compiler_fence, Ordering};

use embassy_nrf::interrupt;
use embassy_nrf::pac::spim::vals::{Cpha, Cpol, Enable, Frequency, Order};
use embassy_nrf::pac::SPIM3;
use multistim_hal::{FrameTransport, TaskHandle, TransportError, TransportStatus, Trigger, MAX_FRAME_LEN};
use portable_atomic::AtomicBool;

use super::{configure_output, pins, psel, pulse_low};

/// A frame has been loaded and not yet latched
static PENDING: AtomicBool = AtomicBool::new(false);

pub struct SpimTransport {
    buf: &'static mut [u8; MAX_FRAME_LEN],
}

impl SpimTransport {
    /// Configure SPIM3 at 8 MHz, TX only, and enable its END interrupt
    pub fn new(buf: &'static mut [u8; MAX_FRAME_LEN]) -> Self {
        configure_output(pins::MUX_SCK, false);
        configure_output(pins::MUX_MOSI, false);

        let r = SPIM3;
        r.psel().sck().write_value(psel(pins::MUX_SCK));
        r.psel().mosi().write_value(psel(pins::MUX_MOSI));
        r.frequency().write(|w| w.set_frequency(Frequency::M8));
        r.config().write(|w| {
            w.set_order(Order::MSB_FIRST);
            w.set_cpol(Cpol::ACTIVE_HIGH);
            w.set_cpha(Cpha::LEADING);
        });
        r.rxd().maxcnt().write(|w| w.set_maxcnt(0));
        r.events_end().write_value(0);
        r.events_started().write_value(0);
        r.intenset().write(|w| w.set_end(true));
        r.enable().write(|w| w.set_enable(Enable::ENABLED));

        Self { buf }
    }
}

/// Latch a finished frame into the switch outputs
///
/// Returns `true` if a frame was latched. Callers hold the critical section.
pub fn latch_completed() -> bool {
    let r = SPIM3;
    if r.events_end().read() == 0 {
        return false;
    }
    r.events_end().write_value(0);
    r.events_started().write_value(0);
    pulse_low(pins::MUX_LE);
    PENDING.store(false, Ordering::Release);
    true
}

impl FrameTransport for SpimTransport {
    fn load(&mut self, frame: &[u8], trigger: Trigger) -> Result<(), TransportError> {
        if frame.len() > MAX_FRAME_LEN {
            return Err(TransportError::FrameTooLong);
        }
        if self.status() == TransportStatus::Active {
            return Err(TransportError::Busy);
        }

        let r = SPIM3;
        self.buf[..frame.len()].copy_from_slice(frame);
        r.txd().ptr().write_value(self.buf.as_ptr() as u32);
        r.txd().maxcnt().write(|w| w.set_maxcnt(frame.len() as _));
        r.events_started().write_value(0);
        PENDING.store(true, Ordering::Release);
        compiler_fence(Ordering::SeqCst);

        if trigger == Trigger::Now {
            r.tasks_start().write_value(1);
        }
        Ok(())
    }

    fn cancel(&mut self) {
        let r = SPIM3;
        if self.status() == TransportStatus::Active {
            r.events_stopped().write_value(0);
            r.tasks_stop().write_value(1);
            // stops within one byte
            while r.events_stopped().read() == 0 {}
        }
        r.events_end().write_value(0);
        r.events_started().write_value(0);
        PENDING.store(false, Ordering::Release);
    }

    fn status(&self) -> TransportStatus {
        latch_completed();
        // a fabric restart of the latched frame raises STARTED again
        if SPIM3.events_started().read() != 0 {
            TransportStatus::Active
        } else if PENDING.load(Ordering::Acquire) {
            TransportStatus::Armed
        } else {
            TransportStatus::Idle
        }
    }

    fn start_task(&self) -> TaskHandle {
        TaskHandle(SPIM3.tasks_start().as_ptr() as u32)
    }
}

#[interrupt]
fn SPIM3() {
    critical_section::with(|_| {
        latch_completed();
    });
}
