//! Sequencer instance and the state timer interrupt
//!
//! The parameter store is a plain static: it is safe to share as is. The
//! sequencer itself lives behind a critical-section mutex, which the TIMER2
//! handler and the control task both go through, so the two never run
//! sequencer code at the same time.

use core::cell::RefCell;

use cortex_m::peripheral::scb::VectActive;
use cortex_m::peripheral::SCB;
use critical_section::Mutex;
use embassy_nrf::gpio::Output;
use embassy_nrf::{interrupt, pac};
use multistim_core::params::ParameterStore;
use multistim_core::sequencer::{PulseSequencer, TimerEvent};
use multistim_core::traits::TaskContext;
use multistim_drivers::{DacSlot, HalPin, MuxSlot};
use multistim_hal::CompareChannel;

use crate::config::{DEFAULTS, SETTINGS};
use crate::hw::spim::SpimTransport;
use crate::hw::timer::NrfTimer;
use crate::hw::twim::TwimTransport;

pub type Sequencer = PulseSequencer<
    'static,
    NrfTimer,
    NrfTimer,
    MuxSlot<SpimTransport>,
    DacSlot<TwimTransport>,
    HalPin<Output<'static>>,
>;

/// Runtime parameters, written by the control task and read by TIMER2
pub static PARAMS: ParameterStore = ParameterStore::new(&SETTINGS, &DEFAULTS);

/// Installed once at boot, before TIMER2 is unmasked
pub static SEQUENCER: Mutex<RefCell<Option<Sequencer>>> = Mutex::new(RefCell::new(None));

/// Put the sequencer where the interrupt handler can reach it
pub fn install(sequencer: Sequencer) {
    critical_section::with(|cs| {
        SEQUENCER.borrow_ref_mut(cs).replace(sequencer);
    });
}

/// Run `f` on the installed sequencer with interrupts masked
pub fn with_sequencer<R>(f: impl FnOnce(&mut Sequencer) -> R) -> Option<R> {
    critical_section::with(|cs| SEQUENCER.borrow_ref_mut(cs).as_mut().map(f))
}

/// Token for the blocking parts of start
///
/// Panics when called from an exception handler.
pub fn task_context() -> TaskContext {
    defmt::assert!(SCB::vect_active() == VectActive::ThreadMode);
    // SAFETY: no exception handler is active, checked above
    unsafe { TaskContext::new_unchecked() }
}

/// Only the transition raises TIMER2; the preload compare is routed to the
/// transfer start tasks and never reaches the CPU.
#[interrupt]
fn TIMER2() {
    if !NrfTimer::take_event(pac::TIMER2, CompareChannel::Cc0) {
        return;
    }

    critical_section::with(|cs| {
        if let Some(sequencer) = SEQUENCER.borrow_ref_mut(cs).as_mut() {
            sequencer.on_event(TimerEvent::Transition);
        }
    });
}
