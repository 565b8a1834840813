//! GPIOTE task channels for the stimulation outputs
//!
//! Each output pin is owned by one GPIOTE channel in task mode; the pulse
//! timer drives it through SET and CLR tasks, so the edges never wait on
//! the CPU.

use embassy_nrf::pac::gpiote::vals::{Mode, Outinit, Polarity};
use embassy_nrf::pac::GPIOTE;
use multistim_core::sequencer::OutputTasks;
use multistim_hal::TaskHandle;

/// One GPIOTE channel driving a P0 pin
pub struct GpioteOutput {
    channel: usize,
}

impl GpioteOutput {
    /// Hand P0 `pin` to GPIOTE `channel`, starting low
    pub fn new(channel: usize, pin: u8) -> Self {
        GPIOTE.config(channel).write(|w| {
            w.set_mode(Mode::TASK);
            w.set_psel(pin);
            w.set_port(false);
            w.set_polarity(Polarity::TOGGLE);
            w.set_outinit(Outinit::LOW);
        });
        Self { channel }
    }

    /// SET and CLR tasks for the pulse timer to drive
    pub fn tasks(&self) -> OutputTasks {
        OutputTasks {
            set: TaskHandle(GPIOTE.tasks_set(self.channel).as_ptr() as u32),
            clear: TaskHandle(GPIOTE.tasks_clr(self.channel).as_ptr() as u32),
        }
    }

    /// Pull the pin low from software
    pub fn force_low(&self) {
        GPIOTE.tasks_clr(self.channel).write_value(1);
    }
}
