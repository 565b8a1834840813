//! TIMER peripheral as a compare timer
//!
//! 32-bit timer mode, prescaler 0 (16 MHz). Only TIMER3 and TIMER4 have
//! the six compare channels the pulse timer layout uses.

use embassy_nrf::pac::timer::vals::{Bitmode, Mode};
use embassy_nrf::pac::timer::Timer;
use multistim_hal::{CompareChannel, CompareTimer, EventHandle};

/// Timer clock with prescaler 0
pub const TIMER_BASE_HZ: u32 = 16_000_000;

pub struct NrfTimer {
    regs: Timer,
}

impl NrfTimer {
    /// Stop the timer and put it in 32-bit timer mode at 16 MHz
    pub fn new(regs: Timer) -> Self {
        regs.tasks_stop().write_value(1);
        regs.mode().write(|w| w.set_mode(Mode::TIMER));
        regs.bitmode().write(|w| w.set_bitmode(Bitmode::_32BIT));
        regs.prescaler().write(|w| w.set_prescaler(0));
        regs.shorts().write(|_| {});
        regs.intenclr().write(|w| {
            for channel in CompareChannel::ALL {
                w.set_compare(channel.index(), true);
            }
        });
        regs.tasks_clear().write_value(1);
        Self { regs }
    }

    /// Raise the timer interrupt on `channels`
    pub fn listen(&mut self, channels: &[CompareChannel]) {
        for channel in channels {
            self.regs.events_compare(channel.index()).write_value(0);
            self.regs
                .intenset()
                .write(|w| w.set_compare(channel.index(), true));
        }
    }

    /// Consume a latched compare event
    pub fn take_event(regs: Timer, channel: CompareChannel) -> bool {
        let event = regs.events_compare(channel.index());
        if event.read() == 0 {
            return false;
        }
        event.write_value(0);
        true
    }
}

impl CompareTimer for NrfTimer {
    fn base_frequency_hz(&self) -> u32 {
        TIMER_BASE_HZ
    }

    fn configure(&mut self, channel: CompareChannel, ticks: u32, auto_clear: bool) {
        let n = channel.index();
        self.regs.cc(n).write_value(ticks);
        self.regs.shorts().modify(|w| w.set_compare_clear(n, auto_clear));
    }

    fn enable(&mut self) {
        self.regs.tasks_start().write_value(1);
    }

    fn disable(&mut self) {
        self.regs.tasks_stop().write_value(1);
    }

    fn clear(&mut self) {
        self.regs.tasks_clear().write_value(1);
    }

    fn compare_event(&self, channel: CompareChannel) -> EventHandle {
        EventHandle(self.regs.events_compare(channel.index()).as_ptr() as u32)
    }
}
