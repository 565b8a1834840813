//! nRF52833 peripheral adapters
//!
//! Register-level implementations of the multistim HAL traits. Everything
//! here talks to the PAC directly because the pulse path runs on PPI tasks
//! and events rather than on driver futures.

pub mod gpiote;
pub mod ppi;
pub mod spim;
pub mod timer;
pub mod twim;

use embassy_nrf::pac::gpio::vals::{Dir, Drive, Input, Pull};
use embassy_nrf::pac::shared::regs::Psel;
use embassy_nrf::pac::P0;

/// Board pin map (all on port 0)
pub mod pins {
    /// Stimulation output 1
    pub const OUTPUT_1: u8 = 13;
    /// Stimulation output 2
    pub const OUTPUT_2: u8 = 14;
    /// Multiplexer shift register clock
    pub const MUX_SCK: u8 = 5;
    /// Multiplexer shift register data
    pub const MUX_MOSI: u8 = 3;
    /// Multiplexer latch enable, idles high
    pub const MUX_LE: u8 = 1;
    /// Multiplexer clear, idles low
    pub const MUX_CLR: u8 = 0;
    /// MCP4725 data
    pub const DAC_SDA: u8 = 26;
    /// MCP4725 clock
    pub const DAC_SCL: u8 = 27;
}

/// PSEL value connecting a peripheral signal to a P0 pin
fn psel(pin: u8) -> Psel {
    Psel(u32::from(pin))
}

/// Push-pull output driven to `high`
fn configure_output(pin: u8, high: bool) {
    set_pin(pin, high);
    P0.pin_cnf(pin as usize).write(|w| {
        w.set_dir(Dir::OUTPUT);
        w.set_input(Input::DISCONNECT);
    });
}

/// Open-drain input/output with pull-up, as TWI needs
fn configure_open_drain(pin: u8) {
    P0.pin_cnf(pin as usize).write(|w| {
        w.set_dir(Dir::INPUT);
        w.set_input(Input::CONNECT);
        w.set_pull(Pull::PULLUP);
        w.set_drive(Drive::S0D1);
    });
}

fn set_pin(pin: u8, high: bool) {
    if high {
        P0.outset().write(|w| w.set_pin(pin as usize, true));
    } else {
        P0.outclr().write(|w| w.set_pin(pin as usize, true));
    }
}

/// Drive `pin` low then high again
fn pulse_low(pin: u8) {
    set_pin(pin, false);
    cortex_m::asm::nop();
    set_pin(pin, true);
}

/// Clear the multiplexer shift register once at boot
pub fn reset_mux() {
    configure_output(pins::MUX_LE, true);
    configure_output(pins::MUX_CLR, false);
    set_pin(pins::MUX_CLR, true);
    cortex_m::asm::delay(64);
    set_pin(pins::MUX_CLR, false);
}
