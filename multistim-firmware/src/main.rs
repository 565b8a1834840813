//! Multistim - Multi-channel Stimulator Firmware
//!
//! Main firmware binary for nRF52833-based stimulators. Emits bursts of
//! sub-pulses, each routed to its own multiplexer channel at its own DAC
//! amplitude, with every edge generated by timers wired through PPI.
//!
//! Peripheral assignment:
//!
//! | Peripheral | Role                                     |
//! |------------|------------------------------------------|
//! | TIMER3     | Pulse timer (six compare channels)       |
//! | TIMER2     | State timer, interrupt-driven            |
//! | GPIOTE 0/1 | Stimulation outputs                      |
//! | PPI        | Edge and preload routing                 |
//! | SPIM3      | Multiplexer shift register               |
//! | TWIM0      | MCP4725 DAC                              |
//! | RTC1       | embassy-time driver                      |

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_nrf::gpio::{Level, Output, OutputDrive};
use embassy_nrf::interrupt::{self, InterruptExt, Priority};
use embassy_nrf::pac;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use multistim_core::command::Command;
use multistim_core::sequencer::{wire_fabric, PulseSequencer, SequencerHardware};
use multistim_drivers::{dac_slot, mux_slot, HalPin, MCP4725_ADDRESS};
use multistim_hal::{CompareChannel, MAX_FRAME_LEN};

mod channels;
mod config;
mod hw;
mod sequencer;
mod tasks;

use crate::channels::COMMAND_CHANNEL;
use crate::config::{DAC_BUS_KHZ, DAC_RESOLUTION_BITS, DEFAULTS, SETTINGS};
use crate::hw::gpiote::GpioteOutput;
use crate::hw::pins;
use crate::hw::ppi::PpiRouter;
use crate::hw::spim::SpimTransport;
use crate::hw::timer::NrfTimer;
use crate::hw::twim::TwimTransport;
use crate::sequencer::PARAMS;

// DMA buffers (must live in RAM for EasyDMA)
static MUX_BUF: StaticCell<[u8; MAX_FRAME_LEN]> = StaticCell::new();
static DAC_BUF: StaticCell<[u8; MAX_FRAME_LEN]> = StaticCell::new();

/// First PPI channel handed to the router
const PPI_FIRST_CHANNEL: u8 = 0;

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Multistim firmware starting...");

    let p = embassy_nrf::init(Default::default());
    info!("Peripherals initialized");

    // Parameters
    PARAMS.load_defaults(&DEFAULTS);
    info!(
        "Defaults: {} Hz, {} units, {} pulses, max {} Hz",
        PARAMS.frequency_hz(),
        PARAMS.pulse_width_units(),
        PARAMS.pulse_count(),
        PARAMS.max_frequency_hz()
    );

    // Downstream peripherals
    hw::reset_mux();
    let pattern_slot = mux_slot(SpimTransport::new(MUX_BUF.init([0; MAX_FRAME_LEN])));
    let amplitude_slot = dac_slot(
        TwimTransport::new(DAC_BUF.init([0; MAX_FRAME_LEN]), MCP4725_ADDRESS, DAC_BUS_KHZ),
        DAC_RESOLUTION_BITS,
    );
    info!("Multiplexer and DAC initialized");

    // Timers and outputs
    let pulse_timer = NrfTimer::new(pac::TIMER3);
    let mut state_timer = NrfTimer::new(pac::TIMER2);
    state_timer.listen(&[CompareChannel::Cc0]);

    let outputs = tasks::Outputs {
        primary: GpioteOutput::new(0, pins::OUTPUT_1),
        secondary: SETTINGS
            .second_output
            .then(|| GpioteOutput::new(1, pins::OUTPUT_2)),
    };
    let indicator = HalPin::new(Output::new(p.P0_15, Level::Low, OutputDrive::Standard));
    let led = HalPin::new(Output::new(p.P0_16, Level::Low, OutputDrive::Standard));

    let hardware = SequencerHardware {
        pulse_timer,
        state_timer,
        pattern_slot,
        amplitude_slot,
        indicator,
    };

    // Fabric
    let mut router = PpiRouter::new(PPI_FIRST_CHANNEL);
    let routes = unwrap!(wire_fabric(
        &mut router,
        &hardware,
        outputs.primary.tasks(),
        outputs.secondary.as_ref().map(GpioteOutput::tasks),
    ));
    info!("PPI wired: {:?}", routes);

    // Sequencer
    sequencer::install(PulseSequencer::new(&PARAMS, &SETTINGS, hardware));
    interrupt::SPIM3.set_priority(Priority::P1);
    interrupt::TIMER2.set_priority(Priority::P1);
    // SAFETY: both handlers only touch state behind the critical section
    unsafe {
        interrupt::SPIM3.enable();
        interrupt::TIMER2.enable();
    }
    info!("Sequencer installed");

    spawner.spawn(tasks::control_task(outputs)).unwrap();
    spawner.spawn(tasks::stats_task()).unwrap();
    spawner.spawn(tasks::heartbeat_task(led)).unwrap();

    COMMAND_CHANNEL.send(Command::Start).await;

    info!("All tasks spawned, firmware running");
}
