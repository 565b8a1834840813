//! Control task
//!
//! Applies operator commands to the parameter store and runs start/stop
//! on the sequencer. Parameter changes never take the sequencer lock; the
//! sequencer picks them up at its next transition.

use defmt::*;
use multistim_core::command::{apply, Applied, Command};

use crate::channels::COMMAND_CHANNEL;
use crate::config::LIMITS;
use crate::hw::gpiote::GpioteOutput;
use crate::sequencer::{task_context, with_sequencer, PARAMS};

/// Stimulation outputs, forced low after a stop
pub struct Outputs {
    pub primary: GpioteOutput,
    pub secondary: Option<GpioteOutput>,
}

impl Outputs {
    fn force_low(&self) {
        self.primary.force_low();
        if let Some(secondary) = &self.secondary {
            secondary.force_low();
        }
    }
}

#[embassy_executor::task]
pub async fn control_task(outputs: Outputs) {
    info!("Control task started");

    loop {
        let command = COMMAND_CHANNEL.receive().await;
        debug!("Command: {:?}", command);
        handle(command, &outputs);
    }
}

fn handle(command: Command, outputs: &Outputs) {
    match apply(&PARAMS, &LIMITS, command) {
        Ok(Applied::Start) => start(),
        Ok(Applied::Stop) => {
            match with_sequencer(|s| s.stop()) {
                Some(Ok(())) => info!("Sequencer stopped"),
                Some(Err(e)) => warn!("Stopped, but clearing outputs failed: {:?}", e),
                None => warn!("Stop before sequencer installed"),
            }
            outputs.force_low();
        }
        Ok(Applied::PulseWidthLoweredFrequency {
            pulse_width_units,
            frequency_hz,
        }) => {
            warn!(
                "Pulse width {} units: frequency lowered to {} Hz",
                pulse_width_units, frequency_hz
            );
        }
        Ok(applied) => info!("Applied {:?}", applied),
        Err(e) => warn!("Command rejected: {:?}", e),
    }
}

fn start() {
    let cx = task_context();
    match with_sequencer(|s| s.start(&cx)) {
        Some(Ok(())) => info!(
            "Sequencer running: {} Hz, {} units, {} pulses",
            PARAMS.frequency_hz(),
            PARAMS.pulse_width_units(),
            PARAMS.pulse_count()
        ),
        Some(Err(e)) => warn!("Start failed, sequencer stays stopped: {:?}", e),
        None => warn!("Start before sequencer installed"),
    }
}
