//! Operator commands
//!
//! Range checks that run before a command touches the parameter store.
//! Parsing belongs to whatever transport delivers the commands; this module
//! only sees typed values.

use heapless::Vec;

use crate::config::{CommandLimits, MAX_PULSES};
use crate::params::ParameterStore;

/// Per-pulse values as received from the operator
pub type PulseTable = Vec<u16, MAX_PULSES>;

/// Operator command
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Burst frequency in Hz
    SetFrequency(u32),
    /// Pulse width in units
    SetPulseWidth(u32),
    /// Multiplexer pattern per pulse; resizes the cycle
    SetPatterns(PulseTable),
    /// DAC value per pulse
    SetAmplitudes(PulseTable),
    /// Active pulses per cycle
    SetPulseCount(u8),
    Start,
    Stop,
}

/// What a command changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Applied {
    Frequency(u32),
    PulseWidth(u32),
    /// Width accepted; frequency reduced to keep a pause between bursts
    PulseWidthLoweredFrequency {
        pulse_width_units: u32,
        frequency_hz: u32,
    },
    Patterns {
        pulse_count: u8,
    },
    Amplitudes,
    PulseCount(u8),
    /// Caller starts the sequencer
    Start,
    /// Caller stops the sequencer
    Stop,
}

/// Command rejections
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandError {
    /// Outside the configured frequency range
    FrequencyOutOfRange,
    /// Burst plus minimum pause would not fit in the period
    FrequencyAboveLimit { max_hz: u32 },
    /// Outside the configured pulse width range
    PulseWidthOutOfRange,
    /// Width is in range, but the burst would not fit even at the lowest
    /// frequency
    PulseWidthLeavesNoFrequency { max_hz: u32 },
    /// Not in `1..=MAX_PULSES`
    PulseCountOutOfRange,
}

/// Validate `command` and write it to `params`
///
/// Start and Stop only pass validation; running them needs the sequencer.
pub fn apply(
    params: &ParameterStore,
    limits: &CommandLimits,
    command: Command,
) -> Result<Applied, CommandError> {
    match command {
        Command::SetFrequency(hz) => {
            if !(limits.min_frequency_hz..=limits.max_frequency_hz).contains(&hz) {
                return Err(CommandError::FrequencyOutOfRange);
            }
            let max_hz = params.max_frequency_hz();
            if hz > max_hz {
                return Err(CommandError::FrequencyAboveLimit { max_hz });
            }
            params.set_frequency(hz);
            Ok(Applied::Frequency(hz))
        }
        Command::SetPulseWidth(units) => {
            if !(limits.min_pulse_width_units..=limits.max_pulse_width_units).contains(&units) {
                return Err(CommandError::PulseWidthOutOfRange);
            }
            let max_hz = params.max_frequency_for_width(units);
            if max_hz < limits.min_frequency_hz {
                return Err(CommandError::PulseWidthLeavesNoFrequency { max_hz });
            }
            if params.frequency_hz() > max_hz {
                params.set_frequency(max_hz);
                params.set_pulse_width(units);
                return Ok(Applied::PulseWidthLoweredFrequency {
                    pulse_width_units: units,
                    frequency_hz: max_hz,
                });
            }
            params.set_pulse_width(units);
            Ok(Applied::PulseWidth(units))
        }
        Command::SetPatterns(table) => {
            let pulse_count = params.set_pattern_table(&table);
            Ok(Applied::Patterns { pulse_count })
        }
        Command::SetAmplitudes(table) => {
            params.set_amplitude_table(&table);
            Ok(Applied::Amplitudes)
        }
        Command::SetPulseCount(count) => {
            if params.set_pulse_count(count) {
                Ok(Applied::PulseCount(count))
            } else {
                Err(CommandError::PulseCountOutOfRange)
            }
        }
        Command::Start => Ok(Applied::Start),
        Command::Stop => Ok(Applied::Stop),
    }
}
