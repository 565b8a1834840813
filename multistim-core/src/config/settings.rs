//! Sequencer settings
//!
//! Fixed per board; the firmware generates them from its TOML file at build
//! time. Durations are in microseconds.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::timing::to_ticks;

/// Maximum sub-pulses per cycle (size of the pattern and amplitude tables)
pub const MAX_PULSES: usize = 16;

/// Full scale of a 12-bit DAC
pub const DAC_MAX_12BIT: u16 = 4095;

/// Timing and output shape of the pulse train
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SequencerSettings {
    /// Duration of one pulse width unit
    pub pulse_width_quantum_us: u32,
    /// Fixed cost added to every sub-pulse (settling, lead and gap)
    pub pulse_overhead_us: u32,
    /// Shortest pause the frequency limit leaves between bursts
    pub min_pause_us: u32,
    /// How far ahead of a transition the downstream transfers are armed
    pub advance_time_us: u32,
    /// Pulse timer ticks before the output edge and between the two outputs
    pub pulse_lead_ticks: u32,
    /// Largest value accepted into the amplitude table
    pub amplitude_max: u16,
    /// Drive the second (complementary) stimulation output
    pub second_output: bool,
}

impl SequencerSettings {
    /// Reference board values
    pub const fn new() -> Self {
        Self {
            pulse_width_quantum_us: 100,
            pulse_overhead_us: 100,
            min_pause_us: 100,
            advance_time_us: 120,
            pulse_lead_ticks: 10,
            amplitude_max: DAC_MAX_12BIT,
            second_output: false,
        }
    }

    /// Reject settings the timing model cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pulse_width_quantum_us == 0 {
            return Err(ConfigError::ZeroQuantum);
        }
        if self.advance_time_us == 0 {
            return Err(ConfigError::ZeroAdvance);
        }
        if self.pulse_lead_ticks == 0 {
            return Err(ConfigError::ZeroLeadTicks);
        }
        if self.amplitude_max == 0 {
            return Err(ConfigError::ZeroAmplitudeRange);
        }
        Ok(())
    }

    /// [`Self::validate`], plus the checks that need the hardware
    ///
    /// `timer_base_hz` clocks the pulse timer. `frame_time_us` is the longest
    /// downstream transfer, which has to finish between the preload and the
    /// transition.
    pub fn validate_for(&self, timer_base_hz: u32, frame_time_us: u32) -> Result<(), ConfigError> {
        self.validate()?;
        if self.advance_time_us < frame_time_us {
            return Err(ConfigError::AdvanceShorterThanTransfer);
        }
        // every routed pulse adds one lead before its off edge
        let outputs = if self.second_output { 2 } else { 1 };
        let lead = self.pulse_lead_ticks.saturating_mul(outputs);
        if lead >= to_ticks(timer_base_hz, self.pulse_overhead_us) {
            return Err(ConfigError::LeadExceedsOverhead);
        }
        Ok(())
    }
}

impl Default for SequencerSettings {
    fn default() -> Self {
        Self::new()
    }
}

/// Ranges accepted by the command layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CommandLimits {
    /// Lowest burst frequency (Hz)
    pub min_frequency_hz: u32,
    /// Highest burst frequency (Hz), before the timing limit is applied
    pub max_frequency_hz: u32,
    /// Narrowest pulse (units)
    pub min_pulse_width_units: u32,
    /// Widest pulse (units)
    pub max_pulse_width_units: u32,
}

impl CommandLimits {
    pub const fn new() -> Self {
        Self {
            min_frequency_hz: 1,
            max_frequency_hz: 100,
            min_pulse_width_units: 1,
            max_pulse_width_units: 10,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_frequency_hz == 0 || self.min_frequency_hz > self.max_frequency_hz {
            return Err(ConfigError::InvalidFrequencyRange);
        }
        if self.min_pulse_width_units == 0 || self.min_pulse_width_units > self.max_pulse_width_units {
            return Err(ConfigError::InvalidPulseWidthRange);
        }
        Ok(())
    }
}

impl Default for CommandLimits {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Pulse width quantum is zero
    ZeroQuantum,
    /// Advance time is zero
    ZeroAdvance,
    /// Pulse timer lead is zero ticks
    ZeroLeadTicks,
    /// Amplitude range is empty
    ZeroAmplitudeRange,
    /// Preload starts too late for the slowest transfer to finish
    AdvanceShorterThanTransfer,
    /// Pulse timer edges run past the end of the sub-pulse
    LeadExceedsOverhead,
    /// Frequency limits are empty or start at zero
    InvalidFrequencyRange,
    /// Pulse width limits are empty or start at zero
    InvalidPulseWidthRange,
    /// A default parameter lies outside the command limits
    DefaultOutOfRange,
}
