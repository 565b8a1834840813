//! Boot-time parameter values

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::settings::{CommandLimits, ConfigError, MAX_PULSES};

/// One multiplexer channel per pulse, in order
pub const WALKING_PATTERNS: [u16; MAX_PULSES] = [
    0x0001, 0x0002, 0x0004, 0x0008, 0x0010, 0x0020, 0x0040, 0x0080, 0x0100, 0x0200, 0x0400,
    0x0800, 0x1000, 0x2000, 0x4000, 0x8000,
];

/// Eight pulses, each closing a channel in both banks of the multiplexer
pub const PAIRED_PATTERNS: [u16; 8] = [
    0x0101, 0x0202, 0x0404, 0x0808, 0x1010, 0x2020, 0x4040, 0x8080,
];

/// Linear ramp across the full DAC range
pub const RAMP_AMPLITUDES: [u16; MAX_PULSES] = [
    200, 450, 700, 950, 1200, 1450, 1700, 1950, 2200, 2450, 2700, 2950, 3200, 3450, 3700, 4000,
];

/// Parameters loaded into the store at boot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ParameterDefaults {
    /// Burst frequency (Hz)
    pub frequency_hz: u32,
    /// Pulse width (units)
    pub pulse_width_units: u32,
    /// Per-pulse multiplexer patterns
    pub patterns: [u16; MAX_PULSES],
    /// Per-pulse DAC values
    pub amplitudes: [u16; MAX_PULSES],
}

impl ParameterDefaults {
    pub const fn new() -> Self {
        Self {
            frequency_hz: 1,
            pulse_width_units: 5,
            patterns: WALKING_PATTERNS,
            amplitudes: RAMP_AMPLITUDES,
        }
    }

    /// Check the scalar defaults against the command limits
    pub fn validate(&self, limits: &CommandLimits) -> Result<(), ConfigError> {
        let freq_ok = (limits.min_frequency_hz..=limits.max_frequency_hz).contains(&self.frequency_hz);
        let width_ok = (limits.min_pulse_width_units..=limits.max_pulse_width_units)
            .contains(&self.pulse_width_units);
        if freq_ok && width_ok {
            Ok(())
        } else {
            Err(ConfigError::DefaultOutOfRange)
        }
    }
}

impl Default for ParameterDefaults {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walking_patterns_select_one_channel() {
        for (i, pattern) in WALKING_PATTERNS.iter().enumerate() {
            assert_eq!(*pattern, 1 << i);
        }
    }

    #[test]
    fn test_ramp_is_increasing() {
        assert!(RAMP_AMPLITUDES.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_defaults_within_limits() {
        let limits = CommandLimits::new();
        assert_eq!(ParameterDefaults::new().validate(&limits), Ok(()));

        let wide = ParameterDefaults {
            pulse_width_units: 11,
            ..ParameterDefaults::new()
        };
        assert_eq!(wide.validate(&limits), Err(ConfigError::DefaultOutOfRange));
    }
}
