//! Tick conversion and pulse train timing
//!
//! All durations are microseconds. A cycle is a burst of `pulse_count`
//! sub-pulses followed by a pause:
//!
//! ```text
//! |<-------------------- total_period_us -------------------->|
//! |<- single ->|<- single ->| ... |<- single ->|<- pause_us -->|
//! |<---------------- active_time_us --------->|
//! ```
//!
//! `single_pulse_us` is the pulse itself plus a fixed per-pulse overhead.
//! With the second output routed it covers both pulses, which run back to
//! back.
//! When the burst is longer than the period the pause collapses to zero and
//! bursts run back to back.

use multistim_hal::CompareChannel;

use crate::config::SequencerSettings;

/// Microseconds per second
pub const US_PER_SECOND: u32 = 1_000_000;

/// Shortest phase the state timer is programmed for
///
/// A compare value of zero never matches after the counter is cleared, and
/// the preload compare needs a tick of its own before the transition.
pub const MIN_PHASE_TICKS: u32 = 2;

/// Convert a duration to timer ticks
///
/// Truncates toward zero. The caller keeps `duration_us * base_frequency_hz /
/// 1e6` within 32 bits.
pub const fn to_ticks(base_frequency_hz: u32, duration_us: u32) -> u32 {
    ((duration_us as u64 * base_frequency_hz as u64) / US_PER_SECOND as u64) as u32
}

/// Timing formulas for one board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Timing {
    quantum_us: u32,
    overhead_us: u32,
    min_pause_us: u32,
    outputs: u32,
}

impl Timing {
    pub const fn new(settings: &SequencerSettings) -> Self {
        Self {
            quantum_us: settings.pulse_width_quantum_us,
            overhead_us: settings.pulse_overhead_us,
            min_pause_us: settings.min_pause_us,
            outputs: if settings.second_output { 2 } else { 1 },
        }
    }

    /// Width of the output pulse
    pub const fn pulse_us(&self, pulse_width_units: u32) -> u32 {
        pulse_width_units.saturating_mul(self.quantum_us)
    }

    /// Slot occupied by one sub-pulse, overhead included
    pub const fn single_pulse_us(&self, pulse_width_units: u32) -> u32 {
        self.pulse_us(pulse_width_units)
            .saturating_mul(self.outputs)
            .saturating_add(self.overhead_us)
    }

    /// Duration of a whole burst
    pub const fn active_time_us(&self, pulse_width_units: u32, pulse_count: u8) -> u32 {
        self.single_pulse_us(pulse_width_units)
            .saturating_mul(pulse_count as u32)
    }

    /// Cycle period; a frequency of zero is treated as 1 Hz
    pub const fn total_period_us(&self, frequency_hz: u32) -> u32 {
        let hz = if frequency_hz == 0 { 1 } else { frequency_hz };
        US_PER_SECOND / hz
    }

    /// Pause after the burst, zero when the burst fills the period
    pub const fn pause_us(&self, pulse_width_units: u32, pulse_count: u8, frequency_hz: u32) -> u32 {
        self.total_period_us(frequency_hz)
            .saturating_sub(self.active_time_us(pulse_width_units, pulse_count))
    }

    /// Highest frequency that still leaves `min_pause_us` between bursts
    pub const fn max_frequency_hz(&self, pulse_width_units: u32, pulse_count: u8) -> u32 {
        let cycle = self
            .active_time_us(pulse_width_units, pulse_count)
            .saturating_add(self.min_pause_us);
        if cycle == 0 {
            US_PER_SECOND
        } else {
            US_PER_SECOND / cycle
        }
    }
}

impl Default for Timing {
    fn default() -> Self {
        Self::new(&SequencerSettings::new())
    }
}

/// State timer compare values for one phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PhaseCompare {
    /// Ticks until the phase ends
    pub transition: u32,
    /// Ticks until the next phase's outputs are armed
    pub preload: u32,
}

impl PhaseCompare {
    /// Place the preload `advance_ticks` before the transition
    ///
    /// Phases no longer than the advance put the preload halfway instead, so
    /// it always lands in `1..transition`.
    pub const fn new(phase_ticks: u32, advance_ticks: u32) -> Self {
        let transition = if phase_ticks < MIN_PHASE_TICKS {
            MIN_PHASE_TICKS
        } else {
            phase_ticks
        };
        let advance = if advance_ticks == 0 { 1 } else { advance_ticks };
        let preload = if transition > advance {
            transition - advance
        } else {
            transition / 2
        };
        Self {
            transition,
            preload,
        }
    }
}

/// Compare programme of the pulse timer
///
/// The timer restarts every `period` ticks. Output 1 is high from
/// `primary_on` to `primary_off`; output 2, when routed, from `secondary_on`
/// to `secondary_off`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PulseTimerLayout {
    pub primary_on: u32,
    pub primary_off: u32,
    pub secondary_on: u32,
    pub secondary_off: u32,
    pub period: u32,
}

impl PulseTimerLayout {
    pub const fn new(pulse_ticks: u32, lead_ticks: u32) -> Self {
        let primary_on = lead_ticks;
        let primary_off = pulse_ticks.saturating_add(lead_ticks);
        let secondary_on = primary_off.saturating_add(lead_ticks);
        let secondary_off = secondary_on.saturating_add(pulse_ticks);
        Self {
            primary_on,
            primary_off,
            secondary_on,
            secondary_off,
            period: secondary_off.saturating_add(lead_ticks),
        }
    }

    /// Last output edge, counting the second output only when it is routed
    pub const fn last_edge(&self, second_output: bool) -> u32 {
        if second_output {
            self.secondary_off
        } else {
            self.primary_off
        }
    }

    /// Channel, value and auto-clear flag for every compare in use
    pub const fn compares(&self) -> [(CompareChannel, u32, bool); 5] {
        [
            (CompareChannel::Cc0, self.primary_on, false),
            (CompareChannel::Cc1, self.primary_off, false),
            (CompareChannel::Cc2, self.secondary_on, false),
            (CompareChannel::Cc3, self.secondary_off, false),
            (CompareChannel::Cc5, self.period, true),
        ]
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use proptest::prelude::*;

    const BASE_HZ: u32 = 16_000_000;

    #[test]
    fn test_to_ticks_truncates() {
        assert_eq!(to_ticks(BASE_HZ, 600), 9_600);
        assert_eq!(to_ticks(BASE_HZ, 50), 800);
        assert_eq!(to_ticks(32_768, 100), 3);
        assert_eq!(to_ticks(BASE_HZ, 0), 0);
    }

    #[test]
    fn test_to_ticks_long_phase() {
        // one second at 16 MHz would overflow a u32 product
        assert_eq!(to_ticks(BASE_HZ, 1_000_000), 16_000_000);
    }

    #[test]
    fn test_sixteen_pulse_burst_at_10hz() {
        let timing = Timing::default();
        assert_eq!(timing.pulse_us(5), 500);
        assert_eq!(timing.single_pulse_us(5), 600);
        assert_eq!(timing.active_time_us(5, 16), 9_600);
        assert_eq!(timing.total_period_us(10), 100_000);
        assert_eq!(timing.pause_us(5, 16, 10), 90_400);
    }

    #[test]
    fn test_pause_collapses_when_burst_fills_period() {
        let timing = Timing::default();
        // 9.6 ms burst, 5 ms period
        assert_eq!(timing.pause_us(5, 16, 200), 0);
    }

    #[test]
    fn test_max_frequency() {
        let timing = Timing::default();
        // 9600 + 100 us
        assert_eq!(timing.max_frequency_hz(5, 16), 103);
        assert_eq!(timing.max_frequency_hz(1, 1), 3_333);
    }

    #[test]
    fn test_zero_frequency_reads_as_one_hz() {
        assert_eq!(Timing::default().total_period_us(0), US_PER_SECOND);
    }

    #[test]
    fn test_preload_uses_advance() {
        let phase = PhaseCompare::new(9_600, 800);
        assert_eq!(phase.transition, 9_600);
        assert_eq!(phase.preload, 8_800);
    }

    #[test]
    fn test_short_phase_preloads_halfway() {
        let phase = PhaseCompare::new(600, 800);
        assert_eq!(phase.preload, 300);

        let phase = PhaseCompare::new(800, 800);
        assert_eq!(phase.preload, 400);
    }

    #[test]
    fn test_empty_phase_is_floored() {
        let phase = PhaseCompare::new(0, 800);
        assert_eq!(phase.transition, MIN_PHASE_TICKS);
        assert_eq!(phase.preload, 1);
    }

    #[test]
    fn test_pulse_layout() {
        let layout = PulseTimerLayout::new(8_000, 10);
        assert_eq!(layout.primary_on, 10);
        assert_eq!(layout.primary_off, 8_010);
        assert_eq!(layout.secondary_on, 8_020);
        assert_eq!(layout.secondary_off, 16_020);
        assert_eq!(layout.period, 16_030);

        let compares = layout.compares();
        assert_eq!(compares[4], (CompareChannel::Cc5, 16_030, true));
        assert!(compares[..4].iter().all(|(_, _, clear)| !clear));
    }

    #[test]
    fn test_second_output_doubles_sub_pulse() {
        let settings = SequencerSettings {
            second_output: true,
            ..SequencerSettings::new()
        };
        let timing = Timing::new(&settings);
        assert_eq!(timing.single_pulse_us(5), 1_100);
        assert_eq!(timing.active_time_us(5, 16), 17_600);
        // 17.6 ms + 0.1 ms
        assert_eq!(timing.max_frequency_hz(5, 16), 56);
    }

    #[test]
    fn test_state_timer_outlasts_every_routed_edge() {
        for second_output in [false, true] {
            let settings = SequencerSettings {
                second_output,
                ..SequencerSettings::new()
            };
            let timing = Timing::new(&settings);
            for width in 1..=10 {
                let layout = PulseTimerLayout::new(
                    to_ticks(BASE_HZ, timing.pulse_us(width)),
                    settings.pulse_lead_ticks,
                );
                let transition = to_ticks(BASE_HZ, timing.single_pulse_us(width));
                assert!(
                    layout.last_edge(second_output) < transition,
                    "width {} dual {}: edge {} transition {}",
                    width,
                    second_output,
                    layout.last_edge(second_output),
                    transition
                );
            }
        }
    }

    proptest! {
        #[test]
        fn prop_burst_and_pause_fill_period(
            width in 1u32..=100,
            count in 1u8..=16,
            freq in 1u32..=2_000,
        ) {
            let timing = Timing::default();
            let active = timing.active_time_us(width, count);
            let total = timing.total_period_us(freq);
            let pause = timing.pause_us(width, count, freq);
            if active < total {
                prop_assert_eq!(active + pause, total);
            } else {
                prop_assert_eq!(pause, 0);
            }
        }

        #[test]
        fn prop_max_frequency_leaves_min_pause(width in 1u32..=100, count in 1u8..=16) {
            let timing = Timing::default();
            let max = timing.max_frequency_hz(width, count);
            prop_assume!(max > 0);
            prop_assert!(timing.pause_us(width, count, max) >= 100);
        }

        #[test]
        fn prop_preload_inside_phase(phase in 0u32..=20_000_000, advance in 0u32..=20_000) {
            let compare = PhaseCompare::new(phase, advance);
            prop_assert!(compare.preload >= 1);
            prop_assert!(compare.preload < compare.transition);
        }
    }
}
