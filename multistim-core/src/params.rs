//! Parameter store
//!
//! Live sequencer configuration shared between the command task and the
//! state timer interrupt. Two disciplines, one per kind of data:
//!
//! - Scalars (frequency, pulse width) are atomics. A writer stores the value
//!   and then raises `update_pending`; the transition handler consumes the
//!   flag with a single compare-and-swap.
//! - The pattern and amplitude tables and `pulse_count` live behind a
//!   critical-section mutex. A bulk update replaces a whole table (and, for
//!   patterns, the pulse count) without the interrupt ever seeing a mix of
//!   old and new entries.

use core::cell::RefCell;

use critical_section::Mutex;
use portable_atomic::{AtomicBool, AtomicU32, Ordering};

use crate::config::{ParameterDefaults, SequencerSettings, MAX_PULSES};
use crate::timing::Timing;

/// Multiplexer pattern with every channel open
pub const PATTERN_OFF: u16 = 0;

/// Downstream values for one sub-pulse
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PulseOutput {
    /// Multiplexer channel bitmask
    pub pattern: u16,
    /// DAC code
    pub amplitude: u16,
}

impl PulseOutput {
    /// Output driven during the pause and after stop
    pub const OFF: Self = Self {
        pattern: PATTERN_OFF,
        amplitude: 0,
    };
}

/// Per-pulse tables, always updated as a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PulseTables {
    patterns: [u16; MAX_PULSES],
    amplitudes: [u16; MAX_PULSES],
    pulse_count: u8,
}

/// Number of pulses a pattern table describes
///
/// Index of the last non-zero entry plus one, or 1 for an all-zero table.
/// Zero entries before the last active one still occupy a pulse slot.
pub const fn derive_pulse_count(patterns: &[u16; MAX_PULSES]) -> u8 {
    let mut count = 0;
    let mut i = 0;
    while i < MAX_PULSES {
        if patterns[i] != 0 {
            count = i + 1;
        }
        i += 1;
    }
    if count == 0 {
        1
    } else {
        count as u8
    }
}

const fn clamp_table(values: &[u16; MAX_PULSES], max: u16) -> [u16; MAX_PULSES] {
    let mut out = [0; MAX_PULSES];
    let mut i = 0;
    while i < MAX_PULSES {
        out[i] = if values[i] > max { max } else { values[i] };
        i += 1;
    }
    out
}

/// Copy up to [`MAX_PULSES`] values, zero-filling the rest
fn padded(values: &[u16]) -> [u16; MAX_PULSES] {
    let mut table = [0; MAX_PULSES];
    let n = values.len().min(MAX_PULSES);
    table[..n].copy_from_slice(&values[..n]);
    table
}

/// Live sequencer parameters
pub struct ParameterStore {
    frequency_hz: AtomicU32,
    pulse_width_units: AtomicU32,
    update_pending: AtomicBool,
    tables: Mutex<RefCell<PulseTables>>,
    timing: Timing,
    amplitude_max: u16,
}

impl ParameterStore {
    /// Create a store holding `defaults`
    ///
    /// `const` so the firmware can place the store in a `static`.
    pub const fn new(settings: &SequencerSettings, defaults: &ParameterDefaults) -> Self {
        Self {
            frequency_hz: AtomicU32::new(defaults.frequency_hz),
            pulse_width_units: AtomicU32::new(defaults.pulse_width_units),
            update_pending: AtomicBool::new(false),
            tables: Mutex::new(RefCell::new(PulseTables {
                patterns: defaults.patterns,
                amplitudes: clamp_table(&defaults.amplitudes, settings.amplitude_max),
                pulse_count: derive_pulse_count(&defaults.patterns),
            })),
            timing: Timing::new(settings),
            amplitude_max: settings.amplitude_max,
        }
    }

    /// Replace every parameter with `defaults`
    pub fn load_defaults(&self, defaults: &ParameterDefaults) {
        self.set_pattern_table(&defaults.patterns);
        self.set_amplitude_table(&defaults.amplitudes);
        self.frequency_hz.store(defaults.frequency_hz, Ordering::Relaxed);
        self.set_pulse_width(defaults.pulse_width_units);
    }

    // ------------------------------------------------------------------
    // Scalars
    // ------------------------------------------------------------------

    /// Set the burst frequency
    ///
    /// The new period applies from the next phase the sequencer arms.
    pub fn set_frequency(&self, hz: u32) {
        self.frequency_hz.store(hz, Ordering::Relaxed);
        self.update_pending.store(true, Ordering::Release);
    }

    /// Set the pulse width
    ///
    /// The pulse timer picks it up at the next transition.
    pub fn set_pulse_width(&self, units: u32) {
        self.pulse_width_units.store(units, Ordering::Relaxed);
        self.update_pending.store(true, Ordering::Release);
    }

    pub fn frequency_hz(&self) -> u32 {
        self.frequency_hz.load(Ordering::Relaxed)
    }

    pub fn pulse_width_units(&self) -> u32 {
        self.pulse_width_units.load(Ordering::Relaxed)
    }

    /// Consume the update flag
    ///
    /// Returns `true` at most once per raise. An update that lands after the
    /// swap raises the flag again and is seen at the following transition.
    pub fn take_update(&self) -> bool {
        self.update_pending
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Relaxed)
            .is_ok()
    }

    /// Whether a scalar update is waiting to be consumed
    pub fn update_pending(&self) -> bool {
        self.update_pending.load(Ordering::Acquire)
    }

    // ------------------------------------------------------------------
    // Tables
    // ------------------------------------------------------------------

    /// Replace the pattern table and resize the cycle
    ///
    /// Entries past `values.len()` become zero; values past [`MAX_PULSES`]
    /// are ignored. Returns the new pulse count.
    pub fn set_pattern_table(&self, values: &[u16]) -> u8 {
        let patterns = padded(values);
        let pulse_count = derive_pulse_count(&patterns);
        critical_section::with(|cs| {
            let mut tables = self.tables.borrow_ref_mut(cs);
            tables.patterns = patterns;
            tables.pulse_count = pulse_count;
        });
        pulse_count
    }

    /// Replace the amplitude table
    ///
    /// Values are clamped to the DAC range. The pulse count is untouched.
    pub fn set_amplitude_table(&self, values: &[u16]) {
        let amplitudes = clamp_table(&padded(values), self.amplitude_max);
        critical_section::with(|cs| {
            self.tables.borrow_ref_mut(cs).amplitudes = amplitudes;
        });
    }

    /// Override the pulse count without touching the tables
    ///
    /// Ignored unless `count` is in `1..=MAX_PULSES`.
    pub fn set_pulse_count(&self, count: u8) -> bool {
        if count == 0 || count as usize > MAX_PULSES {
            return false;
        }
        critical_section::with(|cs| {
            self.tables.borrow_ref_mut(cs).pulse_count = count;
        });
        true
    }

    pub fn pulse_count(&self) -> u8 {
        critical_section::with(|cs| self.tables.borrow_ref(cs).pulse_count)
    }

    /// Pattern of pulse `index`, 0 outside the table
    pub fn pattern(&self, index: usize) -> u16 {
        critical_section::with(|cs| {
            self.tables
                .borrow_ref(cs)
                .patterns
                .get(index)
                .copied()
                .unwrap_or(PATTERN_OFF)
        })
    }

    /// Amplitude of pulse `index`, 0 outside the table
    pub fn amplitude(&self, index: usize) -> u16 {
        critical_section::with(|cs| {
            self.tables
                .borrow_ref(cs)
                .amplitudes
                .get(index)
                .copied()
                .unwrap_or(0)
        })
    }

    /// Pattern and amplitude of pulse `index`, read together
    pub fn output_for(&self, index: usize) -> PulseOutput {
        critical_section::with(|cs| {
            let tables = self.tables.borrow_ref(cs);
            match (tables.patterns.get(index), tables.amplitudes.get(index)) {
                (Some(&pattern), Some(&amplitude)) => PulseOutput { pattern, amplitude },
                _ => PulseOutput::OFF,
            }
        })
    }

    // ------------------------------------------------------------------
    // Derived timing
    // ------------------------------------------------------------------

    pub fn timing(&self) -> &Timing {
        &self.timing
    }

    pub fn single_pulse_us(&self) -> u32 {
        self.timing.single_pulse_us(self.pulse_width_units())
    }

    pub fn active_time_us(&self) -> u32 {
        self.timing
            .active_time_us(self.pulse_width_units(), self.pulse_count())
    }

    pub fn pause_us(&self) -> u32 {
        self.timing.pause_us(
            self.pulse_width_units(),
            self.pulse_count(),
            self.frequency_hz(),
        )
    }

    /// Frequency limit for the current width and pulse count
    pub fn max_frequency_hz(&self) -> u32 {
        self.timing
            .max_frequency_hz(self.pulse_width_units(), self.pulse_count())
    }

    /// Frequency limit if the width were `units`
    pub fn max_frequency_for_width(&self, units: u32) -> u32 {
        self.timing.max_frequency_hz(units, self.pulse_count())
    }
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self::new(&SequencerSettings::new(), &ParameterDefaults::new())
    }
}
