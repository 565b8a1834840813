//! Pulse sequencer state machine
//!
//! Two timers cooperate:
//!
//! - The pulse timer shapes each sub-pulse. Its compare events drive the
//!   stimulation outputs through the fabric; the CPU only enables, clears
//!   and reprograms it.
//! - The state timer marks phase boundaries. Compare 0 is the transition,
//!   compare 1 fires the advance time earlier. Compare 1 is also routed to
//!   the start tasks of both transfer slots, so whatever was prepared for the
//!   upcoming phase goes out with no CPU involvement.
//!
//! ```text
//!  state timer   |<------------ single_pulse_us ------------>|
//!                                              CC1 (preload) CC0 (transition)
//!  pulse timer   __|‾‾‾‾‾‾‾‾‾‾‾‾‾|_______________________________|‾‾‾‾
//!                 CC0           CC1
//! ```
//!
//! Every transition re-arms the state timer for the phase just entered and
//! immediately prepares both slots with the values of the phase after it.

use multistim_hal::{CompareChannel, CompareTimer, OutputPin};

use crate::config::SequencerSettings;
use crate::params::{ParameterStore, PulseOutput};
use crate::timing::{to_ticks, PhaseCompare, PulseTimerLayout};
use crate::traits::{SlotError, TaskContext, TransferSlot};

use super::state::{Phase, SequencerState, TimerEvent};

/// Peripherals owned by the sequencer
pub struct SequencerHardware<PT, ST, M, D, I> {
    /// Shapes the output pulses
    pub pulse_timer: PT,
    /// Marks phase boundaries and preload points
    pub state_timer: ST,
    /// Multiplexer pattern transfers
    pub pattern_slot: M,
    /// DAC amplitude transfers
    pub amplitude_slot: D,
    /// High while a burst is being emitted
    pub indicator: I,
}

/// Dual-timer pulse sequencer
///
/// `&mut self` on every method means the interrupt handler and task code
/// never run sequencer logic at the same time; the firmware keeps the
/// sequencer inside a critical-section mutex and calls [`Self::on_event`]
/// from the state timer interrupt.
pub struct PulseSequencer<'a, PT, ST, M, D, I> {
    params: &'a ParameterStore,
    hw: SequencerHardware<PT, ST, M, D, I>,
    state: SequencerState,
    advance_time_us: u32,
    lead_ticks: u32,
    preload_misses: u32,
}

impl<'a, PT, ST, M, D, I> PulseSequencer<'a, PT, ST, M, D, I>
where
    PT: CompareTimer,
    ST: CompareTimer,
    M: TransferSlot,
    D: TransferSlot,
    I: OutputPin,
{
    /// Take ownership of the hardware and park it
    ///
    /// The pulse timer is programmed for the current width; both timers are
    /// left disabled until [`Self::start`].
    pub fn new(
        params: &'a ParameterStore,
        settings: &SequencerSettings,
        hardware: SequencerHardware<PT, ST, M, D, I>,
    ) -> Self {
        let mut sequencer = Self {
            params,
            hw: hardware,
            state: SequencerState::new(),
            advance_time_us: settings.advance_time_us,
            lead_ticks: settings.pulse_lead_ticks,
            preload_misses: 0,
        };
        sequencer.hw.state_timer.disable();
        sequencer.hw.indicator.set_low();
        sequencer.program_pulse_timer(params.pulse_width_units());
        sequencer
    }

    // ------------------------------------------------------------------
    // Control
    // ------------------------------------------------------------------

    /// Begin emitting bursts from pulse 0
    ///
    /// No-op when already running. Blocks until the first pulse's pattern
    /// and amplitude have been written. If either write fails the sequencer
    /// stays stopped.
    pub fn start(&mut self, cx: &TaskContext) -> Result<(), SlotError> {
        if self.state.running {
            return Ok(());
        }

        if self.params.take_update() {
            self.program_pulse_timer(self.params.pulse_width_units());
        }

        self.state.running = true;
        self.state.enter(Phase::Pulse, 0);
        self.hw.indicator.set_high();

        let first = self.params.output_for(0);
        self.hw.pattern_slot.abort();
        self.hw.amplitude_slot.abort();
        let written = self
            .hw
            .pattern_slot
            .write(first.pattern)
            .and(self.hw.amplitude_slot.write(first.amplitude));
        self.hw.pattern_slot.wait_ready(cx);
        self.hw.amplitude_slot.wait_ready(cx);
        if let Err(err) = written {
            self.state.park();
            self.hw.pattern_slot.abort();
            self.hw.amplitude_slot.abort();
            self.hw.indicator.set_low();
            return Err(err);
        }

        self.hw.pulse_timer.clear();
        self.hw.pulse_timer.enable();
        let single_pulse_us = self.params.single_pulse_us();
        self.arm_state_timer(single_pulse_us);
        Ok(())
    }

    /// Halt immediately and drive every output off
    ///
    /// Safe at any point of the cycle. Timers stop before the state is
    /// parked, so a compare event latched before the call finds the
    /// sequencer stopped and is dropped. The state is parked even when an
    /// off-value write fails; the first failure is returned.
    pub fn stop(&mut self) -> Result<(), SlotError> {
        self.hw.pulse_timer.disable();
        self.hw.state_timer.disable();
        self.state.park();

        self.hw.pattern_slot.abort();
        self.hw.amplitude_slot.abort();
        let off = PulseOutput::OFF;
        let written = self
            .hw
            .pattern_slot
            .write(off.pattern)
            .and(self.hw.amplitude_slot.write(off.amplitude));
        self.hw.indicator.set_low();
        written
    }

    // ------------------------------------------------------------------
    // Interrupt entry
    // ------------------------------------------------------------------

    /// Handle a state timer compare event
    ///
    /// Never blocks. Events arriving while stopped are ignored. The preload
    /// compare needs no CPU work: the fabric starts the frames armed at the
    /// transition, and anything prepared after that compare could only go
    /// out a phase late.
    pub fn on_event(&mut self, event: TimerEvent) {
        if !self.state.running {
            return;
        }
        match event {
            TimerEvent::Preload => {}
            TimerEvent::Transition => self.on_transition(),
        }
    }

    fn on_transition(&mut self) {
        self.state.transition_count = self.state.transition_count.wrapping_add(1);

        // Flag first, then the width: an update landing in between raises the
        // flag again and is applied at the next transition.
        let reprogram = self.params.take_update();
        let width = self.params.pulse_width_units();
        if reprogram {
            self.program_pulse_timer(width);
            if self.state.phase == Phase::Pulse {
                self.hw.pulse_timer.enable();
            }
        }

        let timing = *self.params.timing();
        let pulse_count = self.params.pulse_count();
        let single_pulse_us = timing.single_pulse_us(width);

        match self.state.phase {
            Phase::Pulse if self.state.pulse_index + 1 < pulse_count => {
                self.state.pulse_index += 1;
                self.hw.pulse_timer.clear();
                self.arm_state_timer(single_pulse_us);
            }
            Phase::Pulse => {
                self.hw.pulse_timer.disable();
                self.hw.indicator.set_low();
                self.state.enter(Phase::Pause, 0);
                let pause_us = timing.pause_us(width, pulse_count, self.params.frequency_hz());
                self.arm_state_timer(pause_us);
            }
            Phase::Pause => {
                self.hw.pulse_timer.clear();
                self.hw.pulse_timer.enable();
                self.hw.indicator.set_high();
                self.state.enter(Phase::Pulse, 0);
                self.arm_state_timer(single_pulse_us);
            }
        }
    }

    // ------------------------------------------------------------------
    // Hardware programming
    // ------------------------------------------------------------------

    /// Stop, clear and reprogram the pulse timer; leaves it disabled
    fn program_pulse_timer(&mut self, width_units: u32) {
        let timer = &mut self.hw.pulse_timer;
        timer.disable();
        timer.clear();
        let pulse_us = self.params.timing().pulse_us(width_units);
        let layout = PulseTimerLayout::new(
            to_ticks(timer.base_frequency_hz(), pulse_us),
            self.lead_ticks,
        );
        for (channel, ticks, auto_clear) in layout.compares() {
            timer.configure(channel, ticks, auto_clear);
        }
    }

    /// Run the state timer for one phase and arm the phase after it
    fn arm_state_timer(&mut self, phase_us: u32) {
        let timer = &mut self.hw.state_timer;
        timer.disable();
        timer.clear();
        let base = timer.base_frequency_hz();
        let compare = PhaseCompare::new(
            to_ticks(base, phase_us),
            to_ticks(base, self.advance_time_us),
        );
        timer.configure(CompareChannel::Cc0, compare.transition, false);
        timer.configure(CompareChannel::Cc1, compare.preload, false);
        self.preload_upcoming();
        self.hw.state_timer.enable();
    }

    fn preload_upcoming(&mut self) {
        let next = self.upcoming_output();
        let pattern = self.hw.pattern_slot.prepare(next.pattern);
        let amplitude = self.hw.amplitude_slot.prepare(next.amplitude);
        if pattern.and(amplitude).is_err() {
            self.preload_misses = self.preload_misses.wrapping_add(1);
        }
    }

    /// Outputs for the phase after the current one
    fn upcoming_output(&self) -> PulseOutput {
        match self.state.phase {
            Phase::Pulse => {
                let next = self.state.pulse_index + 1;
                if next < self.params.pulse_count() {
                    self.params.output_for(next as usize)
                } else {
                    PulseOutput::OFF
                }
            }
            Phase::Pause => self.params.output_for(0),
        }
    }

    // ------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------

    pub fn is_running(&self) -> bool {
        self.state.running
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn pulse_index(&self) -> u8 {
        self.state.pulse_index
    }

    pub fn transition_count(&self) -> u64 {
        self.state.transition_count
    }

    /// Preloads that could not be armed in time
    pub fn preload_misses(&self) -> u32 {
        self.preload_misses
    }

    /// Copy of the current position
    pub fn state(&self) -> SequencerState {
        self.state
    }

    pub fn params(&self) -> &'a ParameterStore {
        self.params
    }

    pub fn hardware(&self) -> &SequencerHardware<PT, ST, M, D, I> {
        &self.hw
    }
}
