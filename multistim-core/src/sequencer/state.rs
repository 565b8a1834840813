//! Sequencer state and timer events

/// Macro-state of the cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    /// Emitting sub-pulses
    Pulse,
    /// Between bursts
    Pause,
}

/// State timer compare events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerEvent {
    /// Fires the advance time before a transition
    Preload,
    /// Fires at the phase boundary
    Transition,
}

/// Sequencer position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SequencerState {
    /// Current phase
    pub phase: Phase,
    /// Sub-pulse being emitted; 0 during the pause
    pub pulse_index: u8,
    /// Cycle is active
    pub running: bool,
    /// Transitions handled since boot
    pub transition_count: u64,
}

impl SequencerState {
    /// Stopped, parked in the pause
    pub const fn new() -> Self {
        Self {
            phase: Phase::Pause,
            pulse_index: 0,
            running: false,
            transition_count: 0,
        }
    }

    /// Move to `phase` at sub-pulse `pulse_index`
    pub fn enter(&mut self, phase: Phase, pulse_index: u8) {
        self.phase = phase;
        self.pulse_index = pulse_index;
    }

    /// Stopped and parked, keeping the transition count
    pub fn park(&mut self) {
        self.running = false;
        self.enter(Phase::Pause, 0);
    }
}

impl Default for SequencerState {
    fn default() -> Self {
        Self::new()
    }
}
