//! Compare timer abstractions
//!
//! Both sequencer timers are free-running counters with a set of compare
//! channels. A compare match raises an event that is either routed through
//! the fabric (pulse timer edges, preload starts) or serviced by the CPU
//! (state timer transitions).

use crate::routing::EventHandle;

/// Number of compare channels a sequencer timer must provide
pub const COMPARE_CHANNELS: usize = 6;

/// Compare channel selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CompareChannel {
    Cc0,
    Cc1,
    Cc2,
    Cc3,
    Cc4,
    Cc5,
}

impl CompareChannel {
    /// All channels in register order
    pub const ALL: [CompareChannel; COMPARE_CHANNELS] = [
        CompareChannel::Cc0,
        CompareChannel::Cc1,
        CompareChannel::Cc2,
        CompareChannel::Cc3,
        CompareChannel::Cc4,
        CompareChannel::Cc5,
    ];

    /// Register index of this channel
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Hardware timer with compare channels
///
/// All methods are register writes: they never block and are safe to call
/// from interrupt context.
pub trait CompareTimer {
    /// Counter clock in Hz
    fn base_frequency_hz(&self) -> u32;

    /// Program `channel` to match at `ticks`
    ///
    /// With `auto_clear` the counter resets to zero on the match, which makes
    /// the timer periodic with period `ticks`.
    fn configure(&mut self, channel: CompareChannel, ticks: u32, auto_clear: bool);

    /// Start counting
    fn enable(&mut self);

    /// Stop counting (the counter value is kept)
    fn disable(&mut self);

    /// Reset the counter to zero
    fn clear(&mut self);

    /// Fabric endpoint for the compare event of `channel`
    fn compare_event(&self, channel: CompareChannel) -> EventHandle;
}
