//! Shift-register analog multiplexer
//!
//! Sixteen analog switches behind a pair of cascaded shift registers. A
//! pattern bit set to 1 closes the matching switch. The 16-bit pattern is
//! clocked out MSB first; the firmware's transfer-complete handler pulses
//! the latch line to move it to the switches.

use crate::slot::{Frame, FrameEncoder, FrameSlot};

/// Encodes a channel bitmask as two bytes, high byte first
#[derive(Debug, Default, Clone, Copy)]
pub struct ShiftRegisterEncoder;

impl FrameEncoder for ShiftRegisterEncoder {
    fn encode(&self, pattern: u16) -> Frame {
        Frame::from_slice(&pattern.to_be_bytes()).unwrap_or_default()
    }
}

/// Multiplexer transfer slot
pub type MuxSlot<T> = FrameSlot<T, ShiftRegisterEncoder>;

/// Build a multiplexer slot on `transport`
pub fn mux_slot<T: multistim_hal::FrameTransport>(transport: T) -> MuxSlot<T> {
    FrameSlot::new(transport, ShiftRegisterEncoder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slot::test_transport::FakeTransport;
    use multistim_core::params::PATTERN_OFF;
    use multistim_core::traits::{SlotState, TransferSlot};

    #[test]
    fn test_pattern_is_msb_first() {
        let frame = ShiftRegisterEncoder.encode(0x0102);
        assert_eq!(frame.as_slice(), &[0x01, 0x02]);
    }

    #[test]
    fn test_off_pattern_opens_everything() {
        assert_eq!(ShiftRegisterEncoder.encode(PATTERN_OFF).as_slice(), &[0, 0]);
    }

    #[test]
    fn test_slot_holds_pattern_for_fabric_start() {
        let mut slot = mux_slot(FakeTransport::new());
        slot.prepare(0x8080).unwrap();
        assert_eq!(slot.state(), SlotState::Held);
        assert_eq!(slot.transport().frame.as_slice(), &[0x80, 0x80]);
    }
}
