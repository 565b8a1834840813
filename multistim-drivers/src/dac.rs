//! MCP4725 DAC
//!
//! 12-bit single-channel I2C DAC. Uses the three-byte "write DAC register"
//! command: `0x40`, then the code left-justified over the next 12 bits.
//! Boards that only use the top bits of the range configure a smaller
//! resolution; values are then scaled up to the 12-bit register.

use crate::slot::{Frame, FrameEncoder, FrameSlot};

/// Default 7-bit bus address (A0 tied low)
pub const MCP4725_ADDRESS: u8 = 0x60;

/// Write DAC register command byte
const CMD_WRITE_DAC: u8 = 0x40;

/// Native resolution of the part
const REGISTER_BITS: u8 = 12;

/// Bus clocks per write: address and three data bytes at nine clocks each,
/// plus start and stop
pub const MCP4725_FRAME_CLOCKS: u32 = 38;

/// Time one write occupies the bus at `bus_hz`, rounded up
pub const fn frame_time_us(bus_hz: u32) -> u32 {
    if bus_hz == 0 {
        return u32::MAX;
    }
    (MCP4725_FRAME_CLOCKS * 1_000_000).div_ceil(bus_hz)
}

/// Encodes amplitude codes for the MCP4725
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mcp4725Encoder {
    resolution_bits: u8,
}

impl Mcp4725Encoder {
    /// Encoder for `resolution_bits`-bit codes (clamped to 1..=12)
    pub const fn new(resolution_bits: u8) -> Self {
        let bits = if resolution_bits == 0 {
            1
        } else if resolution_bits > REGISTER_BITS {
            REGISTER_BITS
        } else {
            resolution_bits
        };
        Self {
            resolution_bits: bits,
        }
    }

    /// Largest code accepted at this resolution
    pub const fn max_code(&self) -> u16 {
        (1 << self.resolution_bits) - 1
    }

    /// Register value for `code`, clamped to the resolution
    pub const fn register_value(&self, code: u16) -> u16 {
        let max = self.max_code();
        let code = if code > max { max } else { code };
        code << (REGISTER_BITS - self.resolution_bits)
    }
}

impl Default for Mcp4725Encoder {
    fn default() -> Self {
        Self::new(REGISTER_BITS)
    }
}

impl FrameEncoder for Mcp4725Encoder {
    fn encode(&self, code: u16) -> Frame {
        let value = self.register_value(code);
        let bytes = [CMD_WRITE_DAC, (value >> 4) as u8, ((value & 0x0F) << 4) as u8];
        Frame::from_slice(&bytes).unwrap_or_default()
    }
}

/// DAC transfer slot
pub type DacSlot<T> = FrameSlot<T, Mcp4725Encoder>;

/// Build a DAC slot on `transport`
pub fn dac_slot<T: multistim_hal::FrameTransport>(transport: T, resolution_bits: u8) -> DacSlot<T> {
    FrameSlot::new(transport, Mcp4725Encoder::new(resolution_bits))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slot::test_transport::FakeTransport;
    use multistim_core::traits::TransferSlot;

    #[test]
    fn test_twelve_bit_frame() {
        let enc = Mcp4725Encoder::default();
        assert_eq!(enc.encode(0x0ABC).as_slice(), &[0x40, 0xAB, 0xC0]);
        assert_eq!(enc.encode(0).as_slice(), &[0x40, 0x00, 0x00]);
    }

    #[test]
    fn test_clamped_to_full_scale() {
        let enc = Mcp4725Encoder::default();
        assert_eq!(enc.max_code(), 4095);
        assert_eq!(enc.encode(u16::MAX).as_slice(), &[0x40, 0xFF, 0xF0]);
    }

    #[test]
    fn test_ten_bit_codes_are_left_justified() {
        let enc = Mcp4725Encoder::new(10);
        assert_eq!(enc.max_code(), 1023);
        // 0x2AB -> bytes 0xAA, 0xC0
        assert_eq!(enc.encode(0x02AB).as_slice(), &[0x40, 0xAA, 0xC0]);
        assert_eq!(enc.encode(4000), enc.encode(1023));
    }

    #[test]
    fn test_resolution_bounds() {
        assert_eq!(Mcp4725Encoder::new(0).max_code(), 1);
        assert_eq!(Mcp4725Encoder::new(16).max_code(), 4095);
    }

    #[test]
    fn test_frame_time() {
        assert_eq!(frame_time_us(400_000), 95);
        assert_eq!(frame_time_us(100_000), 380);
        assert_eq!(frame_time_us(250_000), 152);
    }

    #[test]
    fn test_write_starts_immediately() {
        let mut slot = dac_slot(FakeTransport::new(), 12);
        slot.write(2000).unwrap();
        assert!(!slot.is_ready());
        slot.transport_mut().finish();
        assert!(slot.is_ready());
        assert_eq!(slot.transport().sent[0].as_slice(), &[0x40, 0x7D, 0x00]);
    }
}
