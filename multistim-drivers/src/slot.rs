//! Transfer slot over a frame transport
//!
//! The slot owns the encoding; the transport owns the DMA buffer and the
//! hardware start task. Slot state is read straight from the transport so
//! it stays correct when the fabric starts a held frame behind the CPU's
//! back.

use heapless::Vec;

use multistim_core::traits::{SlotError, SlotState, TransferSlot};
use multistim_hal::{FrameTransport, TaskHandle, TransportStatus, Trigger, MAX_FRAME_LEN};

/// Encoded frame
pub type Frame = Vec<u8, MAX_FRAME_LEN>;

/// Turns a slot value into the bytes a device expects
pub trait FrameEncoder {
    fn encode(&self, value: u16) -> Frame;
}

/// [`TransferSlot`] for any encoder/transport pair
pub struct FrameSlot<T, E> {
    transport: T,
    encoder: E,
}

impl<T: FrameTransport, E: FrameEncoder> FrameSlot<T, E> {
    pub fn new(transport: T, encoder: E) -> Self {
        Self { transport, encoder }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    fn load(&mut self, value: u16, trigger: Trigger) -> Result<(), SlotError> {
        let frame = self.encoder.encode(value);
        self.transport.load(&frame, trigger)?;
        Ok(())
    }
}

impl<T: FrameTransport, E: FrameEncoder> TransferSlot for FrameSlot<T, E> {
    fn write(&mut self, value: u16) -> Result<(), SlotError> {
        self.load(value, Trigger::Now)
    }

    fn prepare(&mut self, value: u16) -> Result<(), SlotError> {
        self.load(value, Trigger::Hold)
    }

    fn abort(&mut self) {
        if self.transport.status() != TransportStatus::Idle {
            self.transport.cancel();
        }
    }

    fn state(&self) -> SlotState {
        match self.transport.status() {
            TransportStatus::Idle => SlotState::Idle,
            TransportStatus::Armed => SlotState::Held,
            TransportStatus::Active => SlotState::InFlight,
        }
    }

    fn start_task(&self) -> TaskHandle {
        self.transport.start_task()
    }
}

/// In-memory transport shared by the driver tests
#[cfg(test)]
pub(crate) mod test_transport {
    use super::*;
    use multistim_hal::TransportError;

    pub struct FakeTransport {
        pub status: TransportStatus,
        pub frame: Frame,
        pub sent: heapless::Vec<Frame, 8>,
        pub cancels: usize,
    }

    impl FakeTransport {
        pub fn new() -> Self {
            Self {
                status: TransportStatus::Idle,
                frame: Frame::new(),
                sent: heapless::Vec::new(),
                cancels: 0,
            }
        }

        /// Fabric start followed by completion
        pub fn trigger(&mut self) {
            if self.status == TransportStatus::Armed {
                self.status = TransportStatus::Active;
            }
        }

        pub fn finish(&mut self) {
            if self.status == TransportStatus::Active {
                let _ = self.sent.push(self.frame.clone());
                self.status = TransportStatus::Idle;
            }
        }
    }

    impl FrameTransport for FakeTransport {
        fn load(&mut self, frame: &[u8], trigger: Trigger) -> Result<(), TransportError> {
            if self.status == TransportStatus::Active {
                return Err(TransportError::Busy);
            }
            self.frame = Frame::from_slice(frame).map_err(|_| TransportError::FrameTooLong)?;
            self.status = match trigger {
                Trigger::Now => TransportStatus::Active,
                Trigger::Hold => TransportStatus::Armed,
            };
            Ok(())
        }

        fn cancel(&mut self) {
            self.cancels += 1;
            self.status = TransportStatus::Idle;
        }

        fn status(&self) -> TransportStatus {
            self.status
        }

        fn start_task(&self) -> TaskHandle {
            TaskHandle(0x4002_F010)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_transport::FakeTransport;
    use super::*;

    struct Echo;

    impl FrameEncoder for Echo {
        fn encode(&self, value: u16) -> Frame {
            Frame::from_slice(&value.to_be_bytes()).unwrap()
        }
    }

    #[test]
    fn test_prepare_holds_until_triggered() {
        let mut slot = FrameSlot::new(FakeTransport::new(), Echo);
        slot.prepare(0x1234).unwrap();
        assert_eq!(slot.state(), SlotState::Held);
        assert!(!slot.is_ready());

        slot.transport_mut().trigger();
        assert_eq!(slot.state(), SlotState::InFlight);
        slot.transport_mut().finish();
        assert_eq!(slot.state(), SlotState::Idle);
        assert_eq!(slot.transport().sent[0].as_slice(), &[0x12, 0x34]);
    }

    #[test]
    fn test_prepare_replaces_held_frame() {
        let mut slot = FrameSlot::new(FakeTransport::new(), Echo);
        slot.prepare(1).unwrap();
        slot.prepare(2).unwrap();
        assert_eq!(slot.transport().frame.as_slice(), &[0, 2]);
    }

    #[test]
    fn test_busy_while_in_flight() {
        let mut slot = FrameSlot::new(FakeTransport::new(), Echo);
        slot.write(7).unwrap();
        assert_eq!(slot.state(), SlotState::InFlight);
        assert_eq!(slot.prepare(8), Err(SlotError::Busy));
        assert_eq!(slot.write(8), Err(SlotError::Busy));
    }

    #[test]
    fn test_abort_idle_is_noop() {
        let mut slot = FrameSlot::new(FakeTransport::new(), Echo);
        slot.abort();
        assert_eq!(slot.transport().cancels, 0);

        slot.prepare(3).unwrap();
        slot.abort();
        assert_eq!(slot.transport().cancels, 1);
        assert_eq!(slot.state(), SlotState::Idle);
    }

    #[test]
    fn test_start_task_comes_from_transport() {
        let slot = FrameSlot::new(FakeTransport::new(), Echo);
        assert_eq!(slot.start_task(), TaskHandle(0x4002_F010));
    }
}
