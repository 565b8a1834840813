//! `embedded-hal` output pin adapter

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, OutputPin as EhOutputPin};
use multistim_hal::OutputPin;

/// Wraps an infallible `embedded-hal` output as a phase indicator
pub struct HalPin<P> {
    pin: P,
    high: bool,
}

impl<P> HalPin<P>
where
    P: EhOutputPin + ErrorType<Error = Infallible>,
{
    /// Take the pin and drive it low
    pub fn new(mut pin: P) -> Self {
        pin.set_low().unwrap_or_else(|e| match e {});
        Self { pin, high: false }
    }

    pub fn release(self) -> P {
        self.pin
    }
}

impl<P> OutputPin for HalPin<P>
where
    P: EhOutputPin + ErrorType<Error = Infallible>,
{
    fn set_high(&mut self) {
        self.pin.set_high().unwrap_or_else(|e| match e {});
        self.high = true;
    }

    fn set_low(&mut self) {
        self.pin.set_low().unwrap_or_else(|e| match e {});
        self.high = false;
    }

    fn is_set_high(&self) -> bool {
        self.high
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Line {
        level: bool,
        writes: u8,
    }

    impl ErrorType for Line {
        type Error = Infallible;
    }

    impl EhOutputPin for Line {
        fn set_low(&mut self) -> Result<(), Infallible> {
            self.level = false;
            self.writes += 1;
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Infallible> {
            self.level = true;
            self.writes += 1;
            Ok(())
        }
    }

    #[test]
    fn test_new_drives_low() {
        let pin = HalPin::new(Line {
            level: true,
            writes: 0,
        });
        assert!(!pin.is_set_high());
        let line = pin.release();
        assert!(!line.level);
        assert_eq!(line.writes, 1);
    }

    #[test]
    fn test_levels_follow_calls() {
        let mut pin = HalPin::new(Line {
            level: false,
            writes: 0,
        });
        pin.set_high();
        assert!(pin.is_set_high());
        pin.set_level(multistim_hal::Level::Low);
        assert!(!pin.is_set_high());
        assert!(!pin.release().level);
    }
}
