//! Digital output abstractions
//!
//! The sequencer drives a single phase indicator line (high while a burst is
//! being emitted). Boards without one use [`NoPin`].

/// Logic level of an output line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Level {
    /// Logic 0
    Low,
    /// Logic 1
    High,
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }
}

/// Digital output pin
pub trait OutputPin {
    /// Drive the pin high
    fn set_high(&mut self);

    /// Drive the pin low
    fn set_low(&mut self);

    /// Drive the pin to `level`
    fn set_level(&mut self, level: Level) {
        match level {
            Level::High => self.set_high(),
            Level::Low => self.set_low(),
        }
    }

    /// Last level written to the pin
    fn is_set_high(&self) -> bool;
}

/// Placeholder for an output that is not fitted
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPin;

impl OutputPin for NoPin {
    fn set_high(&mut self) {}

    fn set_low(&mut self) {}

    fn is_set_high(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Recorder {
        high: bool,
        writes: u8,
    }

    impl OutputPin for Recorder {
        fn set_high(&mut self) {
            self.high = true;
            self.writes += 1;
        }

        fn set_low(&mut self) {
            self.high = false;
            self.writes += 1;
        }

        fn is_set_high(&self) -> bool {
            self.high
        }
    }

    #[test]
    fn test_set_level_dispatches() {
        let mut pin = Recorder {
            high: false,
            writes: 0,
        };
        pin.set_level(Level::High);
        assert!(pin.is_set_high());
        pin.set_level(Level::from(false));
        assert!(!pin.is_set_high());
        assert_eq!(pin.writes, 2);
    }

    #[test]
    fn test_no_pin_stays_low() {
        let mut pin = NoPin;
        pin.set_high();
        assert!(!pin.is_set_high());
    }
}
