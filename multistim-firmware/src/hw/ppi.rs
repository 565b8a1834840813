//! PPI as the event-routing fabric
//!
//! Channels are handed out in order from the programmable range. Each
//! channel has one fork endpoint, which is how a single state timer compare
//! starts both the multiplexer and the DAC transfer.

use embassy_nrf::pac::PPI;
use multistim_hal::{EventHandle, EventRouter, Route, RoutingError, TaskHandle};

/// Programmable PPI channels on the nRF52833
const PPI_CHANNELS: u8 = 20;

pub struct PpiRouter {
    first: u8,
    next: u8,
    forked: u32,
}

impl PpiRouter {
    /// Take ownership of the channels from `first` up
    pub fn new(first: u8) -> Self {
        Self {
            first,
            next: first,
            forked: 0,
        }
    }

    fn allocated(&self, route: Route) -> Result<usize, RoutingError> {
        if (self.first..self.next).contains(&route.0) {
            Ok(route.0 as usize)
        } else {
            Err(RoutingError::UnknownRoute)
        }
    }
}

impl EventRouter for PpiRouter {
    fn connect(&mut self, event: EventHandle, task: TaskHandle) -> Result<Route, RoutingError> {
        if self.next >= PPI_CHANNELS {
            return Err(RoutingError::NoFreeChannel);
        }
        let n = self.next as usize;
        self.next += 1;

        PPI.ch(n).eep().write_value(event.0);
        PPI.ch(n).tep().write_value(task.0);
        PPI.fork(n).tep().write_value(0);
        Ok(Route(n as u8))
    }

    fn fork(&mut self, route: Route, task: TaskHandle) -> Result<(), RoutingError> {
        let n = self.allocated(route)?;
        if self.forked & (1 << n) != 0 {
            return Err(RoutingError::ForkInUse);
        }
        self.forked |= 1 << n;
        PPI.fork(n).tep().write_value(task.0);
        Ok(())
    }

    fn enable(&mut self, route: Route) -> Result<(), RoutingError> {
        let n = self.allocated(route)?;
        PPI.chenset().write(|w| w.set_ch(n, true));
        Ok(())
    }
}
