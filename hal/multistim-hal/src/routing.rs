//! Event-routing fabric
//!
//! A hardware crossbar that connects an event ("timer reached CC1") to a
//! task ("start SPI transfer") so the task fires with no CPU involvement.
//! Routes are set up once during bring-up and never touched again.

/// Opaque identifier of an event endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EventHandle(pub u32);

/// Opaque identifier of a task endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TaskHandle(pub u32);

/// An allocated fabric channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Route(pub u8);

/// Fabric setup errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RoutingError {
    /// Every fabric channel is already allocated
    NoFreeChannel,
    /// The route already carries a secondary task
    ForkInUse,
    /// The route was not allocated by this router
    UnknownRoute,
}

/// One-time wiring of events to tasks
pub trait EventRouter {
    /// Allocate a channel connecting `event` to `task`
    ///
    /// The route is inactive until [`EventRouter::enable`] is called.
    fn connect(&mut self, event: EventHandle, task: TaskHandle) -> Result<Route, RoutingError>;

    /// Attach a second task to an existing route
    fn fork(&mut self, route: Route, task: TaskHandle) -> Result<(), RoutingError>;

    /// Activate a route
    fn enable(&mut self, route: Route) -> Result<(), RoutingError>;

    /// Connect and enable in one step
    fn wire(&mut self, event: EventHandle, task: TaskHandle) -> Result<Route, RoutingError> {
        let route = self.connect(event, task)?;
        self.enable(route)?;
        Ok(route)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct TableRouter {
        routes: [Option<(EventHandle, TaskHandle, Option<TaskHandle>, bool)>; 2],
    }

    impl EventRouter for TableRouter {
        fn connect(&mut self, event: EventHandle, task: TaskHandle) -> Result<Route, RoutingError> {
            let slot = self
                .routes
                .iter()
                .position(Option::is_none)
                .ok_or(RoutingError::NoFreeChannel)?;
            self.routes[slot] = Some((event, task, None, false));
            Ok(Route(slot as u8))
        }

        fn fork(&mut self, route: Route, task: TaskHandle) -> Result<(), RoutingError> {
            let entry = self
                .routes
                .get_mut(route.0 as usize)
                .and_then(Option::as_mut)
                .ok_or(RoutingError::UnknownRoute)?;
            if entry.2.is_some() {
                return Err(RoutingError::ForkInUse);
            }
            entry.2 = Some(task);
            Ok(())
        }

        fn enable(&mut self, route: Route) -> Result<(), RoutingError> {
            let entry = self
                .routes
                .get_mut(route.0 as usize)
                .and_then(Option::as_mut)
                .ok_or(RoutingError::UnknownRoute)?;
            entry.3 = true;
            Ok(())
        }
    }

    #[test]
    fn test_wire_enables_route() {
        let mut router = TableRouter::default();
        let route = router.wire(EventHandle(0x10), TaskHandle(0x20)).unwrap();
        assert_eq!(route, Route(0));
        assert_eq!(
            router.routes[0],
            Some((EventHandle(0x10), TaskHandle(0x20), None, true))
        );
    }

    #[test]
    fn test_exhausted_fabric() {
        let mut router = TableRouter::default();
        router.connect(EventHandle(1), TaskHandle(1)).unwrap();
        router.connect(EventHandle(2), TaskHandle(2)).unwrap();
        assert_eq!(
            router.connect(EventHandle(3), TaskHandle(3)),
            Err(RoutingError::NoFreeChannel)
        );
    }

    #[test]
    fn test_single_fork_per_route() {
        let mut router = TableRouter::default();
        let route = router.connect(EventHandle(1), TaskHandle(1)).unwrap();
        router.fork(route, TaskHandle(2)).unwrap();
        assert_eq!(router.fork(route, TaskHandle(3)), Err(RoutingError::ForkInUse));
    }
}
