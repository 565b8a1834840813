//! One-time event routing for the sequencer
//!
//! ```text
//!  pulse timer CC0 ──► output 1 set        state timer CC1 ──► pattern start
//!  pulse timer CC1 ──► output 1 clear                     └──► amplitude start (fork)
//!  pulse timer CC2 ──► output 2 set   (second output only)
//!  pulse timer CC3 ──► output 2 clear (second output only)
//! ```

use multistim_hal::{CompareChannel, CompareTimer, EventRouter, Route, RoutingError, TaskHandle};

use crate::traits::TransferSlot;

use super::machine::SequencerHardware;

/// Edge tasks of one stimulation output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OutputTasks {
    pub set: TaskHandle,
    pub clear: TaskHandle,
}

/// Routes created by [`wire_fabric`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FabricRoutes {
    pub primary: (Route, Route),
    pub secondary: Option<(Route, Route)>,
    /// State timer preload to both transfer slots
    pub preload: Route,
}

/// Wire the pulse edges and the preload starts, then enable every route
///
/// Runs once before the sequencer is started. Any error leaves the fabric
/// partially wired; bring-up treats it as fatal.
pub fn wire_fabric<R, PT, ST, M, D, I>(
    router: &mut R,
    hw: &SequencerHardware<PT, ST, M, D, I>,
    primary: OutputTasks,
    secondary: Option<OutputTasks>,
) -> Result<FabricRoutes, RoutingError>
where
    R: EventRouter,
    PT: CompareTimer,
    ST: CompareTimer,
    M: TransferSlot,
    D: TransferSlot,
{
    let pulse = &hw.pulse_timer;
    let primary = (
        router.wire(pulse.compare_event(CompareChannel::Cc0), primary.set)?,
        router.wire(pulse.compare_event(CompareChannel::Cc1), primary.clear)?,
    );
    let secondary = match secondary {
        Some(tasks) => Some((
            router.wire(pulse.compare_event(CompareChannel::Cc2), tasks.set)?,
            router.wire(pulse.compare_event(CompareChannel::Cc3), tasks.clear)?,
        )),
        None => None,
    };

    let preload = router.connect(
        hw.state_timer.compare_event(CompareChannel::Cc1),
        hw.pattern_slot.start_task(),
    )?;
    router.fork(preload, hw.amplitude_slot.start_task())?;
    router.enable(preload)?;

    Ok(FabricRoutes {
        primary,
        secondary,
        preload,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencer::mock::{MockPin, MockRouter, MockSlot, MockTimer};
    use multistim_hal::EventHandle;

    fn hardware() -> SequencerHardware<MockTimer, MockTimer, MockSlot, MockSlot, MockPin> {
        let mut amplitude_slot = MockSlot::new();
        amplitude_slot.task = TaskHandle(0x20);
        SequencerHardware {
            pulse_timer: MockTimer::new(),
            state_timer: MockTimer::with_base(0x1000),
            pattern_slot: MockSlot::new(),
            amplitude_slot,
            indicator: MockPin::new(),
        }
    }

    const OUT1: OutputTasks = OutputTasks {
        set: TaskHandle(0xA0),
        clear: TaskHandle(0xA4),
    };
    const OUT2: OutputTasks = OutputTasks {
        set: TaskHandle(0xB0),
        clear: TaskHandle(0xB4),
    };

    #[test]
    fn test_single_output_wiring() {
        let mut router = MockRouter::new(8);
        let routes = wire_fabric(&mut router, &hardware(), OUT1, None).unwrap();

        assert_eq!(routes.primary, (Route(0), Route(1)));
        assert_eq!(routes.secondary, None);
        assert_eq!(routes.preload, Route(2));

        assert_eq!(router.routes[0].event, EventHandle(0x140));
        assert_eq!(router.routes[0].task, OUT1.set);
        assert_eq!(router.routes[1].event, EventHandle(0x144));
        assert_eq!(router.routes[1].task, OUT1.clear);
        assert!(router.routes.iter().all(|r| r.enabled));
    }

    #[test]
    fn test_preload_forks_to_both_slots() {
        let mut router = MockRouter::new(8);
        let routes = wire_fabric(&mut router, &hardware(), OUT1, None).unwrap();

        let preload = &router.routes[routes.preload.0 as usize];
        assert_eq!(preload.event, EventHandle(0x1000 + 0x144));
        assert_eq!(preload.task, TaskHandle(0x10));
        assert_eq!(preload.fork, Some(TaskHandle(0x20)));
    }

    #[test]
    fn test_second_output_uses_cc2_cc3() {
        let mut router = MockRouter::new(8);
        let routes = wire_fabric(&mut router, &hardware(), OUT1, Some(OUT2)).unwrap();

        assert_eq!(routes.secondary, Some((Route(2), Route(3))));
        assert_eq!(router.routes[2].event, EventHandle(0x148));
        assert_eq!(router.routes[2].task, OUT2.set);
        assert_eq!(router.routes[3].event, EventHandle(0x14C));
        assert_eq!(router.routes[3].task, OUT2.clear);
        assert_eq!(routes.preload, Route(4));
    }

    #[test]
    fn test_exhausted_fabric_is_reported() {
        let mut router = MockRouter::new(3);
        assert_eq!(
            wire_fabric(&mut router, &hardware(), OUT1, Some(OUT2)),
            Err(RoutingError::NoFreeChannel)
        );
    }
}
