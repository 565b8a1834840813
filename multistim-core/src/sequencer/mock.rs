//! Recording fakes for sequencer tests

extern crate std;

use std::boxed::Box;
use std::vec::Vec;

use multistim_hal::{
    CompareChannel, CompareTimer, EventHandle, EventRouter, OutputPin, Route, RoutingError,
    TaskHandle,
};

use crate::traits::{SlotError, SlotState, TransferSlot};

pub const BASE_HZ: u32 = 16_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerOp {
    Configure(CompareChannel, u32, bool),
    Enable,
    Disable,
    Clear,
}

/// Timer that records every register write
///
/// `hook` runs before each operation with the operation's sequence number,
/// which lets a test interleave a parameter update at any point of a
/// handler.
pub struct MockTimer {
    pub compares: [Option<(u32, bool)>; 6],
    pub running: bool,
    pub ops: Vec<TimerOp>,
    pub hook: Option<Box<dyn FnMut(usize)>>,
    event_base: u32,
}

impl MockTimer {
    pub fn new() -> Self {
        Self::with_base(0)
    }

    /// Timer whose event handles start at `event_base`
    pub fn with_base(event_base: u32) -> Self {
        Self {
            compares: [None; 6],
            running: false,
            ops: Vec::new(),
            hook: None,
            event_base,
        }
    }

    pub fn compare(&self, channel: CompareChannel) -> Option<u32> {
        self.compares[channel.index()].map(|(ticks, _)| ticks)
    }

    fn record(&mut self, op: TimerOp) {
        let seq = self.ops.len();
        if let Some(hook) = self.hook.as_mut() {
            hook(seq);
        }
        self.ops.push(op);
    }
}

impl CompareTimer for MockTimer {
    fn base_frequency_hz(&self) -> u32 {
        BASE_HZ
    }

    fn configure(&mut self, channel: CompareChannel, ticks: u32, auto_clear: bool) {
        self.record(TimerOp::Configure(channel, ticks, auto_clear));
        self.compares[channel.index()] = Some((ticks, auto_clear));
    }

    fn enable(&mut self) {
        self.record(TimerOp::Enable);
        self.running = true;
    }

    fn disable(&mut self) {
        self.record(TimerOp::Disable);
        self.running = false;
    }

    fn clear(&mut self) {
        self.record(TimerOp::Clear);
    }

    fn compare_event(&self, channel: CompareChannel) -> EventHandle {
        EventHandle(self.event_base + 0x140 + 4 * channel.index() as u32)
    }
}

/// Slot whose transfers complete as soon as they start
pub struct MockSlot {
    pub state: SlotState,
    pub held: Option<u16>,
    pub written: Vec<u16>,
    pub prepared: Vec<u16>,
    pub aborts: usize,
    /// Fail `prepare` and `write` with `Busy`
    pub busy: bool,
    /// Fail `write` with `Rejected`
    pub reject_writes: bool,
    pub task: TaskHandle,
}

impl MockSlot {
    pub fn new() -> Self {
        Self {
            state: SlotState::Idle,
            held: None,
            written: Vec::new(),
            prepared: Vec::new(),
            aborts: 0,
            busy: false,
            reject_writes: false,
            task: TaskHandle(0x10),
        }
    }

    /// Fabric start: a held value goes on the wire and stays there
    pub fn start(&mut self) {
        if self.state == SlotState::Held {
            self.state = SlotState::InFlight;
        }
    }

    /// Transfer finished
    pub fn complete(&mut self) {
        if self.state == SlotState::InFlight {
            if let Some(value) = self.held.take() {
                self.written.push(value);
            }
            self.state = SlotState::Idle;
        }
    }
}

impl TransferSlot for MockSlot {
    fn write(&mut self, value: u16) -> Result<(), SlotError> {
        if self.busy || self.state == SlotState::InFlight {
            return Err(SlotError::Busy);
        }
        if self.reject_writes {
            return Err(SlotError::Rejected);
        }
        self.held = None;
        self.written.push(value);
        self.state = SlotState::Idle;
        Ok(())
    }

    fn prepare(&mut self, value: u16) -> Result<(), SlotError> {
        if self.busy || self.state == SlotState::InFlight {
            return Err(SlotError::Busy);
        }
        self.held = Some(value);
        self.prepared.push(value);
        self.state = SlotState::Held;
        Ok(())
    }

    fn abort(&mut self) {
        self.aborts += 1;
        self.held = None;
        self.state = SlotState::Idle;
    }

    fn state(&self) -> SlotState {
        self.state
    }

    fn start_task(&self) -> TaskHandle {
        self.task
    }
}

/// Indicator pin that remembers its history
pub struct MockPin {
    pub high: bool,
    pub edges: Vec<bool>,
}

impl MockPin {
    pub fn new() -> Self {
        Self {
            high: false,
            edges: Vec::new(),
        }
    }
}

impl OutputPin for MockPin {
    fn set_high(&mut self) {
        self.high = true;
        self.edges.push(true);
    }

    fn set_low(&mut self) {
        self.high = false;
        self.edges.push(false);
    }

    fn is_set_high(&self) -> bool {
        self.high
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockRoute {
    pub event: EventHandle,
    pub task: TaskHandle,
    pub fork: Option<TaskHandle>,
    pub enabled: bool,
}

/// Fabric with a fixed number of channels
pub struct MockRouter {
    pub routes: Vec<MockRoute>,
    capacity: usize,
}

impl MockRouter {
    pub fn new(capacity: usize) -> Self {
        Self {
            routes: Vec::new(),
            capacity,
        }
    }

    fn route_mut(&mut self, route: Route) -> Result<&mut MockRoute, RoutingError> {
        self.routes
            .get_mut(route.0 as usize)
            .ok_or(RoutingError::UnknownRoute)
    }
}

impl EventRouter for MockRouter {
    fn connect(&mut self, event: EventHandle, task: TaskHandle) -> Result<Route, RoutingError> {
        if self.routes.len() == self.capacity {
            return Err(RoutingError::NoFreeChannel);
        }
        self.routes.push(MockRoute {
            event,
            task,
            fork: None,
            enabled: false,
        });
        Ok(Route(self.routes.len() as u8 - 1))
    }

    fn fork(&mut self, route: Route, task: TaskHandle) -> Result<(), RoutingError> {
        let entry = self.route_mut(route)?;
        if entry.fork.is_some() {
            return Err(RoutingError::ForkInUse);
        }
        entry.fork = Some(task);
        Ok(())
    }

    fn enable(&mut self, route: Route) -> Result<(), RoutingError> {
        self.route_mut(route)?.enabled = true;
        Ok(())
    }
}
