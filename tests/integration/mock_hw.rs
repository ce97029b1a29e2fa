//! Mock hardware adapter for integration tests.
//!
//! Records every command the machines issue so tests can assert on the
//! full call history without a board registry or simulator.  Queryable
//! registers are plain `Cell`s the test sets directly.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use urbanite::app::events::AppEvent;
use urbanite::app::ports::{ButtonPort, Clock, DisplayPort, EventSink, PowerPort, UltrasoundPort};
use urbanite::drivers::rgb_led::Rgb;

// ── Hardware call record ──────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwCall {
    StartMeasurement,
    StopTrigger,
    StopEcho,
    StartPeriodic,
    StopPeriodic,
    ResetEcho,
    SetRgb(Rgb),
}

// ── MockHardware ──────────────────────────────────────────────

#[derive(Default)]
pub struct MockHardware {
    pub now: Cell<u32>,
    pub pressed: Cell<bool>,
    pub echo_init: Cell<u32>,
    pub echo_end: Cell<u32>,
    pub overflows: Cell<u32>,
    pub echo_received: Cell<bool>,
    pub trigger_end: Cell<bool>,
    pub trigger_ready: Cell<bool>,
    pub calls: RefCell<Vec<HwCall>>,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    fn record(&self, call: HwCall) {
        self.calls.borrow_mut().push(call);
    }

    pub fn take_calls(&self) -> Vec<HwCall> {
        self.calls.borrow_mut().drain(..).collect()
    }

    /// Every colour rendered so far, oldest first.
    pub fn colours(&self) -> Vec<Rgb> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| match c {
                HwCall::SetRgb(rgb) => Some(*rgb),
                _ => None,
            })
            .collect()
    }

    pub fn last_colour(&self) -> Option<Rgb> {
        self.colours().last().copied()
    }

    /// Load one completed echo into the capture registers.
    pub fn echo(&self, init: u32, end: u32, overflows: u32) {
        self.echo_init.set(init);
        self.echo_end.set(end);
        self.overflows.set(overflows);
        self.echo_received.set(true);
    }
}

impl Clock for MockHardware {
    fn now_ms(&self) -> u32 {
        self.now.get()
    }
}

impl ButtonPort for MockHardware {
    fn is_pressed(&self, _id: u32) -> bool {
        self.pressed.get()
    }
}

impl UltrasoundPort for MockHardware {
    fn start_measurement(&self, _id: u32) {
        self.trigger_ready.set(false);
        self.record(HwCall::StartMeasurement);
    }

    fn stop_trigger_timer(&self, _id: u32) {
        self.record(HwCall::StopTrigger);
    }

    fn stop_echo_timer(&self, _id: u32) {
        self.record(HwCall::StopEcho);
    }

    fn start_new_measurement_timer(&self, _id: u32) {
        self.record(HwCall::StartPeriodic);
    }

    fn stop_new_measurement_timer(&self, _id: u32) {
        self.record(HwCall::StopPeriodic);
    }

    fn reset_echo_ticks(&self, _id: u32) {
        self.echo_init.set(0);
        self.echo_end.set(0);
        self.overflows.set(0);
        self.echo_received.set(false);
        self.record(HwCall::ResetEcho);
    }

    fn echo_init_tick(&self, _id: u32) -> u32 {
        self.echo_init.get()
    }

    fn set_echo_init_tick(&self, _id: u32, tick: u32) {
        self.echo_init.set(tick);
    }

    fn echo_end_tick(&self, _id: u32) -> u32 {
        self.echo_end.get()
    }

    fn set_echo_end_tick(&self, _id: u32, tick: u32) {
        self.echo_end.set(tick);
    }

    fn echo_overflows(&self, _id: u32) -> u32 {
        self.overflows.get()
    }

    fn set_echo_overflows(&self, _id: u32, overflows: u32) {
        self.overflows.set(overflows);
    }

    fn echo_received(&self, _id: u32) -> bool {
        self.echo_received.get()
    }

    fn set_echo_received(&self, _id: u32, received: bool) {
        self.echo_received.set(received);
    }

    fn trigger_end(&self, _id: u32) -> bool {
        self.trigger_end.get()
    }

    fn set_trigger_end(&self, _id: u32, end: bool) {
        self.trigger_end.set(end);
    }

    fn trigger_ready(&self, _id: u32) -> bool {
        self.trigger_ready.get()
    }

    fn set_trigger_ready(&self, _id: u32, ready: bool) {
        self.trigger_ready.set(ready);
    }
}

impl DisplayPort for MockHardware {
    fn set_rgb(&self, _id: u32, colour: Rgb) {
        self.record(HwCall::SetRgb(colour));
    }
}

// ── MockPower ─────────────────────────────────────────────────

/// Counts sleeps and records blocking delays; delays advance the mock
/// clock.
pub struct MockPower {
    hw: Rc<MockHardware>,
    pub sleeps: u32,
    pub delays_ms: Vec<u32>,
}

#[allow(dead_code)]
impl MockPower {
    pub fn new(hw: Rc<MockHardware>) -> Self {
        Self {
            hw,
            sleeps: 0,
            delays_ms: Vec::new(),
        }
    }
}

impl DelayNs for MockPower {
    fn delay_ns(&mut self, ns: u32) {
        self.delay_ms(ns / 1_000_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delays_ms.push(ms);
        self.hw.now.set(self.hw.now.get().wrapping_add(ms));
    }
}

impl PowerPort for MockPower {
    fn sleep(&mut self) {
        self.sleeps += 1;
    }
}

// ── Event recorder ────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
