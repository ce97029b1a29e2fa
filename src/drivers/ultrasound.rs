//! HC-SR04 ultrasonic ranger channel.
//!
//! ## Hardware
//!
//! | Signal  | Peripheral                                             |
//! |---------|--------------------------------------------------------|
//! | TRIGGER | GPIO output held high for one trigger-timer period     |
//! | ECHO    | 1 MHz 16-bit timer, input capture on both edges         |
//! | PERIOD  | Measurement timer; each expiry allows a new cycle      |
//!
//! The interrupt handlers below only write flags and captured counter
//! values; the ultrasound FSM reads them on its next pass.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Period of the 16-bit echo capture counter, in ticks (1 tick = 1 µs).
pub const ECHO_TIMER_PERIOD_TICKS: u32 = 65_536;

/// Per-sensor record shared between timer interrupts and the polling loop.
#[derive(Debug)]
pub struct UltrasoundChannel {
    // -- Flags --
    echo_received: AtomicBool,
    trigger_end: AtomicBool,
    trigger_ready: AtomicBool,

    // -- Echo capture --
    echo_init_tick: AtomicU32,
    echo_end_tick: AtomicU32,
    echo_overflows: AtomicU32,

    // -- Timer and line state --
    trigger_high: AtomicBool,
    trigger_timer_on: AtomicBool,
    echo_timer_on: AtomicBool,
    measurement_timer_on: AtomicBool,
}

impl Default for UltrasoundChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl UltrasoundChannel {
    /// Power-on state: ready for the first trigger, nothing captured.
    pub const fn new() -> Self {
        Self {
            echo_received: AtomicBool::new(false),
            trigger_end: AtomicBool::new(false),
            trigger_ready: AtomicBool::new(true),
            echo_init_tick: AtomicU32::new(0),
            echo_end_tick: AtomicU32::new(0),
            echo_overflows: AtomicU32::new(0),
            trigger_high: AtomicBool::new(false),
            trigger_timer_on: AtomicBool::new(false),
            echo_timer_on: AtomicBool::new(false),
            measurement_timer_on: AtomicBool::new(false),
        }
    }

    // ── Commands from the polling loop ────────────────────────

    pub fn start_measurement(&self) {
        self.trigger_ready.store(false, Ordering::Release);
        self.trigger_high.store(true, Ordering::Release);
        self.measurement_timer_on.store(true, Ordering::Release);
        self.echo_timer_on.store(true, Ordering::Release);
        self.trigger_timer_on.store(true, Ordering::Release);
    }

    pub fn stop_trigger_timer(&self) {
        self.trigger_high.store(false, Ordering::Release);
        self.trigger_timer_on.store(false, Ordering::Release);
    }

    pub fn stop_echo_timer(&self) {
        self.echo_timer_on.store(false, Ordering::Release);
    }

    pub fn start_measurement_timer(&self) {
        self.measurement_timer_on.store(true, Ordering::Release);
    }

    pub fn stop_measurement_timer(&self) {
        self.measurement_timer_on.store(false, Ordering::Release);
    }

    pub fn reset_echo_ticks(&self) {
        self.echo_received.store(false, Ordering::Release);
        self.echo_init_tick.store(0, Ordering::Release);
        self.echo_end_tick.store(0, Ordering::Release);
        self.echo_overflows.store(0, Ordering::Release);
    }

    // ── Interrupt handlers ────────────────────────────────────

    /// Trigger timer expired: the pulse is long enough.
    pub fn on_trigger_timer(&self) {
        if self.trigger_timer_on.load(Ordering::Acquire) {
            self.trigger_end.store(true, Ordering::Release);
        }
    }

    /// Measurement timer expired: a new cycle may start.
    pub fn on_measurement_timer(&self) {
        if self.measurement_timer_on.load(Ordering::Acquire) {
            self.trigger_ready.store(true, Ordering::Release);
        }
    }

    /// Echo counter wrapped.
    pub fn on_echo_overflow(&self) {
        if self.echo_timer_on.load(Ordering::Acquire) {
            self.echo_overflows.fetch_add(1, Ordering::AcqRel);
        }
    }

    /// Echo input-capture event.  The first capture after a reset is the
    /// rising edge, the next one the falling edge.
    pub fn on_echo_capture(&self, captured: u32) {
        if !self.echo_timer_on.load(Ordering::Acquire) {
            return;
        }
        let captured = captured % ECHO_TIMER_PERIOD_TICKS;
        let init = self.echo_init_tick.load(Ordering::Acquire);
        let end = self.echo_end_tick.load(Ordering::Acquire);
        if init == 0 && end == 0 {
            self.echo_init_tick.store(captured, Ordering::Release);
        } else {
            self.echo_end_tick.store(captured, Ordering::Release);
            self.echo_received.store(true, Ordering::Release);
        }
    }

    // ── Accessors ─────────────────────────────────────────────

    pub fn echo_received(&self) -> bool {
        self.echo_received.load(Ordering::Acquire)
    }
    pub fn set_echo_received(&self, v: bool) {
        self.echo_received.store(v, Ordering::Release);
    }
    pub fn trigger_end(&self) -> bool {
        self.trigger_end.load(Ordering::Acquire)
    }
    pub fn set_trigger_end(&self, v: bool) {
        self.trigger_end.store(v, Ordering::Release);
    }
    pub fn trigger_ready(&self) -> bool {
        self.trigger_ready.load(Ordering::Acquire)
    }
    pub fn set_trigger_ready(&self, v: bool) {
        self.trigger_ready.store(v, Ordering::Release);
    }
    pub fn echo_init_tick(&self) -> u32 {
        self.echo_init_tick.load(Ordering::Acquire)
    }
    pub fn set_echo_init_tick(&self, v: u32) {
        self.echo_init_tick.store(v, Ordering::Release);
    }
    pub fn echo_end_tick(&self) -> u32 {
        self.echo_end_tick.load(Ordering::Acquire)
    }
    pub fn set_echo_end_tick(&self, v: u32) {
        self.echo_end_tick.store(v, Ordering::Release);
    }
    pub fn echo_overflows(&self) -> u32 {
        self.echo_overflows.load(Ordering::Acquire)
    }
    pub fn set_echo_overflows(&self, v: u32) {
        self.echo_overflows.store(v, Ordering::Release);
    }

    pub fn is_trigger_high(&self) -> bool {
        self.trigger_high.load(Ordering::Acquire)
    }
    pub fn is_trigger_timer_on(&self) -> bool {
        self.trigger_timer_on.load(Ordering::Acquire)
    }
    pub fn is_echo_timer_on(&self) -> bool {
        self.echo_timer_on.load(Ordering::Acquire)
    }
    pub fn is_measurement_timer_on(&self) -> bool {
        self.measurement_timer_on.load(Ordering::Acquire)
    }
}
