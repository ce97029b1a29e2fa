//! Push-button input line.
//!
//! ## Hardware
//!
//! Active-low momentary switch with pull-up.  The GPIO interrupt fires on
//! both edges; the handler samples the pin and stores the inverted level
//! ("pressed") into an atomic.  Debouncing and press timing are done by the
//! button FSM in the polling loop, not here.

use core::sync::atomic::{AtomicBool, Ordering};

/// Per-button record shared between the edge interrupt and the polling loop.
#[derive(Debug, Default)]
pub struct ButtonLine {
    pressed: AtomicBool,
}

impl ButtonLine {
    pub const fn new() -> Self {
        Self {
            pressed: AtomicBool::new(false),
        }
    }

    /// Edge interrupt handler.  `pin_level` is the sampled GPIO level;
    /// the switch is active-low, so a low pin means pressed.
    /// Lock-free, so safe to call from interrupt context.
    pub fn on_edge(&self, pin_level: bool) {
        self.pressed.store(!pin_level, Ordering::Release);
    }

    /// Force the logical pressed state (simulation and tests).
    pub fn set_pressed(&self, pressed: bool) {
        self.pressed.store(pressed, Ordering::Release);
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed.load(Ordering::Acquire)
    }
}
