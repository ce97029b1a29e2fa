//! Port traits: the boundary between the FSM core and the hardware.
//!
//! ```text
//!   Board / drivers ──▶ Port trait ──▶ Button · Ultrasound · Display · Urbanite
//! ```
//!
//! Every machine receives its hardware through these traits at
//! construction, so the core never reaches for global peripheral state and
//! can be exercised on the host against mock adapters.
//!
//! Device-keyed operations take the numeric device id.  Implementations
//! must treat an unknown id as inert (queries return `false`/`0`, commands
//! do nothing); the core only uses ids taken from the configuration.
//!
//! Methods take `&self`: the same hardware record is shared by the polling
//! loop and by interrupt-style producers, so implementations keep their
//! state in atomics.

use embedded_hal::delay::DelayNs;

use super::events::AppEvent;
use crate::drivers::rgb_led::Rgb;

// ───────────────────────────────────────────────────────────────
// Clock
// ───────────────────────────────────────────────────────────────

/// Free-running monotonic millisecond counter (wraps at `u32::MAX`).
pub trait Clock {
    fn now_ms(&self) -> u32;
}

// ───────────────────────────────────────────────────────────────
// Button
// ───────────────────────────────────────────────────────────────

/// Raw (un-debounced) push-button level.
pub trait ButtonPort {
    /// `true` while the contact is closed.
    fn is_pressed(&self, id: u32) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Ultrasound transceiver
// ───────────────────────────────────────────────────────────────

/// Trigger/echo timing peripheral of an HC-SR04 style ranger.
///
/// The echo timer counts 1 µs ticks in a 16-bit register; the
/// interrupt side records the captured counter value at the rising
/// (`echo_init_tick`) and falling (`echo_end_tick`) echo edges and the
/// number of counter overflows in between.
pub trait UltrasoundPort {
    /// Raise the trigger line and start the trigger, echo and
    /// measurement timers.  Clears the trigger-ready flag.
    fn start_measurement(&self, id: u32);
    /// Drop the trigger line and stop the trigger timer.
    fn stop_trigger_timer(&self, id: u32);
    /// Stop the echo capture timer.
    fn stop_echo_timer(&self, id: u32);
    /// (Re)arm the periodic "ready for a new measurement" timer.
    fn start_new_measurement_timer(&self, id: u32);
    /// Stop the periodic measurement timer.
    fn stop_new_measurement_timer(&self, id: u32);
    /// Stop every timer and clear the echo capture registers.
    fn stop_ultrasound(&self, id: u32) {
        self.stop_trigger_timer(id);
        self.stop_echo_timer(id);
        self.stop_new_measurement_timer(id);
        self.reset_echo_ticks(id);
    }

    /// Clear init/end ticks, overflow count and echo-received flag.
    fn reset_echo_ticks(&self, id: u32);

    fn echo_init_tick(&self, id: u32) -> u32;
    fn set_echo_init_tick(&self, id: u32, tick: u32);
    fn echo_end_tick(&self, id: u32) -> u32;
    fn set_echo_end_tick(&self, id: u32, tick: u32);
    fn echo_overflows(&self, id: u32) -> u32;
    fn set_echo_overflows(&self, id: u32, overflows: u32);
    fn echo_received(&self, id: u32) -> bool;
    fn set_echo_received(&self, id: u32, received: bool);

    fn trigger_end(&self, id: u32) -> bool;
    fn set_trigger_end(&self, id: u32, end: bool);
    fn trigger_ready(&self, id: u32) -> bool;
    fn set_trigger_ready(&self, id: u32, ready: bool);
}

// ───────────────────────────────────────────────────────────────
// Display
// ───────────────────────────────────────────────────────────────

/// RGB indicator.
pub trait DisplayPort {
    fn set_rgb(&self, id: u32, colour: Rgb);
}

// ───────────────────────────────────────────────────────────────
// Power
// ───────────────────────────────────────────────────────────────

/// Low-power and blocking-delay primitives.
///
/// `sleep` enters a wait-for-interrupt state and returns on the next
/// relevant interrupt.  The blocking delay comes from
/// [`DelayNs`]; while it runs no other machine is fired.
pub trait PowerPort: DelayNs {
    fn sleep(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Events
// ───────────────────────────────────────────────────────────────

/// Outbound sink for structured [`AppEvent`]s.
pub trait EventSink {
    fn emit(&mut self, event: &AppEvent);
}
