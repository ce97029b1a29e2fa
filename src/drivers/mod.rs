//! Device records and peripheral drivers.
//!
//! Records here are written by interrupt handlers and read by the
//! machines through the board registry.

pub mod button;
pub mod rgb_led;
pub mod ultrasound;
