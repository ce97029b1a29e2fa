//! Outbound application events.
//!
//! [`ParkingAssist`](super::service::ParkingAssist) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them: log to the console, record them in a
//! test, forward them over a debug link.

use crate::drivers::rgb_led::Rgb;
use crate::fsm::urbanite::UrbaniteState;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// The controller has started (carries the initial system state).
    Started(UrbaniteState),

    /// The system FSM moved between states.
    StateChanged { from: UrbaniteState, to: UrbaniteState },

    /// Point-in-time status, emitted on request.
    Status(StatusSnapshot),
}

/// What an operator would want to see on a serial console.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub uptime_ms: u32,
    pub state: UrbaniteState,
    /// Last published median from the ranger.
    pub distance_cm: u32,
    pub display_active: bool,
    pub colour: Rgb,
    pub paused: bool,
    pub emergency: bool,
}
