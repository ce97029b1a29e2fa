//! Console logging adapters.
//!
//! [`LogEventSink`] implements [`EventSink`] by writing structured
//! application events through the `log` facade.  The host binary installs
//! `env_logger` as the backend; the firmware prints the same lines over
//! UART.

use log::info;

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

// ───────────────────────────────────────────────────────────────
// Event sink
// ───────────────────────────────────────────────────────────────

/// Adapter that logs every [`AppEvent`] to the console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started(state) => {
                info!("START | initial_state={:?}", state);
            }
            AppEvent::StateChanged { from, to } => {
                info!("STATE | {:?} -> {:?}", from, to);
            }
            AppEvent::Status(s) => {
                let (r, g, b) = s.colour;
                info!(
                    "STATUS | t={}ms | state={:?} | distance={}cm | display={} rgb=({},{},{}) | \
                     paused={} emergency={}",
                    s.uptime_ms,
                    s.state,
                    s.distance_cm,
                    if s.display_active { "ON" } else { "OFF" },
                    r,
                    g,
                    b,
                    s.paused,
                    s.emergency,
                );
            }
        }
    }
}
