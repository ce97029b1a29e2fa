//! Millisecond system tick.
//!
//! The counter is advanced by the 1 kHz SysTick interrupt (or by the
//! simulator / blocking delays on the host) and read by the FSMs through
//! the [`Clock`] port.  It is free-running and wraps at `u32::MAX`; all
//! consumers compare ticks with `wrapping_sub`.

use core::sync::atomic::{AtomicU32, Ordering};

use crate::app::ports::Clock;

#[derive(Debug, Default)]
pub struct SysTick {
    millis: AtomicU32,
}

impl SysTick {
    pub const fn new() -> Self {
        Self {
            millis: AtomicU32::new(0),
        }
    }

    /// SysTick interrupt handler: one millisecond elapsed.
    pub fn on_tick(&self) {
        self.millis.fetch_add(1, Ordering::AcqRel);
    }

    /// Advance by `ms` at once (blocking delays, simulation).
    pub fn advance(&self, ms: u32) {
        self.millis.fetch_add(ms, Ordering::AcqRel);
    }

    pub fn set_millis(&self, ms: u32) {
        self.millis.store(ms, Ordering::Release);
    }
}

impl Clock for SysTick {
    fn now_ms(&self) -> u32 {
        self.millis.load(Ordering::Acquire)
    }
}
