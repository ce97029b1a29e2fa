//! Low-power and blocking-delay primitives for the system FSM.
//!
//! On the microcontroller `sleep` is a wait-for-interrupt with SysTick
//! suspended; any button edge or timer interrupt wakes the core and the
//! polling loop resumes.  [`SimPower`] is the host rendition: it counts
//! low-power entries and turns blocking delays into tick advances, optionally
//! pacing them in real time.

use std::rc::Rc;
use std::time::Duration;

use embedded_hal::delay::DelayNs;
use log::trace;

use crate::adapters::hardware::Board;
use crate::app::ports::{Clock, PowerPort};

pub struct SimPower {
    board: Rc<Board>,
    realtime: bool,
    sleeps: u32,
    sub_ms_ns: u32,
}

impl SimPower {
    /// Delays advance the board tick instantly.
    pub fn new(board: Rc<Board>) -> Self {
        Self {
            board,
            realtime: false,
            sleeps: 0,
            sub_ms_ns: 0,
        }
    }

    /// Delays advance the board tick and also block the host thread.
    pub fn realtime(board: Rc<Board>) -> Self {
        Self {
            realtime: true,
            ..Self::new(board)
        }
    }

    /// How many times the system entered low-power mode.
    pub fn sleep_count(&self) -> u32 {
        self.sleeps
    }

    fn advance_ms(&mut self, ms: u32) {
        if ms == 0 {
            return;
        }
        self.board.systick().advance(ms);
        if self.realtime {
            std::thread::sleep(Duration::from_millis(u64::from(ms)));
        }
    }
}

impl DelayNs for SimPower {
    fn delay_ns(&mut self, ns: u32) {
        let total = self.sub_ms_ns + ns % 1_000_000;
        self.sub_ms_ns = total % 1_000_000;
        self.advance_ms(ns / 1_000_000 + total / 1_000_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.advance_ms(ms);
    }
}

impl PowerPort for SimPower {
    fn sleep(&mut self) {
        self.sleeps = self.sleeps.saturating_add(1);
        trace!("power: low-power wait at {} ms", self.board.now_ms());
    }
}
