//! Host bench simulator.
//!
//! Plays the part of the interrupt sources on a [`Board`]: the 1 kHz
//! SysTick, the periodic measurement timer, the trigger-pulse timer, the
//! echo input capture (with 16-bit counter wraparound) and a scripted push
//! button.  Each [`step`](BenchSimulator::step) is one millisecond; the
//! control loop fires the machines between steps, exactly as the firmware
//! main loop runs between interrupts.
//!
//! The echo for a trigger arrives in the first step after the trigger line
//! drops, with both edges captured at once.  The echo width is computed
//! from the simulated obstacle distance.

use std::rc::Rc;

use log::{debug, warn};

use crate::adapters::hardware::Board;
use crate::app::ports::{Clock, DisplayPort, EventSink, PowerPort};
use crate::app::service::ParkingAssist;
use crate::config::SystemConfig;
use crate::drivers::ultrasound::ECHO_TIMER_PERIOD_TICKS;

/// Echo-timer ticks (µs) per simulation step.
const TICKS_PER_STEP: u64 = 1_000;

/// Echo width in µs for an obstacle at `cm` (58.3 µs per cm).
pub fn echo_width_us(cm: u32) -> u64 {
    u64::from(cm) * 583 / 10
}

pub struct BenchSimulator {
    board: Rc<Board>,
    button_id: u32,
    ultrasound_id: u32,
    measurement_period_ms: u32,
    trigger_pulse_us: u32,

    obstacle_cm: Option<u32>,
    /// Scheduled button edges as `(tick, pressed)`, sorted by tick.
    button_edges: Vec<(u32, bool)>,

    /// Free-running echo counter, in µs, before the 16-bit wrap.
    echo_clock_us: u64,
    period_elapsed_ms: u32,
    trigger_elapsed_us: u32,
    echoes: u32,
}

impl BenchSimulator {
    pub fn new(board: Rc<Board>, config: &SystemConfig) -> Self {
        Self {
            board,
            button_id: config.button_id,
            ultrasound_id: config.ultrasound_id,
            measurement_period_ms: config.measurement_period_ms,
            trigger_pulse_us: config.trigger_pulse_us,
            obstacle_cm: Some(100),
            button_edges: Vec::new(),
            echo_clock_us: 1,
            period_elapsed_ms: 0,
            trigger_elapsed_us: 0,
            echoes: 0,
        }
    }

    // ── Scenario control ──────────────────────────────────────

    /// Obstacle distance seen by the ranger; `None` means no echo.
    pub fn set_obstacle_cm(&mut self, cm: Option<u32>) {
        self.obstacle_cm = cm;
    }

    pub fn obstacle_cm(&self) -> Option<u32> {
        self.obstacle_cm
    }

    /// Press the button at `at_ms` and release it `hold_ms` later.
    pub fn schedule_press(&mut self, at_ms: u32, hold_ms: u32) {
        self.button_edges.push((at_ms, true));
        self.button_edges.push((at_ms.wrapping_add(hold_ms), false));
        self.button_edges.sort_by_key(|&(tick, _)| tick);
    }

    /// Drive the button line now.
    pub fn set_button(&self, pressed: bool) {
        match self.board.button(self.button_id) {
            // Active-low input.
            Some(line) => line.on_edge(!pressed),
            None => warn!("sim: no button {}", self.button_id),
        }
    }

    /// Echoes delivered so far.
    pub fn echoes(&self) -> u32 {
        self.echoes
    }

    // ── Time ──────────────────────────────────────────────────

    /// Advance one millisecond and run every interrupt source.
    pub fn step(&mut self) {
        self.board.systick().on_tick();
        self.echo_clock_us += TICKS_PER_STEP;
        self.apply_button_edges();
        self.run_ultrasound();
    }

    /// Step and fire the controller once per millisecond for `ms`.
    pub fn run<D, P>(
        &mut self,
        app: &mut ParkingAssist<Board, D, P>,
        sink: &mut impl EventSink,
        ms: u32,
    ) where
        D: DisplayPort,
        P: PowerPort,
    {
        for _ in 0..ms {
            self.step();
            app.fire(sink);
        }
    }

    fn apply_button_edges(&mut self) {
        let now = self.board.now_ms();
        let due = self.button_edges.iter().take_while(|&&(tick, _)| tick <= now).count();
        let edges: Vec<_> = self.button_edges.drain(..due).collect();
        for (_, pressed) in edges {
            self.set_button(pressed);
        }
    }

    fn run_ultrasound(&mut self) {
        let Some(ch) = self.board.ultrasound(self.ultrasound_id) else {
            return;
        };

        if ch.is_measurement_timer_on() {
            self.period_elapsed_ms += 1;
            if self.period_elapsed_ms >= self.measurement_period_ms {
                self.period_elapsed_ms = 0;
                ch.on_measurement_timer();
            }
        } else {
            self.period_elapsed_ms = 0;
        }

        if ch.is_trigger_high() && ch.is_trigger_timer_on() {
            self.trigger_elapsed_us = self.trigger_elapsed_us.saturating_add(1_000);
            if self.trigger_elapsed_us >= self.trigger_pulse_us {
                ch.on_trigger_timer();
            }
            return;
        }
        self.trigger_elapsed_us = 0;

        let awaiting_echo = ch.is_echo_timer_on() && ch.echo_init_tick() == 0 && !ch.echo_received();
        if let (true, Some(cm)) = (awaiting_echo, self.obstacle_cm) {
            self.deliver_echo(cm);
        }
    }

    /// Capture both echo edges for an obstacle at `cm`.
    fn deliver_echo(&mut self, cm: u32) {
        let Some(ch) = self.board.ultrasound(self.ultrasound_id) else {
            return;
        };
        let period = u64::from(ECHO_TIMER_PERIOD_TICKS);

        // A rising-edge capture of 0 would read as "no edge yet".
        let mut rise = self.echo_clock_us;
        if rise % period == 0 {
            rise += 1;
        }
        let fall = rise + echo_width_us(cm);

        ch.on_echo_capture((rise % period) as u32);
        for _ in 0..(fall / period - rise / period) {
            ch.on_echo_overflow();
        }
        ch.on_echo_capture((fall % period) as u32);

        self.echo_clock_us = fall;
        self.echoes += 1;
        debug!("sim: echo for {} cm ({} -> {})", cm, rise % period, fall % period);
    }
}
