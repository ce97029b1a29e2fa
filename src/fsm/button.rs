//! Debounced push-button FSM with press-duration measurement.
//!
//! ```text
//!  RELEASED ──[pressed]──▶ PRESSED_WAIT ──[debounce ∧ pressed]──▶ PRESSED
//!     ▲                        │                                    │
//!     │               [debounce ∧ released]                    [released]
//!     ├────────────────────────┘                                    ▼
//!     └──────────[debounce ∧ released]──────────────────── RELEASED_WAIT
//!                                                                   │
//!            PRESSED ◀──────[debounce ∧ pressed again]──────────────┘
//! ```
//!
//! The duration of the last press is latched on release and stays
//! readable until a consumer calls [`ButtonFsm::reset_duration`], which
//! makes it a one-shot "a press of this length happened" signal.

use std::rc::Rc;

use log::trace;

use super::{Fsm, Machine, Transition};
use crate::app::ports::{ButtonPort, Clock};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ButtonState {
    /// Waiting for a press.
    #[default]
    Released,
    /// Settling after the press edge.
    PressedWait,
    /// Press confirmed, waiting for release.
    Pressed,
    /// Settling after the release edge.
    ReleasedWait,
}

pub struct ButtonFsm<H> {
    fsm: Fsm<Self>,
    hw: Rc<H>,
    id: u32,
    debounce_ms: u32,
    /// Tick at which the current settling window opened.
    edge_tick: u32,
    /// Tick of the (debounced) press edge.
    press_started_at: u32,
    /// Duration of the last completed press; 0 once consumed.
    duration_ms: u32,
}

impl<H> Machine for ButtonFsm<H> {
    type State = ButtonState;

    fn engine(&self) -> &Fsm<Self> {
        &self.fsm
    }

    fn engine_mut(&mut self) -> &mut Fsm<Self> {
        &mut self.fsm
    }
}

impl<H: ButtonPort + Clock> ButtonFsm<H> {
    pub fn new(hw: Rc<H>, debounce_ms: u32, id: u32) -> Self {
        Self {
            fsm: Fsm::new("button", &Self::transition_table()),
            hw,
            id,
            debounce_ms,
            edge_tick: 0,
            press_started_at: 0,
            duration_ms: 0,
        }
    }

    fn transition_table() -> [Transition<Self>; 6] {
        use ButtonState::{Pressed, PressedWait, Released, ReleasedWait};
        [
            Transition::new(Released, Self::check_pressed, PressedWait, Some(Self::do_store_edge_tick)),
            Transition::new(PressedWait, Self::check_settled_pressed, Pressed, Some(Self::do_store_press_start)),
            Transition::new(PressedWait, Self::check_settled_released, Released, None),
            Transition::new(Pressed, Self::check_released, ReleasedWait, Some(Self::do_store_duration)),
            Transition::new(ReleasedWait, Self::check_settled_released, Released, None),
            Transition::new(ReleasedWait, Self::check_settled_pressed, Pressed, None),
        ]
    }

    // ── Guards ────────────────────────────────────────────────

    fn check_pressed(&self) -> bool {
        self.hw.is_pressed(self.id)
    }

    fn check_released(&self) -> bool {
        !self.hw.is_pressed(self.id)
    }

    fn settled(&self) -> bool {
        self.hw.now_ms().wrapping_sub(self.edge_tick) >= self.debounce_ms
    }

    fn check_settled_pressed(&self) -> bool {
        self.settled() && self.check_pressed()
    }

    fn check_settled_released(&self) -> bool {
        self.settled() && self.check_released()
    }

    // ── Actions ───────────────────────────────────────────────

    fn do_store_edge_tick(&mut self) {
        self.edge_tick = self.hw.now_ms();
    }

    /// The press is genuine: it started at the edge that opened the
    /// settling window.
    fn do_store_press_start(&mut self) {
        self.press_started_at = self.edge_tick;
    }

    fn do_store_duration(&mut self) {
        let now = self.hw.now_ms();
        self.duration_ms = now.wrapping_sub(self.press_started_at);
        self.edge_tick = now;
        trace!("button[{}]: released after {} ms", self.id, self.duration_ms);
    }

    // ── Public API ────────────────────────────────────────────

    /// Duration of the last press in ms.  After a rejected release bounce
    /// the press continues and the value is recomputed from the original
    /// press start on the next release.
    pub fn duration(&self) -> u32 {
        self.duration_ms
    }

    /// Mark the last press as consumed.
    pub fn reset_duration(&mut self) {
        self.duration_ms = 0;
    }

    /// `true` while a press is in progress or settling.
    pub fn check_activity(&self) -> bool {
        self.state() != ButtonState::Released
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn debounce_ms(&self) -> u32 {
        self.debounce_ms
    }
}
