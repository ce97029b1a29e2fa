//! Parking indicator FSM.
//!
//! ```text
//!  WAIT_DISPLAY ──[active]──▶ SET_DISPLAY ──[new colour]──▶ SET_DISPLAY
//!       ▲                          │
//!       └────────[inactive]────────┘
//! ```
//!
//! The indicator colour follows the obstacle distance through five bands,
//! each a linear blend between two palette colours:
//!
//! | distance (cm) | colour                |
//! |---------------|-----------------------|
//! | [0, 25]       | red → yellow          |
//! | (25, 50]      | yellow → green        |
//! | (50, 150]     | green → turquoise     |
//! | (150, 175]    | turquoise → blue      |
//! | (175, 200]    | blue                  |
//! | otherwise     | off                   |

use std::rc::Rc;

use log::trace;

use super::{Fsm, Machine, Transition};
use crate::app::ports::DisplayPort;
use crate::drivers::rgb_led::{
    COLOUR_BLUE, COLOUR_GREEN, COLOUR_OFF, COLOUR_RED, COLOUR_TURQUOISE, COLOUR_YELLOW, Rgb,
};

// ── Band limits (cm) ──────────────────────────────────────────

pub const DANGER_MIN_CM: u32 = 0;
pub const WARNING_MIN_CM: u32 = 25;
pub const NO_PROBLEM_MIN_CM: u32 = 50;
pub const INFO_MIN_CM: u32 = 150;
pub const OK_MIN_CM: u32 = 175;
pub const OK_MAX_CM: u32 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayState {
    #[default]
    WaitDisplay,
    SetDisplay,
}

/// Blend `from` into `to`; `t` = 0 gives `from`, 255 gives `to`.
pub fn interpolate(from: Rgb, to: Rgb, t: u8) -> Rgb {
    let mix = |a: u8, b: u8| -> u8 {
        let t = u32::from(t);
        (((255 - t) * u32::from(a) + t * u32::from(b) + 127) / 255) as u8
    };
    (mix(from.0, to.0), mix(from.1, to.1), mix(from.2, to.2))
}

/// Position of `distance` inside `(min, max]`, scaled to 0–255.
fn band_position(distance: u32, min: u32, max: u32) -> u8 {
    ((distance - min) * 255 / (max - min)) as u8
}

/// Indicator colour for an obstacle at `distance` cm.
pub fn compute_color(distance: u32) -> Rgb {
    let bands = [
        (DANGER_MIN_CM, WARNING_MIN_CM, COLOUR_RED, COLOUR_YELLOW),
        (WARNING_MIN_CM, NO_PROBLEM_MIN_CM, COLOUR_YELLOW, COLOUR_GREEN),
        (NO_PROBLEM_MIN_CM, INFO_MIN_CM, COLOUR_GREEN, COLOUR_TURQUOISE),
        (INFO_MIN_CM, OK_MIN_CM, COLOUR_TURQUOISE, COLOUR_BLUE),
    ];
    for (min, max, from, to) in bands {
        if distance <= max {
            return interpolate(from, to, band_position(distance, min, max));
        }
    }
    if distance <= OK_MAX_CM {
        COLOUR_BLUE
    } else {
        COLOUR_OFF
    }
}

pub struct DisplayFsm<D> {
    fsm: Fsm<Self>,
    hw: Rc<D>,
    id: u32,
    /// `None` until the first distance arrives (renders off).
    distance_cm: Option<u32>,
    status: bool,
    new_color: bool,
    idle: bool,
    /// Last colour written to the indicator.
    colour: Rgb,
}

impl<D> Machine for DisplayFsm<D> {
    type State = DisplayState;

    fn engine(&self) -> &Fsm<Self> {
        &self.fsm
    }

    fn engine_mut(&mut self) -> &mut Fsm<Self> {
        &mut self.fsm
    }
}

impl<D: DisplayPort> DisplayFsm<D> {
    pub fn new(hw: Rc<D>, id: u32) -> Self {
        let display = Self {
            fsm: Fsm::new("display", &Self::transition_table()),
            hw,
            id,
            distance_cm: None,
            status: false,
            new_color: false,
            idle: false,
            colour: COLOUR_OFF,
        };
        display.hw.set_rgb(id, COLOUR_OFF);
        display
    }

    fn transition_table() -> [Transition<Self>; 3] {
        use DisplayState::{SetDisplay, WaitDisplay};
        [
            Transition::new(WaitDisplay, Self::check_active, SetDisplay, Some(Self::do_set_on)),
            Transition::new(SetDisplay, Self::check_set_new_color, SetDisplay, Some(Self::do_set_color)),
            Transition::new(SetDisplay, Self::check_off, WaitDisplay, Some(Self::do_set_off)),
        ]
    }

    // ── Guards ────────────────────────────────────────────────

    fn check_active(&self) -> bool {
        self.status
    }

    fn check_set_new_color(&self) -> bool {
        self.new_color
    }

    fn check_off(&self) -> bool {
        !self.status
    }

    // ── Actions ───────────────────────────────────────────────

    fn render(&mut self, colour: Rgb) {
        self.hw.set_rgb(self.id, colour);
        self.colour = colour;
    }

    fn do_set_on(&mut self) {
        self.render(COLOUR_OFF);
    }

    fn do_set_color(&mut self) {
        let colour = self.distance_cm.map_or(COLOUR_OFF, compute_color);
        trace!("display[{}]: {:?} cm -> {:?}", self.id, self.distance_cm, colour);
        self.render(colour);
        self.new_color = false;
        self.idle = true;
    }

    fn do_set_off(&mut self) {
        self.render(COLOUR_OFF);
        self.idle = false;
    }

    // ── Public API ────────────────────────────────────────────

    /// Queue a new distance for rendering.
    pub fn set_distance(&mut self, distance_cm: u32) {
        self.distance_cm = Some(distance_cm);
        self.new_color = true;
    }

    pub fn distance(&self) -> Option<u32> {
        self.distance_cm
    }

    pub fn status(&self) -> bool {
        self.status
    }

    pub fn set_status(&mut self, active: bool) {
        self.status = active;
    }

    /// Colour currently shown.
    pub fn colour(&self) -> Rgb {
        self.colour
    }

    pub fn is_idle(&self) -> bool {
        self.idle
    }

    /// Active with a value not yet rendered.
    pub fn check_activity(&self) -> bool {
        self.status && !self.idle
    }

    pub fn id(&self) -> u32 {
        self.id
    }
}
