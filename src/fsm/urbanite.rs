//! System FSM: arbitrates button, ultrasound and display.
//!
//! ```text
//!                 ┌──────────[long press]───────────┐
//!                 ▼                                 │
//!   SLEEP_WHILE_OFF ◀─▶ OFF ──[long press]──▶ MEASURE ◀─▶ SLEEP_WHILE_ON
//!                                              ▲  │
//!                              [very long press]  [very long press]
//!                                              │  ▼
//!                                            EMERGENCY
//! ```
//!
//! Button press durations fall into three increasing bands: a short press
//! pauses or resumes the display, a long press switches the system on or
//! off, and a very long press toggles emergency blinking.  When none of the
//! peer machines has pending work the system drops into low-power mode.
//!
//! The emergency blink delays inside the action.  Nothing else is fired
//! while it runs.

use std::cell::RefCell;
use std::rc::Rc;

use log::info;

use super::button::ButtonFsm;
use super::display::{DisplayFsm, WARNING_MIN_CM};
use super::ultrasound::UltrasoundFsm;
use super::{Fsm, Machine, Transition};
use crate::app::ports::{ButtonPort, Clock, DisplayPort, PowerPort, UltrasoundPort};
use crate::config::SystemConfig;

/// Readings below this wake a paused display.
pub const PAUSED_ALERT_CM: u32 = WARNING_MIN_CM / 2;

/// Display distance shown during the "lit" emergency phase.
const EMERGENCY_LIT_CM: u32 = 0;
/// Display distance shown during the "dark" emergency phase.
const EMERGENCY_DARK_CM: u32 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UrbaniteState {
    #[default]
    Off,
    Measure,
    SleepWhileOff,
    SleepWhileOn,
    Emergency,
}

// ---------------------------------------------------------------------------
// Press classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressBand {
    /// `[pause_display_ms, on_off_ms)`
    PauseDisplay,
    /// `(on_off_ms, emergency_ms)`
    OnOff,
    /// `(emergency_ms, ∞)`
    Emergency,
}

/// Press-duration thresholds.  Valid when
/// `pause_display_ms <= on_off_ms < emergency_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PressThresholds {
    pub pause_display_ms: u32,
    pub on_off_ms: u32,
    pub emergency_ms: u32,
}

impl PressThresholds {
    pub fn from_config(config: &SystemConfig) -> Self {
        Self {
            pause_display_ms: config.pause_display_time_ms,
            on_off_ms: config.on_off_press_time_ms,
            emergency_ms: config.emergency_time_ms,
        }
    }

    /// Band of a completed press, or `None` for no press (0), a press
    /// too short to count, or one landing exactly on a threshold.
    pub fn classify(&self, duration_ms: u32) -> Option<PressBand> {
        if duration_ms == 0 {
            None
        } else if duration_ms > self.emergency_ms {
            Some(PressBand::Emergency)
        } else if duration_ms > self.on_off_ms && duration_ms < self.emergency_ms {
            Some(PressBand::OnOff)
        } else if duration_ms >= self.pause_display_ms && duration_ms < self.on_off_ms {
            Some(PressBand::PauseDisplay)
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Machine
// ---------------------------------------------------------------------------

pub struct UrbaniteFsm<H, D, P> {
    fsm: Fsm<Self>,
    hw: Rc<H>,
    button: Rc<RefCell<ButtonFsm<H>>>,
    ultrasound: Rc<RefCell<UltrasoundFsm<H>>>,
    display: Rc<RefCell<DisplayFsm<D>>>,
    power: P,
    thresholds: PressThresholds,
    blink_ms: u32,
    is_paused: bool,
    emergency: bool,
    /// Next blink shows the lit phase.
    emergency_phase: bool,
}

impl<H, D, P> Machine for UrbaniteFsm<H, D, P> {
    type State = UrbaniteState;

    fn engine(&self) -> &Fsm<Self> {
        &self.fsm
    }

    fn engine_mut(&mut self) -> &mut Fsm<Self> {
        &mut self.fsm
    }
}

impl<H, D, P> UrbaniteFsm<H, D, P>
where
    H: ButtonPort + UltrasoundPort + Clock,
    D: DisplayPort,
    P: PowerPort,
{
    pub fn new(
        hw: Rc<H>,
        button: Rc<RefCell<ButtonFsm<H>>>,
        ultrasound: Rc<RefCell<UltrasoundFsm<H>>>,
        display: Rc<RefCell<DisplayFsm<D>>>,
        power: P,
        config: &SystemConfig,
    ) -> Self {
        Self {
            fsm: Fsm::new("urbanite", &Self::transition_table()),
            hw,
            button,
            ultrasound,
            display,
            power,
            thresholds: PressThresholds::from_config(config),
            blink_ms: config.emergency_blink_ms,
            is_paused: false,
            emergency: false,
            emergency_phase: false,
        }
    }

    /// Row order is significant: wake checks precede the sleep self-loops,
    /// and the emergency exit precedes the blink loop.
    fn transition_table() -> [Transition<Self>; 13] {
        use UrbaniteState::{Emergency, Measure, Off, SleepWhileOff, SleepWhileOn};
        [
            Transition::new(Off, Self::check_no_activity, SleepWhileOff, Some(Self::do_sleep)),
            Transition::new(SleepWhileOff, Self::check_activity, Off, None),
            Transition::new(SleepWhileOff, Self::check_no_activity, SleepWhileOff, Some(Self::do_sleep)),
            Transition::new(Off, Self::check_on, Measure, Some(Self::do_start_up)),
            Transition::new(Measure, Self::check_pause_display, Measure, Some(Self::do_pause_display)),
            Transition::new(Measure, Self::check_new_measure, Measure, Some(Self::do_display_distance)),
            Transition::new(Measure, Self::check_no_activity, SleepWhileOn, Some(Self::do_sleep)),
            Transition::new(SleepWhileOn, Self::check_new_measure, Measure, None),
            Transition::new(SleepWhileOn, Self::check_no_activity, SleepWhileOn, Some(Self::do_sleep)),
            Transition::new(Measure, Self::check_emergency_on, Emergency, Some(Self::do_start_emergency)),
            Transition::new(Emergency, Self::check_emergency_off, Measure, Some(Self::do_stop_emergency)),
            Transition::new(Emergency, Self::check_emergency, Emergency, Some(Self::do_continue_emergency)),
            Transition::new(Measure, Self::check_off, Off, Some(Self::do_stop_urbanite)),
        ]
    }

    fn press_band(&self) -> Option<PressBand> {
        self.thresholds.classify(self.button.borrow().duration())
    }

    // ── Guards ────────────────────────────────────────────────

    fn check_on(&self) -> bool {
        self.button.borrow().duration() > self.thresholds.on_off_ms
    }

    fn check_off(&self) -> bool {
        self.press_band() == Some(PressBand::OnOff)
    }

    fn check_pause_display(&self) -> bool {
        self.press_band() == Some(PressBand::PauseDisplay)
    }

    fn check_emergency_on(&self) -> bool {
        self.press_band() == Some(PressBand::Emergency)
    }

    /// Same threshold as entry: a second very long press leaves.
    fn check_emergency_off(&self) -> bool {
        self.check_emergency_on()
    }

    fn check_emergency(&self) -> bool {
        self.emergency
    }

    fn check_new_measure(&self) -> bool {
        self.ultrasound.borrow().new_measurement_ready()
    }

    fn check_activity(&self) -> bool {
        self.ultrasound.borrow().check_activity()
            || self.display.borrow().check_activity()
            || self.button.borrow().check_activity()
    }

    fn check_no_activity(&self) -> bool {
        !self.check_activity()
    }

    // ── Actions ───────────────────────────────────────────────

    fn do_sleep(&mut self) {
        self.power.sleep();
    }

    fn do_start_up(&mut self) {
        self.button.borrow_mut().reset_duration();
        self.ultrasound.borrow_mut().start();
        self.display.borrow_mut().set_status(true);
        info!("urbanite: system ON at {} ms", self.hw.now_ms());
    }

    fn do_stop_urbanite(&mut self) {
        self.button.borrow_mut().reset_duration();
        self.ultrasound.borrow_mut().stop();
        self.display.borrow_mut().set_status(false);
        self.is_paused = false;
        info!("urbanite: system OFF at {} ms", self.hw.now_ms());
    }

    fn do_pause_display(&mut self) {
        self.button.borrow_mut().reset_duration();
        self.is_paused = !self.is_paused;
        self.display.borrow_mut().set_status(!self.is_paused);
        info!(
            "urbanite: display {} at {} ms",
            if self.is_paused { "PAUSE" } else { "RESUME" },
            self.hw.now_ms()
        );
    }

    fn do_display_distance(&mut self) {
        let distance = self.ultrasound.borrow_mut().read_distance();
        let mut display = self.display.borrow_mut();
        if !self.is_paused {
            display.set_distance(distance);
        } else if distance < PAUSED_ALERT_CM {
            display.set_distance(distance);
            display.set_status(true);
        } else {
            display.set_status(false);
        }
        info!("urbanite: distance {} cm at {} ms", distance, self.hw.now_ms());
    }

    fn do_start_emergency(&mut self) {
        self.button.borrow_mut().reset_duration();
        self.display.borrow_mut().set_status(true);
        self.ultrasound.borrow_mut().stop();
        self.emergency_phase = true;
        self.emergency = true;
        info!("urbanite: EMERGENCY ON at {} ms", self.hw.now_ms());
    }

    fn do_stop_emergency(&mut self) {
        self.button.borrow_mut().reset_duration();
        self.ultrasound.borrow_mut().start();
        if self.is_paused {
            self.display.borrow_mut().set_status(false);
        }
        self.emergency_phase = false;
        self.emergency = false;
        info!("urbanite: EMERGENCY OFF at {} ms", self.hw.now_ms());
    }

    /// One blink phase.  Blocks for the blink period.
    fn do_continue_emergency(&mut self) {
        let distance = if self.emergency_phase {
            EMERGENCY_LIT_CM
        } else {
            EMERGENCY_DARK_CM
        };
        self.display.borrow_mut().set_distance(distance);
        self.power.delay_ms(self.blink_ms);
        self.emergency_phase = !self.emergency_phase;
    }

    // ── Public API ────────────────────────────────────────────

    pub fn is_paused(&self) -> bool {
        self.is_paused
    }

    pub fn is_emergency(&self) -> bool {
        self.emergency
    }

    pub fn thresholds(&self) -> PressThresholds {
        self.thresholds
    }

    pub fn button(&self) -> &Rc<RefCell<ButtonFsm<H>>> {
        &self.button
    }

    pub fn ultrasound(&self) -> &Rc<RefCell<UltrasoundFsm<H>>> {
        &self.ultrasound
    }

    pub fn display(&self) -> &Rc<RefCell<DisplayFsm<D>>> {
        &self.display
    }

    pub fn power(&self) -> &P {
        &self.power
    }
}
