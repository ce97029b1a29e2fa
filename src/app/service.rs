//! Application service: one controller, four machines.
//!
//! [`ParkingAssist`] builds the button, ultrasound, display and system
//! machines from a [`SystemConfig`] and fires them once per pass, always in
//! the same order.  All I/O flows through the port traits the machines were
//! built with, so the whole controller runs against mock adapters on the
//! host.
//!
//! ```text
//!  ButtonPort ─────▶ ┌───────────────────────────────────┐
//!  UltrasoundPort ─▶ │            ParkingAssist          │ ──▶ EventSink
//!  DisplayPort ◀──── │  button · ultrasound · display    │
//!  PowerPort ◀────── │            urbanite               │
//!                    └───────────────────────────────────┘
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use log::info;

use crate::config::SystemConfig;
use crate::error::Result;
use crate::fsm::Machine;
use crate::fsm::button::ButtonFsm;
use crate::fsm::display::DisplayFsm;
use crate::fsm::ultrasound::UltrasoundFsm;
use crate::fsm::urbanite::{UrbaniteFsm, UrbaniteState};

use super::events::{AppEvent, StatusSnapshot};
use super::ports::{ButtonPort, Clock, DisplayPort, EventSink, PowerPort, UltrasoundPort};

// ───────────────────────────────────────────────────────────────
// ParkingAssist
// ───────────────────────────────────────────────────────────────

pub struct ParkingAssist<H, D, P> {
    hw: Rc<H>,
    urbanite: UrbaniteFsm<H, D, P>,
    passes: u64,
}

impl<H, D, P> ParkingAssist<H, D, P>
where
    H: ButtonPort + UltrasoundPort + Clock,
    D: DisplayPort,
    P: PowerPort,
{
    /// Validate `config` and build the machines.  `hw` backs the button,
    /// ranger and clock; `display_hw` backs the indicator.
    pub fn new(hw: Rc<H>, display_hw: Rc<D>, power: P, config: &SystemConfig) -> Result<Self> {
        config.validate()?;

        let button = Rc::new(RefCell::new(ButtonFsm::new(
            Rc::clone(&hw),
            config.button_debounce_ms,
            config.button_id,
        )));
        let ultrasound = Rc::new(RefCell::new(UltrasoundFsm::new(
            Rc::clone(&hw),
            config.ultrasound_id,
        )));
        let display = Rc::new(RefCell::new(DisplayFsm::new(display_hw, config.display_id)));
        let urbanite = UrbaniteFsm::new(Rc::clone(&hw), button, ultrasound, display, power, config);

        Ok(Self {
            hw,
            urbanite,
            passes: 0,
        })
    }

    // ── Lifecycle ─────────────────────────────────────────────

    pub fn start(&mut self, sink: &mut impl EventSink) {
        let state = self.urbanite.state();
        sink.emit(&AppEvent::Started(state));
        info!("ParkingAssist started in {:?}", state);
    }

    /// One pass of the control loop: button, ultrasound, display, system.
    pub fn fire(&mut self, sink: &mut impl EventSink) {
        self.passes += 1;

        self.urbanite.button().borrow_mut().fire();
        self.urbanite.ultrasound().borrow_mut().fire();
        self.urbanite.display().borrow_mut().fire();

        let from = self.urbanite.state();
        self.urbanite.fire();
        let to = self.urbanite.state();
        if to != from {
            sink.emit(&AppEvent::StateChanged { from, to });
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn status(&self) -> StatusSnapshot {
        let display = self.urbanite.display().borrow();
        StatusSnapshot {
            uptime_ms: self.hw.now_ms(),
            state: self.urbanite.state(),
            distance_cm: self.urbanite.ultrasound().borrow().last_distance(),
            display_active: display.status(),
            colour: display.colour(),
            paused: self.urbanite.is_paused(),
            emergency: self.urbanite.is_emergency(),
        }
    }

    /// Emit a [`StatusSnapshot`] through `sink`.
    pub fn report(&self, sink: &mut impl EventSink) {
        sink.emit(&AppEvent::Status(self.status()));
    }

    pub fn state(&self) -> UrbaniteState {
        self.urbanite.state()
    }

    /// Control-loop passes since construction.
    pub fn passes(&self) -> u64 {
        self.passes
    }

    pub fn urbanite(&self) -> &UrbaniteFsm<H, D, P> {
        &self.urbanite
    }

    pub fn urbanite_mut(&mut self) -> &mut UrbaniteFsm<H, D, P> {
        &mut self.urbanite
    }
}
