//! Hardware registry: bridges per-device records to the port traits.
//!
//! [`Board`] owns one record per registered device id (button lines,
//! ultrasound channels, indicator latches) plus the system tick, and
//! exposes them through [`Clock`], [`ButtonPort`], [`UltrasoundPort`] and
//! [`DisplayPort`].  Machines receive a shared reference at construction;
//! interrupt handlers reach the same records through the accessor methods.
//!
//! Lookups with an unregistered id return `None`; the port implementations
//! turn that into an inert default and log a warning.

use heapless::FnvIndexMap;
use log::warn;

use crate::adapters::time::SysTick;
use crate::app::ports::{ButtonPort, Clock, DisplayPort, UltrasoundPort};
use crate::config::SystemConfig;
use crate::drivers::button::ButtonLine;
use crate::drivers::rgb_led::{ColourLatch, Rgb};
use crate::drivers::ultrasound::UltrasoundChannel;
use crate::error::{DeviceKind, Error, Result};

/// Maximum devices of each kind (power of two for the index map).
pub const MAX_DEVICES: usize = 4;

/// Concrete hardware collaborator: device records keyed by id.
#[derive(Default)]
pub struct Board {
    systick: SysTick,
    buttons: FnvIndexMap<u32, ButtonLine, MAX_DEVICES>,
    ultrasounds: FnvIndexMap<u32, UltrasoundChannel, MAX_DEVICES>,
    displays: FnvIndexMap<u32, ColourLatch, MAX_DEVICES>,
}

impl Board {
    /// An empty board with the tick at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// A board with one button, ultrasound and display registered under
    /// the ids named in `config`.
    pub fn from_config(config: &SystemConfig) -> Result<Self> {
        let mut board = Self::new();
        board.register_button(config.button_id)?;
        board.register_ultrasound(config.ultrasound_id)?;
        board.register_display(config.display_id)?;
        Ok(board)
    }

    // ── Registration ──────────────────────────────────────────

    pub fn register_button(&mut self, id: u32) -> Result<()> {
        insert_unique(&mut self.buttons, DeviceKind::Button, id, ButtonLine::new())
    }

    pub fn register_ultrasound(&mut self, id: u32) -> Result<()> {
        insert_unique(
            &mut self.ultrasounds,
            DeviceKind::Ultrasound,
            id,
            UltrasoundChannel::new(),
        )
    }

    pub fn register_display(&mut self, id: u32) -> Result<()> {
        insert_unique(&mut self.displays, DeviceKind::Display, id, ColourLatch::new())
    }

    // ── Record access (interrupt handlers, simulator, tests) ──

    pub fn systick(&self) -> &SysTick {
        &self.systick
    }

    pub fn button(&self, id: u32) -> Option<&ButtonLine> {
        self.buttons.get(&id)
    }

    pub fn ultrasound(&self, id: u32) -> Option<&UltrasoundChannel> {
        self.ultrasounds.get(&id)
    }

    /// Last colour rendered on display `id`.
    pub fn display_colour(&self, id: u32) -> Option<Rgb> {
        self.displays.get(&id).map(ColourLatch::load)
    }

    fn button_or_warn(&self, id: u32) -> Option<&ButtonLine> {
        let line = self.button(id);
        if line.is_none() {
            warn!("board: {}", Error::UnknownDevice { kind: DeviceKind::Button, id });
        }
        line
    }

    fn ultrasound_or_warn(&self, id: u32) -> Option<&UltrasoundChannel> {
        let channel = self.ultrasound(id);
        if channel.is_none() {
            warn!("board: {}", Error::UnknownDevice { kind: DeviceKind::Ultrasound, id });
        }
        channel
    }
}

fn insert_unique<V>(
    map: &mut FnvIndexMap<u32, V, MAX_DEVICES>,
    kind: DeviceKind,
    id: u32,
    record: V,
) -> Result<()> {
    if map.contains_key(&id) {
        return Err(Error::DuplicateDevice { kind, id });
    }
    map.insert(id, record)
        .map(|_| ())
        .map_err(|_| Error::RegistryFull(kind))
}

// ── Clock ─────────────────────────────────────────────────────

impl Clock for Board {
    fn now_ms(&self) -> u32 {
        self.systick.now_ms()
    }
}

// ── ButtonPort ────────────────────────────────────────────────

impl ButtonPort for Board {
    fn is_pressed(&self, id: u32) -> bool {
        self.button_or_warn(id).is_some_and(ButtonLine::is_pressed)
    }
}

// ── UltrasoundPort ────────────────────────────────────────────

impl UltrasoundPort for Board {
    fn start_measurement(&self, id: u32) {
        if let Some(ch) = self.ultrasound_or_warn(id) {
            ch.start_measurement();
        }
    }

    fn stop_trigger_timer(&self, id: u32) {
        if let Some(ch) = self.ultrasound_or_warn(id) {
            ch.stop_trigger_timer();
        }
    }

    fn stop_echo_timer(&self, id: u32) {
        if let Some(ch) = self.ultrasound_or_warn(id) {
            ch.stop_echo_timer();
        }
    }

    fn start_new_measurement_timer(&self, id: u32) {
        if let Some(ch) = self.ultrasound_or_warn(id) {
            ch.start_measurement_timer();
        }
    }

    fn stop_new_measurement_timer(&self, id: u32) {
        if let Some(ch) = self.ultrasound_or_warn(id) {
            ch.stop_measurement_timer();
        }
    }

    fn reset_echo_ticks(&self, id: u32) {
        if let Some(ch) = self.ultrasound_or_warn(id) {
            ch.reset_echo_ticks();
        }
    }

    fn echo_init_tick(&self, id: u32) -> u32 {
        self.ultrasound_or_warn(id).map_or(0, UltrasoundChannel::echo_init_tick)
    }

    fn set_echo_init_tick(&self, id: u32, tick: u32) {
        if let Some(ch) = self.ultrasound_or_warn(id) {
            ch.set_echo_init_tick(tick);
        }
    }

    fn echo_end_tick(&self, id: u32) -> u32 {
        self.ultrasound_or_warn(id).map_or(0, UltrasoundChannel::echo_end_tick)
    }

    fn set_echo_end_tick(&self, id: u32, tick: u32) {
        if let Some(ch) = self.ultrasound_or_warn(id) {
            ch.set_echo_end_tick(tick);
        }
    }

    fn echo_overflows(&self, id: u32) -> u32 {
        self.ultrasound_or_warn(id).map_or(0, UltrasoundChannel::echo_overflows)
    }

    fn set_echo_overflows(&self, id: u32, overflows: u32) {
        if let Some(ch) = self.ultrasound_or_warn(id) {
            ch.set_echo_overflows(overflows);
        }
    }

    fn echo_received(&self, id: u32) -> bool {
        self.ultrasound_or_warn(id).is_some_and(UltrasoundChannel::echo_received)
    }

    fn set_echo_received(&self, id: u32, received: bool) {
        if let Some(ch) = self.ultrasound_or_warn(id) {
            ch.set_echo_received(received);
        }
    }

    fn trigger_end(&self, id: u32) -> bool {
        self.ultrasound_or_warn(id).is_some_and(UltrasoundChannel::trigger_end)
    }

    fn set_trigger_end(&self, id: u32, end: bool) {
        if let Some(ch) = self.ultrasound_or_warn(id) {
            ch.set_trigger_end(end);
        }
    }

    fn trigger_ready(&self, id: u32) -> bool {
        self.ultrasound_or_warn(id).is_some_and(UltrasoundChannel::trigger_ready)
    }

    fn set_trigger_ready(&self, id: u32, ready: bool) {
        if let Some(ch) = self.ultrasound_or_warn(id) {
            ch.set_trigger_ready(ready);
        }
    }
}

// ── DisplayPort ───────────────────────────────────────────────

impl DisplayPort for Board {
    fn set_rgb(&self, id: u32, colour: Rgb) {
        match self.displays.get(&id) {
            Some(latch) => latch.store(colour),
            None => warn!("board: {}", Error::UnknownDevice { kind: DeviceKind::Display, id }),
        }
    }
}
