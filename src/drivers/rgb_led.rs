//! RGB parking indicator driver.
//!
//! Three PWM channels drive the R/G/B dies of a common-cathode LED.  Any
//! `embedded_hal::pwm::SetDutyCycle` implementation will do; colour
//! components (0–255) are mapped to a duty fraction of 255.
//!
//! The driver implements [`DisplayPort`] for the single display id it was
//! built with, so it can back a display FSM directly without going through
//! the board registry.

use core::cell::RefCell;
use core::sync::atomic::{AtomicU32, Ordering};

use embedded_hal::pwm::SetDutyCycle;
use log::warn;

use crate::app::ports::DisplayPort;

/// Colour as (R, G, B) tuple, each 0–255.
pub type Rgb = (u8, u8, u8);

// ── Indicator palette ─────────────────────────────────────────

pub const COLOUR_RED: Rgb = (255, 0, 0);
pub const COLOUR_YELLOW: Rgb = (94, 94, 0);
pub const COLOUR_GREEN: Rgb = (0, 255, 0);
pub const COLOUR_TURQUOISE: Rgb = (26, 89, 82);
pub const COLOUR_BLUE: Rgb = (0, 0, 255);
pub const COLOUR_OFF: Rgb = (0, 0, 0);

/// Last colour written to a registry-managed indicator, packed `0x00RRGGBB`.
#[derive(Debug, Default)]
pub struct ColourLatch {
    packed: AtomicU32,
}

impl ColourLatch {
    pub const fn new() -> Self {
        Self {
            packed: AtomicU32::new(0),
        }
    }

    pub fn store(&self, (r, g, b): Rgb) {
        let packed = (u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b);
        self.packed.store(packed, Ordering::Release);
    }

    pub fn load(&self) -> Rgb {
        let packed = self.packed.load(Ordering::Acquire);
        ((packed >> 16) as u8, (packed >> 8) as u8, packed as u8)
    }
}

struct Channels<R, G, B> {
    red: R,
    green: G,
    blue: B,
    current: Rgb,
}

/// PWM-backed RGB LED bound to one display id.
pub struct RgbLed<R, G, B> {
    id: u32,
    channels: RefCell<Channels<R, G, B>>,
}

impl<R, G, B> RgbLed<R, G, B>
where
    R: SetDutyCycle,
    G: SetDutyCycle,
    B: SetDutyCycle,
{
    pub fn new(id: u32, red: R, green: G, blue: B) -> Self {
        Self {
            id,
            channels: RefCell::new(Channels {
                red,
                green,
                blue,
                current: COLOUR_OFF,
            }),
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn set_colour(&self, (r, g, b): Rgb) {
        let mut ch = self.channels.borrow_mut();
        let results = [
            ch.red.set_duty_cycle_fraction(r as u16, 255).is_ok(),
            ch.green.set_duty_cycle_fraction(g as u16, 255).is_ok(),
            ch.blue.set_duty_cycle_fraction(b as u16, 255).is_ok(),
        ];
        if results.contains(&false) {
            warn!("rgb_led[{}]: PWM write failed for ({}, {}, {})", self.id, r, g, b);
        }
        ch.current = (r, g, b);
    }

    pub fn off(&self) {
        self.set_colour(COLOUR_OFF);
    }

    pub fn current_colour(&self) -> Rgb {
        self.channels.borrow().current
    }
}

impl<R, G, B> DisplayPort for RgbLed<R, G, B>
where
    R: SetDutyCycle,
    G: SetDutyCycle,
    B: SetDutyCycle,
{
    fn set_rgb(&self, id: u32, colour: Rgb) {
        if id != self.id {
            warn!("rgb_led[{}]: ignoring colour for display id {}", self.id, id);
            return;
        }
        self.set_colour(colour);
    }
}
