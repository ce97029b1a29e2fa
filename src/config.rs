//! System configuration parameters
//!
//! All tunable timing parameters for the Urbanite controller.  Values can be
//! overridden by a JSON document passed to the process at start-up.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    // --- Button press classification ---
    /// Presses longer than this toggle the system ON/OFF (ms)
    pub on_off_press_time_ms: u32,
    /// Presses at least this long (and shorter than ON/OFF) pause the display (ms)
    pub pause_display_time_ms: u32,
    /// Presses longer than this enter or leave emergency mode (ms)
    pub emergency_time_ms: u32,

    // --- Button ---
    /// Anti-bounce settling time (ms)
    pub button_debounce_ms: u32,

    // --- Emergency ---
    /// Duration of each half of the emergency blink (ms)
    pub emergency_blink_ms: u32,

    // --- Ultrasound ---
    /// Period of the "ready for a new measurement" timer (ms)
    pub measurement_period_ms: u32,
    /// Length of the trigger pulse (us)
    pub trigger_pulse_us: u32,

    // --- Device ids ---
    pub button_id: u32,
    pub ultrasound_id: u32,
    pub display_id: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            on_off_press_time_ms: 1000,
            pause_display_time_ms: 250,
            emergency_time_ms: 3000,

            button_debounce_ms: 150,

            emergency_blink_ms: 1000,

            measurement_period_ms: 100,
            trigger_pulse_us: 10,

            button_id: 0,
            ultrasound_id: 0,
            display_id: 0,
        }
    }
}

impl SystemConfig {
    /// Parse a JSON document and validate the result.  Missing fields take
    /// their default values.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations whose press bands would overlap or collapse.
    pub fn validate(&self) -> Result<()> {
        if self.pause_display_time_ms > self.on_off_press_time_ms {
            return Err(Error::Config(
                "pause_display_time_ms must not exceed on_off_press_time_ms",
            ));
        }
        if self.on_off_press_time_ms >= self.emergency_time_ms {
            return Err(Error::Config(
                "emergency_time_ms must exceed on_off_press_time_ms",
            ));
        }
        if self.button_debounce_ms == 0 {
            return Err(Error::Config("button_debounce_ms must be non-zero"));
        }
        if self.emergency_blink_ms == 0 {
            return Err(Error::Config("emergency_blink_ms must be non-zero"));
        }
        if self.measurement_period_ms == 0 {
            return Err(Error::Config("measurement_period_ms must be non-zero"));
        }
        if self.trigger_pulse_us == 0 {
            return Err(Error::Config("trigger_pulse_us must be non-zero"));
        }
        Ok(())
    }
}
