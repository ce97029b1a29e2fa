//! Ultrasound ranger FSM.
//!
//! ```text
//!  WAIT_START ──▶ TRIGGER_START ──▶ WAIT_ECHO_START ──▶ WAIT_ECHO_END ──▶ SET_DISTANCE
//!      ▲               ▲                                                      │
//!      │               └───────────────[enabled ∧ ready]──────────────────────┤
//!      └───────────────────────────────[disabled]─────────────────────────────┘
//! ```
//!
//! One cycle fires a trigger pulse, waits for both echo edges and turns the
//! echo width into a distance sample.  Samples accumulate in a fixed
//! window; when the window fills it is sorted and its median is published
//! as the new distance, and the window starts over.

use std::rc::Rc;

use heapless::Vec;
use log::{debug, trace};

use super::{Fsm, Machine, Transition};
use crate::app::ports::UltrasoundPort;
use crate::drivers::ultrasound::ECHO_TIMER_PERIOD_TICKS;

/// Samples per published median.
pub const NUM_MEASUREMENTS: usize = 5;

/// Round-trip echo time per centimetre, in tenths of a microsecond.
const ECHO_TENTHS_US_PER_CM: u64 = 583;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UltrasoundState {
    #[default]
    WaitStart,
    TriggerStart,
    WaitEchoStart,
    WaitEchoEnd,
    SetDistance,
}

// ---------------------------------------------------------------------------
// Pure helpers
// ---------------------------------------------------------------------------

/// Echo timer ticks between the rising and falling edge.
///
/// A falling edge captured below the rising edge means the counter wrapped
/// once in between; that wrap is already counted in `overflows`, so one
/// overflow is discounted.
pub fn ticks_elapsed(init: u32, end: u32, overflows: u32) -> u64 {
    let period = u64::from(ECHO_TIMER_PERIOD_TICKS);
    let (base, overflows) = if end < init {
        (
            period - u64::from(init) + u64::from(end),
            overflows.saturating_sub(1),
        )
    } else {
        (u64::from(end - init), overflows)
    };
    base + u64::from(overflows) * period
}

/// Convert 1 µs ticks to centimetres (58.3 µs per cm).
pub fn ticks_to_distance_cm(ticks: u64) -> u32 {
    let cm = ticks.saturating_mul(10) / ECHO_TENTHS_US_PER_CM;
    u32::try_from(cm).unwrap_or(u32::MAX)
}

/// Sort `samples` in place and return their median.  An even count yields
/// the mean of the two middle values; an empty slice yields 0.
pub fn median(samples: &mut [u32]) -> u32 {
    samples.sort_unstable();
    let n = samples.len();
    match n {
        0 => 0,
        _ if n % 2 == 1 => samples[n / 2],
        _ => {
            let sum = u64::from(samples[n / 2 - 1]) + u64::from(samples[n / 2]);
            (sum / 2) as u32
        }
    }
}

// ---------------------------------------------------------------------------
// Machine
// ---------------------------------------------------------------------------

pub struct UltrasoundFsm<H> {
    fsm: Fsm<Self>,
    hw: Rc<H>,
    id: u32,
    enabled: bool,
    distance_cm: u32,
    samples: Vec<u32, NUM_MEASUREMENTS>,
    new_measurement: bool,
}

impl<H> Machine for UltrasoundFsm<H> {
    type State = UltrasoundState;

    fn engine(&self) -> &Fsm<Self> {
        &self.fsm
    }

    fn engine_mut(&mut self) -> &mut Fsm<Self> {
        &mut self.fsm
    }
}

impl<H: UltrasoundPort> UltrasoundFsm<H> {
    /// A disabled sensor.  Call [`start`](Self::start) to begin ranging.
    pub fn new(hw: Rc<H>, id: u32) -> Self {
        Self {
            fsm: Fsm::new("ultrasound", &Self::transition_table()),
            hw,
            id,
            enabled: false,
            distance_cm: 0,
            samples: Vec::new(),
            new_measurement: false,
        }
    }

    fn transition_table() -> [Transition<Self>; 9] {
        use UltrasoundState::{SetDistance, TriggerStart, WaitEchoEnd, WaitEchoStart, WaitStart};
        [
            Transition::new(WaitStart, Self::check_on, TriggerStart, Some(Self::do_start_measurement)),
            Transition::new(TriggerStart, Self::check_trigger_end, WaitEchoStart, Some(Self::do_stop_trigger)),
            Transition::new(TriggerStart, Self::check_off, WaitStart, Some(Self::do_stop_measurement)),
            Transition::new(WaitEchoStart, Self::check_echo_init, WaitEchoEnd, None),
            Transition::new(WaitEchoStart, Self::check_off, WaitStart, Some(Self::do_stop_measurement)),
            Transition::new(WaitEchoEnd, Self::check_echo_received, SetDistance, Some(Self::do_set_distance)),
            Transition::new(WaitEchoEnd, Self::check_off, WaitStart, Some(Self::do_stop_measurement)),
            Transition::new(SetDistance, Self::check_on, TriggerStart, Some(Self::do_start_measurement)),
            Transition::new(SetDistance, Self::check_off, WaitStart, Some(Self::do_stop_measurement)),
        ]
    }

    // ── Guards ────────────────────────────────────────────────

    fn check_on(&self) -> bool {
        self.enabled && self.hw.trigger_ready(self.id)
    }

    fn check_off(&self) -> bool {
        !self.enabled
    }

    fn check_trigger_end(&self) -> bool {
        self.hw.trigger_end(self.id)
    }

    fn check_echo_init(&self) -> bool {
        self.hw.echo_init_tick(self.id) > 0
    }

    fn check_echo_received(&self) -> bool {
        self.hw.echo_received(self.id)
    }

    // ── Actions ───────────────────────────────────────────────

    fn do_start_measurement(&mut self) {
        self.hw.start_measurement(self.id);
    }

    fn do_stop_trigger(&mut self) {
        self.hw.stop_trigger_timer(self.id);
        self.hw.set_trigger_end(self.id, false);
    }

    fn do_set_distance(&mut self) {
        let ticks = ticks_elapsed(
            self.hw.echo_init_tick(self.id),
            self.hw.echo_end_tick(self.id),
            self.hw.echo_overflows(self.id),
        );
        let sample = ticks_to_distance_cm(ticks);
        trace!("ultrasound[{}]: sample {} cm ({} ticks)", self.id, sample, ticks);
        self.push_sample(sample);

        self.hw.stop_echo_timer(self.id);
        self.hw.reset_echo_ticks(self.id);
    }

    fn do_stop_measurement(&mut self) {
        self.hw.stop_ultrasound(self.id);
    }

    fn push_sample(&mut self, sample: u32) {
        // The window is flushed as soon as it fills, so there is always room.
        let _ = self.samples.push(sample);
        if self.samples.is_full() {
            self.distance_cm = median(&mut self.samples);
            self.samples.clear();
            self.new_measurement = true;
            debug!("ultrasound[{}]: median {} cm", self.id, self.distance_cm);
        }
    }

    // ── Public API ────────────────────────────────────────────

    /// Enable ranging from a clean slate and arm the periodic trigger.
    pub fn start(&mut self) {
        self.enabled = true;
        self.samples.clear();
        self.distance_cm = 0;
        self.hw.reset_echo_ticks(self.id);
        self.hw.set_trigger_ready(self.id, true);
        self.hw.start_new_measurement_timer(self.id);
    }

    /// Disable ranging and stop every timer.
    pub fn stop(&mut self) {
        self.enabled = false;
        self.hw.stop_ultrasound(self.id);
    }

    /// Last published median.  Reading consumes the "new measurement" flag.
    pub fn read_distance(&mut self) -> u32 {
        self.new_measurement = false;
        self.distance_cm
    }

    /// Last published median without consuming it.
    pub fn last_distance(&self) -> u32 {
        self.distance_cm
    }

    pub fn new_measurement_ready(&self) -> bool {
        self.new_measurement
    }

    /// `true` while the periodic timer allows a new trigger.
    pub fn is_ready(&self) -> bool {
        self.hw.trigger_ready(self.id)
    }

    pub fn status(&self) -> bool {
        self.enabled
    }

    pub fn set_status(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Samples collected towards the next median.
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// The sensor never holds the system awake on its own.
    pub fn check_activity(&self) -> bool {
        false
    }

    pub fn id(&self) -> u32 {
        self.id
    }
}
