//! Machine-level integration tests against recorded mock hardware.
//!
//! These pin down the exact port traffic each machine produces: which
//! timers are started and stopped, which colours are rendered, how often
//! the system sleeps and how long the emergency blink blocks.

use std::rc::Rc;

use urbanite::app::events::AppEvent;
use urbanite::app::service::ParkingAssist;
use urbanite::config::SystemConfig;
use core::convert::Infallible;

use embedded_hal::pwm::{ErrorType, SetDutyCycle};
use urbanite::drivers::rgb_led::{COLOUR_OFF, COLOUR_RED, RgbLed};
use urbanite::fsm::Machine;
use urbanite::fsm::display::{DisplayFsm, compute_color};
use urbanite::fsm::ultrasound::{UltrasoundFsm, UltrasoundState};
use urbanite::fsm::urbanite::UrbaniteState;

use crate::mock_hw::{HwCall, MockHardware, MockPower, RecordingSink};

type App = ParkingAssist<MockHardware, MockHardware, MockPower>;

fn make_app() -> (Rc<MockHardware>, App, RecordingSink) {
    let hw = MockHardware::new();
    let power = MockPower::new(Rc::clone(&hw));
    let app = ParkingAssist::new(Rc::clone(&hw), Rc::clone(&hw), power, &SystemConfig::default())
        .unwrap();
    (hw, app, RecordingSink::default())
}

/// Let the button settle, hold it for `ms`, release it and fire once more.
fn hold(hw: &MockHardware, app: &mut App, sink: &mut RecordingSink, ms: u32) {
    hw.now.set(hw.now.get() + 200);
    app.fire(sink);
    let start = hw.now.get();
    hw.pressed.set(true);
    for t in start..start + ms {
        hw.now.set(t);
        app.fire(sink);
    }
    hw.pressed.set(false);
    hw.now.set(start + ms);
    app.fire(sink);
}

// ── Ultrasound ────────────────────────────────────────────────

#[test]
fn ultrasound_cycle_port_traffic() {
    let hw = MockHardware::new();
    let mut sensor = UltrasoundFsm::new(Rc::clone(&hw), 0);

    sensor.start();
    assert_eq!(hw.take_calls(), vec![HwCall::ResetEcho, HwCall::StartPeriodic]);
    assert!(hw.trigger_ready.get());

    sensor.fire();
    assert_eq!(hw.take_calls(), vec![HwCall::StartMeasurement]);

    hw.trigger_end.set(true);
    sensor.fire();
    assert_eq!(hw.take_calls(), vec![HwCall::StopTrigger]);
    assert!(!hw.trigger_end.get());

    hw.echo(1000, 1500, 0);
    sensor.fire();
    assert_eq!(sensor.state(), UltrasoundState::WaitEchoEnd);
    sensor.fire();
    assert_eq!(sensor.state(), UltrasoundState::SetDistance);
    assert_eq!(hw.take_calls(), vec![HwCall::StopEcho, HwCall::ResetEcho]);
    assert_eq!(sensor.sample_count(), 1);
}

#[test]
fn ultrasound_publishes_window_median() {
    let hw = MockHardware::new();
    let mut sensor = UltrasoundFsm::new(Rc::clone(&hw), 0);
    sensor.start();

    for cm in [10u32, 200, 30, 150, 50] {
        hw.trigger_ready.set(true);
        sensor.fire();
        hw.trigger_end.set(true);
        sensor.fire();
        hw.echo(2000, 2000 + cm * 583 / 10, 0);
        sensor.fire();
        sensor.fire();
    }

    assert!(sensor.new_measurement_ready());
    assert_eq!(sensor.sample_count(), 0);
    assert_eq!(sensor.read_distance(), 50);
    assert!(!sensor.new_measurement_ready());
}

#[test]
fn ultrasound_stop_mid_cycle_stops_all_timers() {
    let hw = MockHardware::new();
    let mut sensor = UltrasoundFsm::new(Rc::clone(&hw), 0);
    sensor.start();
    sensor.fire();
    hw.take_calls();

    sensor.stop();
    assert_eq!(
        hw.take_calls(),
        vec![HwCall::StopTrigger, HwCall::StopEcho, HwCall::StopPeriodic, HwCall::ResetEcho]
    );
    sensor.fire();
    assert_eq!(sensor.state(), UltrasoundState::WaitStart);
}

// ── Display ───────────────────────────────────────────────────

#[test]
fn display_renders_through_the_port() {
    let hw = MockHardware::new();
    let mut display = DisplayFsm::new(Rc::clone(&hw), 0);
    assert_eq!(hw.colours(), vec![COLOUR_OFF]);

    display.set_status(true);
    display.fire();
    display.set_distance(0);
    display.fire();
    display.set_distance(120);
    display.fire();
    display.set_status(false);
    display.fire();

    assert_eq!(
        hw.colours(),
        vec![COLOUR_OFF, COLOUR_OFF, COLOUR_RED, compute_color(120), COLOUR_OFF]
    );
}

/// PWM channel that only remembers its duty.
struct Duty(u16);

impl ErrorType for Duty {
    type Error = Infallible;
}

impl SetDutyCycle for Duty {
    fn max_duty_cycle(&self) -> u16 {
        255
    }
    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Infallible> {
        self.0 = duty;
        Ok(())
    }
}

#[test]
fn display_drives_a_pwm_led() {
    let led = Rc::new(RgbLed::new(2, Duty(0), Duty(0), Duty(0)));
    let mut display = DisplayFsm::new(Rc::clone(&led), 2);

    display.set_status(true);
    display.fire();
    display.set_distance(60);
    display.fire();
    assert_eq!(led.current_colour(), compute_color(60));

    display.set_status(false);
    display.fire();
    assert_eq!(led.current_colour(), COLOUR_OFF);
}

// ── System ────────────────────────────────────────────────────

#[test]
fn idle_controller_keeps_sleeping() {
    let (_, mut app, mut sink) = make_app();
    for _ in 0..3 {
        app.fire(&mut sink);
    }
    assert_eq!(app.state(), UrbaniteState::SleepWhileOff);
    assert_eq!(app.urbanite().power().sleeps, 3);
    assert_eq!(
        sink.events,
        vec![AppEvent::StateChanged {
            from: UrbaniteState::Off,
            to: UrbaniteState::SleepWhileOff,
        }]
    );
}

#[test]
fn release_pass_switches_on() {
    let (hw, mut app, mut sink) = make_app();
    hold(&hw, &mut app, &mut sink, 1200);

    assert_eq!(app.state(), UrbaniteState::Measure);
    assert!(hw.take_calls().contains(&HwCall::StartPeriodic));
    assert!(app.urbanite().display().borrow().status());
}

#[test]
fn emergency_blink_blocks_for_each_phase() {
    let (hw, mut app, mut sink) = make_app();
    hold(&hw, &mut app, &mut sink, 1200);
    hold(&hw, &mut app, &mut sink, 3200);
    assert_eq!(app.state(), UrbaniteState::Emergency);
    assert!(app.urbanite().power().delays_ms.is_empty());

    for _ in 0..3 {
        app.fire(&mut sink);
    }
    assert_eq!(app.urbanite().power().delays_ms, vec![1000, 1000, 1000]);

    let colours = hw.colours();
    let red_at = colours.iter().rposition(|&c| c == COLOUR_RED).unwrap();
    assert!(colours[red_at..].contains(&COLOUR_OFF));

    assert!(sink.events.contains(&AppEvent::StateChanged {
        from: UrbaniteState::Measure,
        to: UrbaniteState::Emergency,
    }));
}
