//! End-to-end scenarios: board registry + bench simulator + controller.
//!
//! Everything below runs through the interrupt-style producers: the
//! simulator raises button edges, timer expiries and echo captures on the
//! board, and the controller reacts on its next pass.

use std::rc::Rc;

use urbanite::adapters::hardware::Board;
use urbanite::app::ports::Clock;
use urbanite::app::service::ParkingAssist;
use urbanite::config::SystemConfig;
use urbanite::drivers::rgb_led::{COLOUR_OFF, COLOUR_RED, Rgb};
use urbanite::fsm::display::compute_color;
use urbanite::fsm::ultrasound::ticks_to_distance_cm;
use urbanite::fsm::urbanite::UrbaniteState;
use urbanite::power::SimPower;
use urbanite::sim::{BenchSimulator, echo_width_us};

use crate::mock_hw::RecordingSink;

struct Bench {
    board: Rc<Board>,
    app: ParkingAssist<Board, Board, SimPower>,
    sim: BenchSimulator,
    sink: RecordingSink,
}

impl Bench {
    fn new() -> Self {
        let config = SystemConfig::default();
        let board = Rc::new(Board::from_config(&config).unwrap());
        let power = SimPower::new(Rc::clone(&board));
        let app = ParkingAssist::new(Rc::clone(&board), Rc::clone(&board), power, &config).unwrap();
        let sim = BenchSimulator::new(Rc::clone(&board), &config);
        Self {
            board,
            app,
            sim,
            sink: RecordingSink::default(),
        }
    }

    fn run(&mut self, ms: u32) {
        self.sim.run(&mut self.app, &mut self.sink, ms);
    }

    /// Press on the next tick and hold for `hold_ms`.  Returns after the
    /// pass that saw the release plus one more pass.  Blocking emergency
    /// blinks make the clock jump, so progress is measured on the clock.
    fn press(&mut self, hold_ms: u32) {
        let at = self.board.now_ms() + 1;
        let release_at = at + hold_ms;
        self.sim.schedule_press(at, hold_ms);
        while self.board.now_ms() < release_at {
            self.run(1);
        }
        self.run(1);
    }

    fn colour(&self) -> Rgb {
        self.board.display_colour(0).unwrap()
    }

    fn switch_on(&mut self) {
        self.run(100);
        self.press(1200);
        assert_eq!(self.app.state(), UrbaniteState::Measure);
    }
}

/// Distance the controller will report for an obstacle at `cm`.
fn measured(cm: u32) -> u32 {
    ticks_to_distance_cm(echo_width_us(cm))
}

#[test]
fn idle_bench_sleeps_while_off() {
    let mut bench = Bench::new();
    bench.run(500);
    assert_eq!(bench.app.state(), UrbaniteState::SleepWhileOff);
    assert_eq!(bench.app.urbanite().power().sleep_count(), 500);
    assert_eq!(bench.colour(), COLOUR_OFF);
    assert_eq!(bench.sim.echoes(), 0);
}

#[test]
fn switch_on_then_track_obstacle() {
    let mut bench = Bench::new();
    bench.sim.set_obstacle_cm(Some(80));
    bench.switch_on();

    bench.run(1500);
    assert_eq!(bench.app.urbanite().ultrasound().borrow().last_distance(), measured(80));
    assert_eq!(bench.colour(), compute_color(measured(80)));

    bench.sim.set_obstacle_cm(Some(20));
    bench.run(1500);
    assert_eq!(bench.colour(), compute_color(measured(20)));
    assert!(bench.sim.echoes() >= 20);
}

#[test]
fn measuring_system_sleeps_between_readings() {
    let mut bench = Bench::new();
    bench.switch_on();
    bench.run(2000);

    let state = bench.app.state();
    assert!(
        state == UrbaniteState::SleepWhileOn || state == UrbaniteState::Measure,
        "unexpected {state:?}"
    );
    let sleeps_before = bench.app.urbanite().power().sleep_count();
    bench.run(200);
    assert!(bench.app.urbanite().power().sleep_count() > sleeps_before);
}

#[test]
fn pause_hides_far_obstacles_but_not_close_ones() {
    let mut bench = Bench::new();
    bench.sim.set_obstacle_cm(Some(100));
    bench.switch_on();
    bench.run(1000);

    bench.press(900);
    assert!(bench.app.urbanite().is_paused());
    bench.run(1000);
    assert_eq!(bench.colour(), COLOUR_OFF);

    bench.sim.set_obstacle_cm(Some(10));
    bench.run(1500);
    assert!(bench.app.urbanite().display().borrow().status());
    assert_eq!(bench.colour(), compute_color(measured(10)));

    bench.press(900);
    assert!(!bench.app.urbanite().is_paused());
}

#[test]
fn emergency_round_trip() {
    let mut bench = Bench::new();
    bench.switch_on();
    bench.run(1000);

    bench.press(3200);
    assert_eq!(bench.app.state(), UrbaniteState::Emergency);
    assert!(!bench.app.urbanite().ultrasound().borrow().status());

    let mut seen = Vec::new();
    for _ in 0..4 {
        bench.run(1);
        seen.push(bench.colour());
    }
    assert!(seen.contains(&COLOUR_RED));
    assert!(seen.contains(&COLOUR_OFF));

    bench.press(3200);
    assert_eq!(bench.app.state(), UrbaniteState::Measure);
    assert!(!bench.app.urbanite().is_emergency());
    assert!(bench.app.urbanite().ultrasound().borrow().status());
}

#[test]
fn second_long_press_switches_off() {
    let mut bench = Bench::new();
    bench.sim.set_obstacle_cm(Some(50));
    bench.switch_on();
    bench.run(1500);
    assert_ne!(bench.colour(), COLOUR_OFF);

    bench.press(1500);
    bench.run(10);
    let state = bench.app.state();
    assert!(
        state == UrbaniteState::Off || state == UrbaniteState::SleepWhileOff,
        "unexpected {state:?}"
    );
    assert_eq!(bench.colour(), COLOUR_OFF);
    assert!(!bench.board.ultrasound(0).unwrap().is_measurement_timer_on());
}
