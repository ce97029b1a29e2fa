//! Urbanite host bench entry point.
//!
//! Runs the full controller against the simulated board in real time.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  BenchSimulator (SysTick · timers · echo capture · button)   │
//! │                              │                               │
//! │                            Board                             │
//! │  ─────────────────── Port Trait Boundary ──────────────────  │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │     ParkingAssist: button · ultrasound · display ·     │  │
//! │  │                      urbanite                          │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! │        SimPower (sleep, blocking delay)   LogEventSink       │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Usage: `urbanite [config.json]`.  The log level comes from
//! `URBANITE_LOG` (`error` .. `trace`, default `info`).

use std::rc::Rc;
use std::time::Duration;

use anyhow::{Context, Result};
use log::info;

use urbanite::adapters::hardware::Board;
use urbanite::adapters::log_sink::LogEventSink;
use urbanite::app::ports::Clock;
use urbanite::app::service::ParkingAssist;
use urbanite::config::SystemConfig;
use urbanite::power::SimPower;
use urbanite::sim::BenchSimulator;

/// Interval between status reports and obstacle moves.
const STATUS_INTERVAL_MS: u32 = 1_000;
/// The demo switches the system on with a press at this tick.
const DEMO_PRESS_AT_MS: u32 = 500;
/// Obstacle sweep limits and step (cm).
const SWEEP_FAR_CM: u32 = 210;
const SWEEP_NEAR_CM: u32 = 5;
const SWEEP_STEP_CM: u32 = 15;

fn load_config() -> Result<SystemConfig> {
    let Some(path) = std::env::args().nth(1) else {
        return Ok(SystemConfig::default());
    };
    let text = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
    SystemConfig::from_json(&text).with_context(|| format!("loading {path}"))
}

/// Next obstacle distance in a back-and-forth sweep.
fn sweep(cm: u32, approaching: &mut bool) -> u32 {
    if *approaching && cm <= SWEEP_NEAR_CM + SWEEP_STEP_CM {
        *approaching = false;
    } else if !*approaching && cm + SWEEP_STEP_CM >= SWEEP_FAR_CM {
        *approaching = true;
    }
    if *approaching {
        cm - SWEEP_STEP_CM
    } else {
        cm + SWEEP_STEP_CM
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().filter_or("URBANITE_LOG", "info"))
        .init();

    let config = load_config()?;
    info!("Urbanite starting with {:?}", config);

    let board = Rc::new(Board::from_config(&config)?);
    let power = SimPower::realtime(Rc::clone(&board));
    let mut app = ParkingAssist::new(Rc::clone(&board), Rc::clone(&board), power, &config)?;
    let mut sim = BenchSimulator::new(Rc::clone(&board), &config);
    let mut sink = LogEventSink::new();

    sim.schedule_press(DEMO_PRESS_AT_MS, config.on_off_press_time_ms + 200);
    sim.set_obstacle_cm(Some(SWEEP_FAR_CM));
    let mut approaching = true;
    let mut last_report = board.now_ms();

    app.start(&mut sink);
    loop {
        sim.step();
        app.fire(&mut sink);

        let now = board.now_ms();
        if now.wrapping_sub(last_report) >= STATUS_INTERVAL_MS {
            last_report = now;
            app.report(&mut sink);
            if let Some(cm) = sim.obstacle_cm() {
                sim.set_obstacle_cm(Some(sweep(cm, &mut approaching)));
            }
        }

        std::thread::sleep(Duration::from_millis(1));
    }
}
