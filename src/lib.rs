//! Urbanite parking-assist controller library.
//!
//! Four cooperating state machines (push button, ultrasound ranger, RGB
//! indicator and the system orchestrator) built on one table-driven FSM
//! engine.  Hardware is reached only through the port traits in
//! [`app::ports`]; [`adapters::hardware::Board`] is the id-keyed device
//! registry behind them and [`sim::BenchSimulator`] drives it on the host.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod drivers;
pub mod error;
pub mod fsm;
pub mod power;
pub mod sim;

pub use error::{Error, Result};
