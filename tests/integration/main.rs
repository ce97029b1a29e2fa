//! Integration test driver for the `tests/integration/` submodules.
//!
//! `machine_tests` drives the machines against recorded mock hardware;
//! `scenario_tests` runs the whole controller on the simulated board.
//! Everything runs on the host with no real hardware required.

mod machine_tests;
mod mock_hw;
mod scenario_tests;
