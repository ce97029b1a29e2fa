//! Application core.
//!
//! This module holds the parking-assist service and the boundary it talks
//! through.  All interaction with hardware happens through **port traits**
//! defined in [`ports`], keeping the machines fully testable without real
//! peripherals.

pub mod events;
pub mod ports;
pub mod service;
