//! Unified error types for the Urbanite controller.
//!
//! The FSM core itself never fails: guards are total predicates and an
//! unmatched transition simply leaves the machine where it is.  Errors only
//! exist at the edges: loading configuration and wiring the hardware
//! registry at start-up.  All variants are `Copy` so they can be passed
//! around without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Device kinds (used to tag registry errors and warnings)
// ---------------------------------------------------------------------------

/// The class of peripheral a numeric device id refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    Button,
    Ultrasound,
    Display,
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Button => write!(f, "button"),
            Self::Ultrasound => write!(f, "ultrasound"),
            Self::Display => write!(f, "display"),
        }
    }
}

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible start-up operation funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Configuration is invalid.  The message names the offending field.
    Config(&'static str),
    /// Configuration text could not be parsed.
    Parse,
    /// No device with this id is registered.
    UnknownDevice { kind: DeviceKind, id: u32 },
    /// A device with this id is already registered.
    DuplicateDevice { kind: DeviceKind, id: u32 },
    /// The registry has no room for another device of this kind.
    RegistryFull(DeviceKind),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Parse => write!(f, "config: malformed JSON"),
            Self::UnknownDevice { kind, id } => write!(f, "unknown {kind} id {id}"),
            Self::DuplicateDevice { kind, id } => write!(f, "{kind} id {id} already registered"),
            Self::RegistryFull(kind) => write!(f, "no free {kind} slot"),
        }
    }
}

impl core::error::Error for Error {}

impl From<serde_json::Error> for Error {
    fn from(_: serde_json::Error) -> Self {
        Self::Parse
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
