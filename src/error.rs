//! Unified error types for the furnace controller.
//!
//! One enum per subsystem plus a top-level [`Error`] that every subsystem
//! converts into.  Sensor and relay errors are `Copy` so they can be passed
//! through the sampler and the control service without allocation.

use embedded_hal::digital::ErrorKind;
use thiserror::Error;

use crate::drivers::relay::RelayId;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the controller funnels into this type.
#[derive(Debug, Error)]
pub enum Error {
    /// A thermocouple read failed.
    #[error("sensor: {0}")]
    Sensor(#[from] SensorError),
    /// A relay command failed.
    #[error("relay: {0}")]
    Relay(#[from] RelayError),
    /// Configuration is invalid or could not be loaded.
    #[error("config: {0}")]
    Config(#[from] ConfigError),
    /// A worker thread could not be started.
    #[error("thread spawn: {0}")]
    Spawn(#[source] std::io::Error),
    /// The GPIO controller or a pin could not be acquired.
    #[cfg(feature = "rpi")]
    #[error("gpio: {0}")]
    Gpio(#[from] rppal::gpio::Error),
}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SensorError {
    /// Fault bit D2 was set: the thermocouple input is open.
    #[error("thermocouple open circuit")]
    ThermocoupleOpen,
    /// A chip-select, clock or data line could not be driven or read.
    #[error("sensor pin error: {0:?}")]
    Pin(ErrorKind),
}

// ---------------------------------------------------------------------------
// Relay errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RelayError {
    /// The relay's control line could not be driven or read back.
    #[error("{relay} relay pin error: {kind:?}")]
    Pin { relay: RelayId, kind: ErrorKind },
}

impl RelayError {
    /// Which relay failed.
    pub fn relay(&self) -> RelayId {
        match self {
            Self::Pin { relay, .. } => *relay,
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    /// The temperature unit is not one of `C`, `K`, `F`.
    #[error("invalid temperature unit {0:?} (expected C, K or F)")]
    InvalidUnit(String),
    /// A field failed range or ordering validation.
    #[error("validation failed: {0}")]
    ValidationFailed(&'static str),
    /// The configuration file could not be read.
    #[error("config I/O: {0}")]
    Io(#[from] std::io::Error),
    /// The configuration file is not valid JSON for this schema.
    #[error("config parse: {0}")]
    Parse(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
