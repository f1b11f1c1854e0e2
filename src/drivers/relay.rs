//! Active-low relay driver.
//!
//! ## Wiring
//!
//! | Relay             | Contact | Effect when energised                  |
//! |-------------------|---------|----------------------------------------|
//! | `ForceHeat`       | K2 NO   | shorts W to R, parallel to thermostat  |
//! | `OverfireShutoff` | K1 NC   | opens W, in series nearest the furnace |
//!
//! The relay board energises a coil when its input is pulled LOW.  Pins
//! are parked HIGH (off) at construction.

use core::fmt;

use embedded_hal::digital::{Error as _, StatefulOutputPin};
use log::debug;
use serde::Serialize;

use crate::error::RelayError;

/// Which physical relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RelayId {
    ForceHeat,
    OverfireShutoff,
}

impl RelayId {
    pub const fn name(self) -> &'static str {
        match self {
            Self::ForceHeat => "force-heat",
            Self::OverfireShutoff => "overfire-shutoff",
        }
    }
}

impl fmt::Display for RelayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One relay channel behind a stateful output pin.
pub struct Relay<P> {
    id: RelayId,
    pin: P,
}

impl<P: StatefulOutputPin> Relay<P> {
    /// Take the pin and drive it HIGH (de-energised).
    pub fn new(id: RelayId, mut pin: P) -> Result<Self, RelayError> {
        pin.set_high().map_err(|e| RelayError::Pin {
            relay: id,
            kind: e.kind(),
        })?;
        Ok(Self { id, pin })
    }

    /// Energise (drive LOW).  No pin write if already on.
    pub fn on(&mut self) -> Result<(), RelayError> {
        if self.is_active()? {
            return Ok(());
        }
        self.pin.set_low().map_err(|e| self.pin_error(e.kind()))?;
        debug!("{} relay on", self.id);
        Ok(())
    }

    /// De-energise (drive HIGH).  No pin write if already off.
    pub fn off(&mut self) -> Result<(), RelayError> {
        if !self.is_active()? {
            return Ok(());
        }
        self.pin.set_high().map_err(|e| self.pin_error(e.kind()))?;
        debug!("{} relay off", self.id);
        Ok(())
    }

    pub fn set(&mut self, on: bool) -> Result<(), RelayError> {
        if on { self.on() } else { self.off() }
    }

    /// True iff the line currently reads LOW.
    pub fn is_active(&mut self) -> Result<bool, RelayError> {
        self.pin.is_set_low().map_err(|e| self.pin_error(e.kind()))
    }

    fn pin_error(&self, kind: embedded_hal::digital::ErrorKind) -> RelayError {
        RelayError::Pin {
            relay: self.id,
            kind,
        }
    }
}
