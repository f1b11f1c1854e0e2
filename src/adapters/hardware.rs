//! Hardware adapter: bridges the relay drivers to the domain port trait.
//!
//! Owns both [`Relay`] channels and exposes them through [`RelayPort`].
//! Generic over the pin type, so the same adapter drives rppal GPIO on
//! the Pi and [`SimOutputPin`](crate::drivers::sim::SimOutputPin) on the
//! host.

use embedded_hal::digital::StatefulOutputPin;

use crate::app::ports::RelayPort;
use crate::drivers::relay::{Relay, RelayId};
use crate::error::RelayError;

/// The two-relay furnace board.
pub struct RelayBoard<FH, OF> {
    force_heat: Relay<FH>,
    overfire_shutoff: Relay<OF>,
}

impl<FH: StatefulOutputPin, OF: StatefulOutputPin> RelayBoard<FH, OF> {
    /// Take both pins and park them off.
    pub fn new(force_heat: FH, overfire_shutoff: OF) -> Result<Self, RelayError> {
        Ok(Self {
            force_heat: Relay::new(RelayId::ForceHeat, force_heat)?,
            overfire_shutoff: Relay::new(RelayId::OverfireShutoff, overfire_shutoff)?,
        })
    }
}

impl<FH: StatefulOutputPin, OF: StatefulOutputPin> RelayPort for RelayBoard<FH, OF> {
    fn set(&mut self, relay: RelayId, on: bool) -> Result<(), RelayError> {
        match relay {
            RelayId::ForceHeat => self.force_heat.set(on),
            RelayId::OverfireShutoff => self.overfire_shutoff.set(on),
        }
    }

    fn is_active(&mut self, relay: RelayId) -> Result<bool, RelayError> {
        match relay {
            RelayId::ForceHeat => self.force_heat.is_active(),
            RelayId::OverfireShutoff => self.overfire_shutoff.is_active(),
        }
    }

    fn all_off(&mut self) -> Result<(), RelayError> {
        let heat = self.force_heat.off();
        let shutoff = self.overfire_shutoff.off();
        heat.and(shutoff)
    }
}
