//! Overfire supervisor.
//!
//! The supervisor runs **every tick before the FSM** and decides whether
//! the flue is at or above the overfire ceiling.  The control service
//! uses that verdict to force the FSM into `Overfire` before any other
//! logic gets a say, so no state handler can starve overfire protection.
//!
//! ## Trip lifecycle
//!
//! 1. Temperature reaches `overfire_high`: the supervisor trips.
//! 2. The service forces `Overfire`; `overfire_enter` energises the shutoff.
//! 3. While tripped, every tick re-asserts the shutoff.
//! 4. Below `overfire_high` the supervisor un-trips, but the FSM stays in
//!    `Overfire` until the temperature falls to `overfire_clear`.

use log::{error, info};

use crate::config::Thresholds;

pub struct OverfireSupervisor {
    overfire_high: f32,
    tripped: bool,
    trips: u32,
}

impl OverfireSupervisor {
    pub fn new(thresholds: &Thresholds) -> Self {
        Self {
            overfire_high: thresholds.overfire_high,
            tripped: false,
            trips: 0,
        }
    }

    /// Evaluate one available temperature.  Returns the trip verdict.
    pub fn evaluate(&mut self, temperature: f32) -> bool {
        let tripped = temperature >= self.overfire_high;
        if tripped && !self.tripped {
            self.trips = self.trips.saturating_add(1);
            error!(
                "SAFETY: overfire at {:.1} (limit {:.1})",
                temperature, self.overfire_high
            );
        } else if !tripped && self.tripped {
            info!("SAFETY: below overfire limit at {:.1}", temperature);
        }
        self.tripped = tripped;
        tripped
    }

    /// Number of distinct trips since startup.
    pub fn trip_count(&self) -> u32 {
        self.trips
    }
}
