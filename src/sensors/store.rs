//! Shared temperature snapshot.
//!
//! The sampler is the only writer.  Readers copy the whole
//! [`TemperatureReading`] out under the lock, so a value is never seen
//! without its matching timestamp.
//!
//! Age is measured on the monotonic clock.  The wall-clock timestamp is
//! for display only: it can step at boot when NTP syncs.

use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use parking_lot::Mutex;

use super::TemperatureUnit;

/// One published sampler cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureReading {
    /// Mean of the successful reads, rounded to 0.1.  `None` when every
    /// read in the cycle failed.
    pub value: Option<f32>,
    pub unit: TemperatureUnit,
    /// Wall-clock time the cycle completed, for reporting.
    pub sampled_at: DateTime<Local>,
    /// Monotonic time the cycle completed, for the freshness check.
    pub captured: Instant,
    /// Successful reads that went into `value`.
    pub good_reads: u8,
}

impl TemperatureReading {
    /// A reading completed now.
    pub fn now(value: Option<f32>, unit: TemperatureUnit, good_reads: u8) -> Self {
        Self {
            value,
            unit,
            sampled_at: Local::now(),
            captured: Instant::now(),
            good_reads,
        }
    }

    pub fn is_available(&self) -> bool {
        self.value.is_some()
    }
}

/// Lock-guarded latest reading.
#[derive(Debug, Default)]
pub struct TemperatureStore {
    latest: Mutex<Option<TemperatureReading>>,
}

impl TemperatureStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the snapshot wholesale.
    pub fn publish(&self, reading: TemperatureReading) {
        *self.latest.lock() = Some(reading);
    }

    /// Latest reading, or `None` before the first cycle completes.
    pub fn snapshot(&self) -> Option<TemperatureReading> {
        *self.latest.lock()
    }

    /// Latest value if one exists and is no older than `max_age`.
    pub fn fresh_value(&self, max_age: Duration) -> Option<f32> {
        self.fresh_value_at(Instant::now(), max_age)
    }

    pub fn fresh_value_at(&self, now: Instant, max_age: Duration) -> Option<f32> {
        let reading = self.snapshot()?;
        if now.saturating_duration_since(reading.captured) > max_age {
            return None;
        }
        reading.value
    }
}
