//! Mock relay board, event recorder and scripted sensor for integration
//! tests.
//!
//! The relay mock records every port call so tests can assert on exactly
//! when a relay changed, not just where it ended up.

use std::collections::VecDeque;

use embedded_hal::digital::ErrorKind;

use furnacectl::app::events::ControlEvent;
use furnacectl::app::ports::{EventSink, RelayPort};
use furnacectl::drivers::relay::RelayId;
use furnacectl::error::{RelayError, SensorError};
use furnacectl::sensors::TemperatureSource;

// ── Relay call record ─────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayCall {
    Set { relay: RelayId, on: bool },
    AllOff,
}

// ── MockRelays ────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MockRelays {
    pub calls: Vec<RelayCall>,
    force_heat: bool,
    overfire_shutoff: bool,
    /// Relay whose writes fail until cleared.
    pub failing: Option<RelayId>,
}

#[allow(dead_code)]
impl MockRelays {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn force_heat(&self) -> bool {
        self.force_heat
    }

    pub fn overfire_shutoff(&self) -> bool {
        self.overfire_shutoff
    }

    /// Number of times `relay` actually changed state.
    pub fn changes(&self, relay: RelayId) -> usize {
        let mut level = false;
        let mut changes = 0;
        for call in &self.calls {
            let next = match *call {
                RelayCall::Set { relay: r, on } if r == relay => on,
                RelayCall::AllOff => false,
                RelayCall::Set { .. } => continue,
            };
            if next != level {
                changes += 1;
                level = next;
            }
        }
        changes
    }

    fn slot(&mut self, relay: RelayId) -> &mut bool {
        match relay {
            RelayId::ForceHeat => &mut self.force_heat,
            RelayId::OverfireShutoff => &mut self.overfire_shutoff,
        }
    }
}

impl RelayPort for MockRelays {
    fn set(&mut self, relay: RelayId, on: bool) -> Result<(), RelayError> {
        if self.failing == Some(relay) {
            return Err(RelayError::Pin {
                relay,
                kind: ErrorKind::Other,
            });
        }
        self.calls.push(RelayCall::Set { relay, on });
        *self.slot(relay) = on;
        Ok(())
    }

    fn is_active(&mut self, relay: RelayId) -> Result<bool, RelayError> {
        Ok(*self.slot(relay))
    }

    fn all_off(&mut self) -> Result<(), RelayError> {
        self.calls.push(RelayCall::AllOff);
        self.force_heat = false;
        self.overfire_shutoff = false;
        Ok(())
    }
}

// ── Event recorder ────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct Recorder {
    pub events: Vec<ControlEvent>,
}

#[allow(dead_code)]
impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&ControlEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for Recorder {
    fn emit(&mut self, event: &ControlEvent) {
        self.events.push(event.clone());
    }
}

// ── Scripted thermocouple ─────────────────────────────────────

/// Replays a fixed list of read results, then reports open circuit.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    reads: VecDeque<Result<f32, SensorError>>,
    pub taken: usize,
}

#[allow(dead_code)]
impl ScriptedSource {
    pub fn new(reads: impl IntoIterator<Item = Result<f32, SensorError>>) -> Self {
        Self {
            reads: reads.into_iter().collect(),
            taken: 0,
        }
    }
}

impl TemperatureSource for ScriptedSource {
    fn read_temperature(&mut self) -> Result<f32, SensorError> {
        self.taken += 1;
        self.reads.pop_front().unwrap_or(Err(SensorError::ThermocoupleOpen))
    }
}
