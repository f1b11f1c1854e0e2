//! Outbound control events.
//!
//! The [`ControlService`](super::service::ControlService) and the runtime
//! emit these through the [`EventSink`](super::ports::EventSink) port.

use crate::error::RelayError;
use crate::fsm::StateId;
use crate::sensors::TemperatureUnit;

use super::service::ControlStatus;

/// Structured events emitted by the control core.
#[derive(Debug, Clone)]
pub enum ControlEvent {
    /// The service has started with both relays off.
    Started(StateId),

    /// The FSM transitioned between states.
    StateChanged { from: StateId, to: StateId },

    /// Overfire entered; the shutoff relay is being energised.
    OverfireTripped { temperature: f32 },

    /// Overfire cleared; the shutoff relay is being released.
    OverfireCleared { temperature: f32 },

    /// A startup bounce completed (force heat released at startup high).
    StartupBounce { count: u32, limit: u32, temperature: f32 },

    /// A startup press arrived during overfire and was dropped.
    ButtonDiscarded { temperature: f32 },

    /// No usable temperature; relays are being held.
    TemperatureUnavailable,

    /// Temperature readings are usable again.
    TemperatureRestored { temperature: f32 },

    /// A relay command or read-back failed.
    RelayFault(RelayError),

    /// Periodic telemetry snapshot.
    Telemetry(TelemetryData),

    /// The controller stopped and drove every relay off.
    Stopped,
}

/// A point-in-time telemetry snapshot suitable for logging.
#[derive(Debug, Clone, Copy)]
pub struct TelemetryData {
    pub temperature: Option<f32>,
    pub unit: TemperatureUnit,
    pub status: ControlStatus,
}
