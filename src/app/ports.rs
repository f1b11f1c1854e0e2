//! Port traits: the boundary between control logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ControlService (domain)
//! ```
//!
//! Driven adapters (relays, event sinks, config storage) implement these
//! traits.  The [`ControlService`](super::service::ControlService)
//! consumes them via generics, so the control core never touches
//! hardware directly.

use crate::config::ControllerConfig;
use crate::drivers::relay::RelayId;
use crate::error::{ConfigError, RelayError};

use super::events::ControlEvent;

// ───────────────────────────────────────────────────────────────
// Relay port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the domain commands relays through this.
pub trait RelayPort {
    /// Energise (`true`) or de-energise (`false`) a relay.  Must be a no-op
    /// when the relay is already in that state.
    fn set(&mut self, relay: RelayId, on: bool) -> Result<(), RelayError>;

    /// Live read-back: is the relay energised right now?
    fn is_active(&mut self, relay: RelayId) -> Result<bool, RelayError>;

    /// De-energise every relay.  Attempts all of them even if one fails
    /// and reports the first failure.
    fn all_off(&mut self) -> Result<(), RelayError>;
}

impl<T: RelayPort + ?Sized> RelayPort for &mut T {
    fn set(&mut self, relay: RelayId, on: bool) -> Result<(), RelayError> {
        (**self).set(relay, on)
    }

    fn is_active(&mut self, relay: RelayId) -> Result<bool, RelayError> {
        (**self).is_active(relay)
    }

    fn all_off(&mut self) -> Result<(), RelayError> {
        (**self).all_off()
    }
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`ControlEvent`]s through this port.
/// Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &ControlEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port
// ───────────────────────────────────────────────────────────────

/// Loads controller configuration.
///
/// Implementations MUST validate before returning.  Invalid values are
/// rejected with [`ConfigError::ValidationFailed`], never clamped: a
/// silently clamped overfire threshold is a fire risk.
pub trait ConfigPort {
    /// Returns [`ControllerConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<ControllerConfig, ConfigError>;
}
