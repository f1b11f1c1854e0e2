//! Shared mutable context threaded through every FSM handler.
//!
//! `FsmContext` is the single struct that state handlers read from and
//! write to: the temperature for this tick, the startup button latch,
//! the control bookkeeping, and the relay commands the service applies
//! after the tick.  Think of it as the "blackboard".

use crate::config::ControllerConfig;

// ---------------------------------------------------------------------------
// Relay commands (written by state handlers; applied by the service)
// ---------------------------------------------------------------------------

/// Desired relay states.  `true` means energised.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayCommands {
    pub force_heat: bool,
    pub overfire_shutoff: bool,
}

impl RelayCommands {
    /// Both relays de-energised, the safe default.
    pub fn all_off() -> Self {
        Self::default()
    }
}

// ---------------------------------------------------------------------------
// FsmContext
// ---------------------------------------------------------------------------

pub struct FsmContext {
    // -- Inputs --
    /// Temperature for this tick, in the configured unit.  Only ever set
    /// from an available reading.
    pub temperature: f32,
    /// Temperature is at or above the overfire threshold this tick.
    /// Set by the [`OverfireSupervisor`](crate::safety::OverfireSupervisor).
    pub overfire_tripped: bool,
    /// A startup press has been taken from the button monitor and not
    /// yet consumed by a transition.
    pub button_pending: bool,

    // -- Bookkeeping --
    /// Normal-mode heating owns the force-heat relay.
    pub force_heat_active: bool,
    /// Completed startup bounces.
    pub startup_bounce_count: u32,

    // -- Outputs --
    pub commands: RelayCommands,

    // -- Configuration --
    pub config: ControllerConfig,
}

impl FsmContext {
    pub fn new(config: ControllerConfig) -> Self {
        Self {
            temperature: 0.0,
            overfire_tripped: false,
            button_pending: false,
            force_heat_active: false,
            startup_bounce_count: 0,
            commands: RelayCommands::all_off(),
            config,
        }
    }
}
