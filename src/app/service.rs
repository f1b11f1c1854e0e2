//! Control service: the decision core.
//!
//! [`ControlService`] owns the FSM, the overfire supervisor and the shared
//! context.  All I/O flows through port traits injected at call sites,
//! making the whole priority chain testable with mock adapters.
//!
//! ```text
//!  temperature ─┐   ┌────────────────────────────┐ ──▶ EventSink
//!  button ──────┼──▶│       ControlService        │
//!               │   │  Supervisor · FSM · relays  │ ──▶ RelayPort
//!               └───└────────────────────────────┘
//! ```

use log::{info, warn};
use serde::Serialize;

use crate::config::ControllerConfig;
use crate::drivers::button::ButtonMonitor;
use crate::drivers::relay::RelayId;
use crate::error::RelayError;
use crate::fsm::context::{FsmContext, RelayCommands};
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, StateId};
use crate::safety::OverfireSupervisor;

use super::events::ControlEvent;
use super::ports::{EventSink, RelayPort};

// ───────────────────────────────────────────────────────────────
// Results and status
// ───────────────────────────────────────────────────────────────

/// What one control tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No usable temperature: nothing evaluated, relays untouched.
    Held,
    /// The priority chain ran.
    Evaluated { from: StateId, to: StateId },
}

/// Read-only view of the control state, published after every tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ControlStatus {
    pub state: StateId,
    pub overfire: bool,
    /// Normal-mode heating owns the force-heat relay.
    pub force_heat_active: bool,
    pub startup_active: bool,
    pub startup_bounce_count: u32,
    /// Press taken by the control loop and not yet consumed.
    pub button_pending: bool,
    /// Live relay read-backs; `None` if the read failed.
    pub force_heat_relay: Option<bool>,
    pub overfire_shutoff_relay: Option<bool>,
    /// Distinct overfire trips since startup.
    pub overfire_trips: u32,
    pub ticks: u64,
}

// ───────────────────────────────────────────────────────────────
// ControlService
// ───────────────────────────────────────────────────────────────

pub struct ControlService {
    fsm: Fsm,
    ctx: FsmContext,
    supervisor: OverfireSupervisor,
    tick_count: u64,
    data_missing: bool,
}

impl ControlService {
    /// Construct the service from a validated configuration.
    ///
    /// Does **not** touch the relays; call [`start`](Self::start) next.
    pub fn new(config: ControllerConfig) -> Self {
        let supervisor = OverfireSupervisor::new(&config.thresholds);
        let ctx = FsmContext::new(config);
        let fsm = Fsm::new(build_state_table(), StateId::Normal);
        Self {
            fsm,
            ctx,
            supervisor,
            tick_count: 0,
            data_missing: false,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Enter `Normal` and drive both relays off.
    pub fn start(
        &mut self,
        relays: &mut impl RelayPort,
        sink: &mut impl EventSink,
    ) -> Result<(), RelayError> {
        self.fsm.start(&mut self.ctx);
        self.ctx.commands = RelayCommands::all_off();
        if let Err(e) = relays.all_off() {
            sink.emit(&ControlEvent::RelayFault(e));
            return Err(e);
        }
        sink.emit(&ControlEvent::Started(self.fsm.current_state()));
        info!("ControlService started in {}", self.fsm.current_state());
        Ok(())
    }

    /// Drive both relays to the safe default and report the stop.
    pub fn shutdown(
        &mut self,
        relays: &mut impl RelayPort,
        sink: &mut impl EventSink,
    ) -> Result<(), RelayError> {
        self.ctx.commands = RelayCommands::all_off();
        let result = relays.all_off();
        match result {
            Ok(()) => sink.emit(&ControlEvent::Stopped),
            Err(e) => sink.emit(&ControlEvent::RelayFault(e)),
        }
        result
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one control tick: supervisor → FSM → relays.
    ///
    /// `temperature` is `None` when no fresh, available reading exists; the
    /// tick then does nothing at all, the button latch included.
    ///
    /// A relay failure is emitted as [`ControlEvent::RelayFault`] and
    /// returned after both relays have been attempted.  The next tick
    /// re-applies the commands.
    pub fn tick(
        &mut self,
        temperature: Option<f32>,
        button: &ButtonMonitor,
        relays: &mut impl RelayPort,
        sink: &mut impl EventSink,
    ) -> Result<TickOutcome, RelayError> {
        self.tick_count += 1;

        let Some(temperature) = temperature else {
            if !self.data_missing {
                self.data_missing = true;
                warn!("no usable temperature, holding relays");
                sink.emit(&ControlEvent::TemperatureUnavailable);
            }
            return Ok(TickOutcome::Held);
        };
        if self.data_missing {
            self.data_missing = false;
            sink.emit(&ControlEvent::TemperatureRestored { temperature });
        }

        // 1. Inputs
        if button.take_pending() {
            self.ctx.button_pending = true;
            info!("startup press taken at {temperature:.1}");
        }
        self.ctx.temperature = temperature;
        self.ctx.overfire_tripped = self.supervisor.evaluate(temperature);

        // 2. Priority chain. Each state's update handler checks the trip
        //    flag before anything else; overfire entry happens only there.
        let from = self.fsm.current_state();
        let bounces_before = self.ctx.startup_bounce_count;
        let press_in_overfire = from == StateId::Overfire && self.ctx.button_pending;

        self.fsm.tick(&mut self.ctx);
        let to = self.fsm.current_state();

        // 3. Relays
        let applied = self.apply_relays(relays, sink);

        // 4. Events
        if press_in_overfire {
            sink.emit(&ControlEvent::ButtonDiscarded { temperature });
        }
        if from == StateId::Startup && to == StateId::Startup && self.ctx.startup_bounce_count > bounces_before {
            sink.emit(&ControlEvent::StartupBounce {
                count: self.ctx.startup_bounce_count,
                limit: self.ctx.config.startup_bounce_cycles,
                temperature,
            });
        }
        if from != to {
            if to == StateId::Overfire {
                sink.emit(&ControlEvent::OverfireTripped { temperature });
            } else if from == StateId::Overfire {
                sink.emit(&ControlEvent::OverfireCleared { temperature });
            }
            sink.emit(&ControlEvent::StateChanged { from, to });
        }

        applied.map(|()| TickOutcome::Evaluated { from, to })
    }

    // ── Queries ───────────────────────────────────────────────

    /// Snapshot of the control state with live relay read-backs.
    pub fn status(&self, relays: &mut impl RelayPort) -> ControlStatus {
        let state = self.fsm.current_state();
        ControlStatus {
            state,
            overfire: state == StateId::Overfire,
            force_heat_active: self.ctx.force_heat_active,
            startup_active: state == StateId::Startup,
            startup_bounce_count: self.ctx.startup_bounce_count,
            button_pending: self.ctx.button_pending,
            force_heat_relay: relays.is_active(RelayId::ForceHeat).ok(),
            overfire_shutoff_relay: relays.is_active(RelayId::OverfireShutoff).ok(),
            overfire_trips: self.supervisor.trip_count(),
            ticks: self.tick_count,
        }
    }

    /// Current FSM state.
    pub fn state(&self) -> StateId {
        self.fsm.current_state()
    }

    /// Total control ticks, including held ones.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    // ── Internal ──────────────────────────────────────────────

    /// Translate FSM relay commands into port calls.  Shutoff first.
    fn apply_relays(&self, relays: &mut impl RelayPort, sink: &mut impl EventSink) -> Result<(), RelayError> {
        let cmds = self.ctx.commands;
        let shutoff = relays.set(RelayId::OverfireShutoff, cmds.overfire_shutoff);
        let heat = relays.set(RelayId::ForceHeat, cmds.force_heat);
        for e in [&shutoff, &heat].into_iter().filter_map(|r| r.as_ref().err()) {
            sink.emit(&ControlEvent::RelayFault(*e));
        }
        shutoff.and(heat)
    }
}
