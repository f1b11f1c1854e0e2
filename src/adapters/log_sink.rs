//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured control events to the
//! `log` facade.  The binary routes those records through
//! `tracing-subscriber`.

use log::{error, info, warn};

use crate::app::events::ControlEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`ControlEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

fn on_off(state: Option<bool>) -> &'static str {
    match state {
        Some(true) => "ON",
        Some(false) => "off",
        None => "??",
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &ControlEvent) {
        match event {
            ControlEvent::Telemetry(t) => {
                let temp = match t.temperature {
                    Some(v) => format!("{v:.1}{}", t.unit),
                    None => "n/a".to_owned(),
                };
                info!(
                    "TELEM | state={} | T={} | force_heat={} overfire_shutoff={} | \
                     normal_heat={} bounces={} button={}",
                    t.status.state,
                    temp,
                    on_off(t.status.force_heat_relay),
                    on_off(t.status.overfire_shutoff_relay),
                    t.status.force_heat_active,
                    t.status.startup_bounce_count,
                    t.status.button_pending,
                );
            }
            ControlEvent::StateChanged { from, to } => {
                info!("STATE | {from} -> {to}");
            }
            ControlEvent::OverfireTripped { temperature } => {
                error!("OVERFIRE | tripped at {temperature:.1}");
            }
            ControlEvent::OverfireCleared { temperature } => {
                info!("OVERFIRE | cleared at {temperature:.1}");
            }
            ControlEvent::StartupBounce {
                count,
                limit,
                temperature,
            } => {
                info!("STARTUP | bounce {count}/{limit} at {temperature:.1}");
            }
            ControlEvent::ButtonDiscarded { temperature } => {
                warn!("BUTTON | press ignored during overfire at {temperature:.1}");
            }
            ControlEvent::TemperatureUnavailable => {
                warn!("SENSOR | no usable temperature, relays held");
            }
            ControlEvent::TemperatureRestored { temperature } => {
                info!("SENSOR | temperature restored at {temperature:.1}");
            }
            ControlEvent::RelayFault(e) => {
                error!("RELAY | {e}");
            }
            ControlEvent::Started(state) => {
                info!("START | initial_state={state}");
            }
            ControlEvent::Stopped => {
                info!("STOP | relays off");
            }
        }
    }
}
