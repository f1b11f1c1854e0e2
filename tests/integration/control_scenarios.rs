//! End-to-end control scenarios: ControlService -> FSM -> relay port,
//! with the default thresholds (overfire 245/180, startup 175/165,
//! normal 115 released at 130).

use furnacectl::app::events::ControlEvent;
use furnacectl::app::service::{ControlService, TickOutcome};
use furnacectl::config::ControllerConfig;
use furnacectl::drivers::button::ButtonMonitor;
use furnacectl::drivers::relay::RelayId;
use furnacectl::error::RelayError;
use furnacectl::fsm::StateId;

use crate::mock_hw::{MockRelays, Recorder, RelayCall};

struct Rig {
    svc: ControlService,
    relays: MockRelays,
    sink: Recorder,
    button: ButtonMonitor,
    now_ms: u64,
}

impl Rig {
    fn new(config: ControllerConfig) -> Self {
        let button = ButtonMonitor::new(config.debounce_ms);
        let mut rig = Self {
            svc: ControlService::new(config),
            relays: MockRelays::new(),
            sink: Recorder::new(),
            button,
            now_ms: 10_000,
        };
        rig.svc.start(&mut rig.relays, &mut rig.sink).unwrap();
        rig
    }

    fn tick(&mut self, temperature: f32) -> TickOutcome {
        self.tick_opt(Some(temperature))
    }

    fn tick_opt(&mut self, temperature: Option<f32>) -> TickOutcome {
        self.now_ms += 2_000;
        self.svc
            .tick(temperature, &self.button, &mut self.relays, &mut self.sink)
            .unwrap()
    }

    fn press(&mut self) {
        assert!(self.button.on_edge_at(self.now_ms));
    }
}

// ── Scenario 1: rising through the overfire threshold ─────────

#[test]
fn shutoff_engages_exactly_at_overfire_high() {
    let mut rig = Rig::new(ControllerConfig::default());

    for t in [100.0, 150.0, 200.0, 240.0, 244.9] {
        rig.tick(t);
        assert!(!rig.relays.overfire_shutoff(), "shutoff must stay off at {t}");
        assert_eq!(rig.svc.state(), StateId::Normal);
    }

    rig.tick(245.0);
    assert!(rig.relays.overfire_shutoff());
    assert_eq!(rig.svc.state(), StateId::Overfire);

    rig.tick(260.0);
    assert!(rig.relays.overfire_shutoff());
    assert_eq!(rig.relays.changes(RelayId::OverfireShutoff), 1);
}

// ── Scenario 2: cooling through the clear threshold ───────────

#[test]
fn shutoff_releases_only_at_overfire_clear() {
    let mut rig = Rig::new(ControllerConfig::default());
    rig.tick(250.0);
    assert!(rig.relays.overfire_shutoff());

    for t in [240.0, 220.0, 200.0, 190.0, 180.1] {
        rig.tick(t);
        assert!(rig.relays.overfire_shutoff(), "shutoff must hold at {t}");
        assert_eq!(rig.svc.state(), StateId::Overfire);
    }

    rig.tick(180.0);
    assert!(!rig.relays.overfire_shutoff());
    assert_eq!(rig.svc.state(), StateId::Normal);

    rig.tick(170.0);
    assert!(!rig.relays.overfire_shutoff());
    assert_eq!(rig.relays.changes(RelayId::OverfireShutoff), 2);
}

// ── Scenario 3: one startup bounce ────────────────────────────

#[test]
fn startup_single_bounce_then_back_to_normal() {
    let mut rig = Rig::new(ControllerConfig::default());
    rig.tick(150.0);
    assert!(!rig.relays.force_heat());

    rig.press();
    rig.tick(150.0);
    assert_eq!(rig.svc.state(), StateId::Startup);
    assert!(rig.relays.force_heat());

    rig.tick(175.0);
    assert!(!rig.relays.force_heat());
    assert_eq!(rig.svc.status(&mut rig.relays).startup_bounce_count, 1);
    assert_eq!(
        rig.sink
            .count(|e| matches!(e, ControlEvent::StartupBounce { count: 1, limit: 1, .. })),
        1
    );

    let calls_before = rig.relays.calls.len();
    rig.tick(160.0);
    assert_eq!(rig.svc.state(), StateId::Normal);
    assert!(!rig.relays.force_heat(), "leaving startup must not touch force heat");
    let status = rig.svc.status(&mut rig.relays);
    assert!(!status.button_pending);
    assert_eq!(status.startup_bounce_count, 0);
    assert!(
        rig.relays.calls[calls_before..]
            .iter()
            .all(|c| *c != RelayCall::Set { relay: RelayId::ForceHeat, on: true })
    );
}

#[test]
fn startup_rebounds_below_startup_low_with_two_cycles() {
    let config = ControllerConfig {
        startup_bounce_cycles: 2,
        ..ControllerConfig::default()
    };
    let mut rig = Rig::new(config);
    rig.press();
    rig.tick(140.0);
    assert!(rig.relays.force_heat());

    rig.tick(176.0);
    assert!(!rig.relays.force_heat());
    rig.tick(170.0);
    assert!(!rig.relays.force_heat(), "inside the band nothing changes");
    rig.tick(165.0);
    assert!(rig.relays.force_heat());
    rig.tick(175.0);
    assert!(!rig.relays.force_heat());
    assert_eq!(rig.svc.state(), StateId::Startup);

    rig.tick(170.0);
    assert_eq!(rig.svc.state(), StateId::Normal);
}

// ── Scenario 4: normal heating hysteresis ─────────────────────

#[test]
fn normal_heating_engages_below_low_and_releases_at_low_plus_hysteresis() {
    let mut rig = Rig::new(ControllerConfig::default());

    rig.tick(100.0);
    assert!(rig.relays.force_heat());
    for t in [110.0, 120.0, 129.9] {
        rig.tick(t);
        assert!(rig.relays.force_heat(), "still heating at {t}");
    }
    rig.tick(131.0);
    assert!(!rig.relays.force_heat());

    rig.tick(120.0);
    assert!(!rig.relays.force_heat(), "no re-engage until below normal_low");
    rig.tick(114.9);
    assert!(rig.relays.force_heat());
}

// ── Scenario 5: no data holds everything ──────────────────────

#[test]
fn unavailable_reading_changes_no_relay() {
    let mut rig = Rig::new(ControllerConfig::default());
    rig.tick(244.0);
    rig.tick(100.0);
    assert!(rig.relays.force_heat());
    let calls_before = rig.relays.calls.len();

    rig.press();
    for _ in 0..5 {
        assert_eq!(rig.tick_opt(None), TickOutcome::Held);
    }

    assert_eq!(rig.relays.calls.len(), calls_before, "no relay writes without data");
    assert_eq!(rig.svc.state(), StateId::Normal);
    assert!(rig.button.is_pending(), "press stays latched for the next good tick");
    assert_eq!(
        rig.sink.count(|e| matches!(e, ControlEvent::TemperatureUnavailable)),
        1
    );

    rig.tick(150.0);
    assert_eq!(rig.svc.state(), StateId::Startup);
}

// ── Overfire pre-emption ──────────────────────────────────────

#[test]
fn overfire_preempts_startup_and_clears_bookkeeping() {
    let mut rig = Rig::new(ControllerConfig::default());
    rig.press();
    rig.tick(150.0);
    rig.tick(176.0);
    assert_eq!(rig.svc.state(), StateId::Startup);

    rig.press();
    rig.tick(250.0);
    let status = rig.svc.status(&mut rig.relays);
    assert_eq!(status.state, StateId::Overfire);
    assert_eq!(status.overfire_shutoff_relay, Some(true));
    assert_eq!(status.force_heat_relay, Some(false));
    assert!(!status.button_pending);
    assert_eq!(status.startup_bounce_count, 0);

    rig.tick(170.0);
    assert_eq!(rig.svc.state(), StateId::Normal, "no return to startup after overfire");
}

#[test]
fn force_heat_drops_on_overfire_entry_and_rearms_after_clear() {
    let mut rig = Rig::new(ControllerConfig::default());
    rig.tick(100.0);
    assert!(rig.relays.force_heat());

    rig.tick(250.0);
    assert!(!rig.relays.force_heat());
    assert!(rig.relays.overfire_shutoff());
    assert!(!rig.svc.status(&mut rig.relays).force_heat_active);

    rig.tick(170.0);
    assert_eq!(rig.svc.state(), StateId::Normal);
    assert!(!rig.relays.force_heat());

    rig.tick(100.0);
    assert!(rig.relays.force_heat(), "normal heating re-engages after the clear");
}

#[test]
fn relay_failure_is_reported_and_retried() {
    let mut rig = Rig::new(ControllerConfig::default());
    rig.relays.failing = Some(RelayId::ForceHeat);

    let err = rig
        .svc
        .tick(Some(250.0), &rig.button, &mut rig.relays, &mut rig.sink)
        .unwrap_err();
    assert_eq!(err.relay(), RelayId::ForceHeat);
    assert!(rig.relays.overfire_shutoff(), "shutoff applied despite the other relay failing");
    assert_eq!(
        rig.sink
            .count(|e| matches!(e, ControlEvent::RelayFault(RelayError::Pin { .. }))),
        1
    );

    rig.relays.failing = None;
    rig.tick(250.0);
    assert!(rig.relays.overfire_shutoff());
    assert!(!rig.relays.force_heat());
}

#[test]
fn shutdown_turns_everything_off() {
    let mut rig = Rig::new(ControllerConfig::default());
    rig.tick(250.0);
    rig.svc.shutdown(&mut rig.relays, &mut rig.sink).unwrap();

    assert!(!rig.relays.overfire_shutoff());
    assert!(!rig.relays.force_heat());
    assert_eq!(rig.relays.calls.last(), Some(&RelayCall::AllOff));
    assert!(matches!(rig.sink.events.last(), Some(ControlEvent::Stopped)));
}
