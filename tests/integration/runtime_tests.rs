//! Integration tests for the threaded runtime: sampler thread, control
//! loop and relay guard, all against the simulated thermocouple and
//! relay pins.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use furnacectl::adapters::hardware::RelayBoard;
use furnacectl::adapters::time::StdDelay;
use furnacectl::app::events::ControlEvent;
use furnacectl::config::{ControllerConfig, SamplerConfig};
use furnacectl::drivers::sim::{SimOutputPin, SimThermocouple};
use furnacectl::fsm::StateId;
use furnacectl::runtime::{SharedState, run_controller};
use furnacectl::sensors::max6675::{Max6675, Max6675Timing};
use furnacectl::sensors::sampler::TemperatureSampler;

use crate::mock_hw::Recorder;

struct Harness {
    thermo: SimThermocouple,
    force_heat: SimOutputPin,
    overfire_shutoff: SimOutputPin,
    shared: Arc<SharedState>,
    shutdown: Arc<AtomicBool>,
    controller: thread::JoinHandle<(furnacectl::error::Result<()>, Recorder)>,
}

fn fast_config() -> ControllerConfig {
    ControllerConfig {
        sampler: SamplerConfig {
            reads_per_cycle: 3,
            inter_read_delay_ms: 1,
            inter_cycle_delay_ms: 2,
        },
        control_loop_interval_ms: 10,
        max_sample_age_secs: 5,
        telemetry_interval_secs: 0,
        debounce_ms: 50,
        ..ControllerConfig::default()
    }
}

fn launch(start_celsius: f32) -> Harness {
    let config = fast_config();
    config.validate().unwrap();

    let thermo = SimThermocouple::new(start_celsius);
    let force_heat = SimOutputPin::new(true);
    let overfire_shutoff = SimOutputPin::new(true);
    let relays = RelayBoard::new(force_heat.clone(), overfire_shutoff.clone()).unwrap();

    let (cs, sck, so) = thermo.pins();
    let timing = Max6675Timing {
        select_settle_us: 10,
        clock_phase_us: 1,
        conversion_ms: 1,
    };
    let driver = Max6675::with_timing(cs, sck, so, StdDelay, config.unit, timing).unwrap();
    let sampler = TemperatureSampler::new(driver, StdDelay, config.sampler, config.unit);

    let shared = Arc::new(SharedState::new(&config));
    let shutdown = Arc::new(AtomicBool::new(false));

    let controller = {
        let shared = Arc::clone(&shared);
        let shutdown = Arc::clone(&shutdown);
        thread::spawn(move || {
            let mut sink = Recorder::new();
            let result = run_controller(&config, &shared, sampler, relays, &mut sink, &shutdown);
            (result, sink)
        })
    };

    Harness {
        thermo,
        force_heat,
        overfire_shutoff,
        shared,
        shutdown,
        controller,
    }
}

fn wait_for(what: &str, cond: impl Fn() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !cond() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        thread::sleep(Duration::from_millis(5));
    }
}

impl Harness {
    fn stop(self) -> Recorder {
        self.shutdown.store(true, Ordering::Release);
        let (result, sink) = self.controller.join().unwrap();
        result.unwrap();
        sink
    }
}

#[test]
fn overfire_trips_and_clears_through_the_whole_stack() {
    let h = launch(100.0);
    wait_for("normal heating", || !h.force_heat.level_high());

    h.thermo.set_celsius(250.0);
    wait_for("overfire", || h.shared.status.get().overfire);
    assert!(!h.overfire_shutoff.level_high(), "shutoff coil energised (line LOW)");
    assert!(h.force_heat.level_high(), "force heat released during overfire");

    h.thermo.set_celsius(190.0);
    thread::sleep(Duration::from_millis(60));
    assert!(h.shared.status.get().overfire, "still above the clear threshold");

    h.thermo.set_celsius(170.0);
    wait_for("overfire clear", || !h.shared.status.get().overfire);
    assert!(h.overfire_shutoff.level_high());

    wait_for("settled reading", || h.shared.report().flue_temperature == Some(170.0));
    assert_eq!(h.shared.report().state, StateId::Normal);

    let force_heat = h.force_heat.clone();
    let overfire_shutoff = h.overfire_shutoff.clone();
    let sink = h.stop();
    assert!(force_heat.level_high());
    assert!(overfire_shutoff.level_high());
    assert!(matches!(sink.events.first(), Some(ControlEvent::Started(StateId::Normal))));
    assert!(matches!(sink.events.last(), Some(ControlEvent::Stopped)));
}

#[test]
fn button_edge_starts_the_startup_sequence() {
    let h = launch(150.0);
    wait_for("first sample", || h.shared.report().flue_temperature.is_some());

    assert!(h.shared.button_edge());
    wait_for("startup", || h.shared.status.get().startup_active);
    assert!(!h.force_heat.level_high());

    h.thermo.set_celsius(176.0);
    wait_for("startup done", || {
        let status = h.shared.status.get();
        status.state == StateId::Normal
    });
    assert!(h.force_heat.level_high());
    assert!(!h.shared.report().button_pressed);

    h.stop();
}

#[test]
fn open_thermocouple_holds_the_relays() {
    let h = launch(100.0);
    wait_for("normal heating", || !h.force_heat.level_high());

    h.thermo.set_open_circuit(true);
    wait_for("unavailable reading", || h.shared.report().flue_temperature.is_none());
    let writes = h.force_heat.write_count();
    thread::sleep(Duration::from_millis(60));

    assert!(!h.force_heat.level_high(), "force heat held through the outage");
    assert_eq!(h.force_heat.write_count(), writes);

    let sink = h.stop();
    // A first tick that beat the first sample also reports an outage.
    let after_first_sample = sink
        .events
        .iter()
        .position(|e| matches!(e, ControlEvent::TemperatureRestored { .. }))
        .map_or(0, |i| i + 1);
    assert_eq!(
        sink.events[after_first_sample..]
            .iter()
            .filter(|e| matches!(e, ControlEvent::TemperatureUnavailable))
            .count(),
        1,
        "outage reported once"
    );
}
