//! Integration tests for the acquisition chain: simulated MAX6675 ->
//! Max6675 driver -> TemperatureSampler -> TemperatureStore.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use furnacectl::config::SamplerConfig;
use furnacectl::drivers::sim::{NoDelay, SimThermocouple};
use furnacectl::error::SensorError;
use furnacectl::sensors::TemperatureUnit;
use furnacectl::sensors::max6675::{Max6675, Max6675Timing};
use furnacectl::sensors::sampler::TemperatureSampler;
use furnacectl::sensors::store::TemperatureStore;

use crate::mock_hw::ScriptedSource;

const FAST: Max6675Timing = Max6675Timing {
    select_settle_us: 0,
    clock_phase_us: 0,
    conversion_ms: 0,
};

fn sampler_config(reads: u8) -> SamplerConfig {
    SamplerConfig {
        reads_per_cycle: reads,
        inter_read_delay_ms: 0,
        inter_cycle_delay_ms: 0,
    }
}

#[test]
fn one_fault_among_three_reads_is_dropped_from_the_mean() {
    let source = ScriptedSource::new([Ok(150.04), Err(SensorError::ThermocoupleOpen), Ok(160.0)]);
    let mut sampler = TemperatureSampler::new(source, NoDelay, sampler_config(3), TemperatureUnit::Celsius);

    let reading = sampler.run_cycle();
    assert_eq!(reading.value, Some(155.0));
    assert_eq!(reading.good_reads, 2);
}

#[test]
fn three_faults_publish_unavailable() {
    let source = ScriptedSource::new([]);
    let mut sampler = TemperatureSampler::new(source, NoDelay, sampler_config(3), TemperatureUnit::Celsius);

    let reading = sampler.run_cycle();
    assert_eq!(reading.value, None);
    assert_eq!(reading.good_reads, 0);
    assert!(!reading.is_available());
}

#[test]
fn driver_reads_simulated_thermocouple_in_configured_unit() {
    let thermo = SimThermocouple::new(100.0);
    let (cs, sck, so) = thermo.pins();
    let driver = Max6675::with_timing(cs, sck, so, NoDelay, TemperatureUnit::Fahrenheit, FAST).unwrap();
    let mut sampler = TemperatureSampler::new(driver, NoDelay, sampler_config(3), TemperatureUnit::Fahrenheit);

    let reading = sampler.run_cycle();
    assert_eq!(reading.value, Some(212.0));
    assert_eq!(reading.unit, TemperatureUnit::Fahrenheit);
    assert!(!thermo.is_selected(), "chip select released after the cycle");
}

#[test]
fn open_thermocouple_makes_the_cycle_unavailable() {
    let thermo = SimThermocouple::new(180.0);
    thermo.set_open_circuit(true);
    let (cs, sck, so) = thermo.pins();
    let driver = Max6675::with_timing(cs, sck, so, NoDelay, TemperatureUnit::Celsius, FAST).unwrap();
    let mut sampler = TemperatureSampler::new(driver, NoDelay, sampler_config(3), TemperatureUnit::Celsius);

    assert_eq!(sampler.run_cycle().value, None);

    thermo.set_open_circuit(false);
    assert_eq!(sampler.run_cycle().value, Some(180.0));
}

#[test]
fn background_sampler_publishes_until_shutdown() {
    let thermo = SimThermocouple::new(120.0);
    let (cs, sck, so) = thermo.pins();
    let driver = Max6675::with_timing(cs, sck, so, NoDelay, TemperatureUnit::Celsius, FAST).unwrap();
    let config = SamplerConfig {
        reads_per_cycle: 3,
        inter_read_delay_ms: 1,
        inter_cycle_delay_ms: 5,
    };
    let mut sampler = TemperatureSampler::new(
        driver,
        furnacectl::adapters::time::StdDelay,
        config,
        TemperatureUnit::Celsius,
    );

    let store = Arc::new(TemperatureStore::new());
    let shutdown = Arc::new(AtomicBool::new(false));
    let handle = {
        let store = Arc::clone(&store);
        let shutdown = Arc::clone(&shutdown);
        thread::spawn(move || {
            sampler.run(&store, &shutdown);
            sampler.cycles()
        })
    };

    let mut seen = None;
    for _ in 0..200 {
        seen = store.fresh_value(Duration::from_secs(5));
        if seen.is_some() {
            break;
        }
        thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(seen, Some(120.0));

    thermo.set_celsius(130.0);
    thread::sleep(Duration::from_millis(50));
    shutdown.store(true, Ordering::Release);
    let cycles = handle.join().unwrap();

    assert!(cycles >= 2);
    assert_eq!(store.snapshot().and_then(|r| r.value), Some(130.0));
}
