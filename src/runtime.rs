//! Controller runtime: shared state, reporting, and the thread layout.
//!
//! ```text
//!   sampler thread ──publish──▶ SharedState.temperature ◀──read── control loop
//!   edge handler  ──on_edge──▶ SharedState.button     ◀──take── control loop
//!   control loop  ──publish──▶ SharedState.status     ◀──read── report()
//! ```
//!
//! Everything shared lives in one [`SharedState`] behind an `Arc`; there
//! are no globals.  The relays belong to the control loop alone and are
//! wrapped in [`SafeShutdown`], which drives them off on every exit path
//! that still runs destructors (normal return, error, panic unwinding).

use core::ops::{Deref, DerefMut};
use core::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use embedded_hal::delay::DelayNs;
use log::{error, info, warn};
use parking_lot::Mutex;
use serde::Serialize;

use crate::adapters::time::MonotonicClock;
use crate::app::events::{ControlEvent, TelemetryData};
use crate::app::ports::{EventSink, RelayPort};
use crate::app::service::{ControlService, ControlStatus};
use crate::config::ControllerConfig;
use crate::drivers::button::ButtonMonitor;
use crate::error::{Error, Result};
use crate::fsm::StateId;
use crate::sensors::sampler::TemperatureSampler;
use crate::sensors::store::TemperatureStore;
use crate::sensors::{TemperatureSource, TemperatureUnit};

/// Longest single sleep in the control loop, bounding shutdown latency.
const SHUTDOWN_POLL: Duration = Duration::from_millis(50);

// ───────────────────────────────────────────────────────────────
// Shared state
// ───────────────────────────────────────────────────────────────

/// Control status published by the control loop after every tick.
#[derive(Debug, Default)]
pub struct StatusBoard {
    inner: Mutex<ControlStatus>,
}

impl StatusBoard {
    pub fn publish(&self, status: ControlStatus) {
        *self.inner.lock() = status;
    }

    pub fn get(&self) -> ControlStatus {
        *self.inner.lock()
    }
}

/// Every field shared between the controller's execution contexts.
#[derive(Debug)]
pub struct SharedState {
    pub temperature: TemperatureStore,
    pub button: ButtonMonitor,
    pub status: StatusBoard,
    unit: TemperatureUnit,
    clock: MonotonicClock,
}

impl SharedState {
    pub fn new(config: &ControllerConfig) -> Self {
        Self {
            temperature: TemperatureStore::new(),
            button: ButtonMonitor::new(config.debounce_ms),
            status: StatusBoard::default(),
            unit: config.unit,
            clock: MonotonicClock::new(),
        }
    }

    /// Milliseconds since the controller came up.
    pub fn uptime_ms(&self) -> u64 {
        self.clock.uptime_ms()
    }

    /// Rising edge on the startup button, timestamped now.  Safe to call
    /// from an interrupt thread.
    pub fn button_edge(&self) -> bool {
        self.button.on_edge_at(self.clock.uptime_ms())
    }

    /// Read-only snapshot for dashboards and the console.
    pub fn report(&self) -> ControllerReport {
        let reading = self.temperature.snapshot();
        let status = self.status.get();
        ControllerReport {
            flue_temperature: reading.and_then(|r| r.value),
            unit: reading.map_or(self.unit, |r| r.unit),
            last_polled: reading.map(|r| r.sampled_at.format("%Y-%m-%d %H:%M:%S").to_string()),
            state: status.state,
            overfire: status.overfire,
            force_heat_active: status.force_heat_active,
            overfire_force_shutoff_active: status.overfire_shutoff_relay,
            force_heat_on_active: status.force_heat_relay,
            startup_active: status.startup_active,
            button_pressed: status.button_pending || self.button.is_pending(),
            startup_bounce_count: status.startup_bounce_count,
            uptime_secs: self.clock.uptime_secs(),
        }
    }
}

/// Reporting snapshot.  Field names follow the dashboard's JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControllerReport {
    /// `null` when the last cycle had no successful read.
    pub flue_temperature: Option<f32>,
    pub unit: TemperatureUnit,
    /// Local time of the last completed sampler cycle.
    pub last_polled: Option<String>,
    pub state: StateId,
    pub overfire: bool,
    pub force_heat_active: bool,
    pub overfire_force_shutoff_active: Option<bool>,
    pub force_heat_on_active: Option<bool>,
    pub startup_active: bool,
    pub button_pressed: bool,
    pub startup_bounce_count: u32,
    pub uptime_secs: u64,
}

impl ControllerReport {
    pub fn to_json(&self) -> core::result::Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// ───────────────────────────────────────────────────────────────
// Safe shutdown guard
// ───────────────────────────────────────────────────────────────

/// Owns the relays and de-energises them all when dropped.
pub struct SafeShutdown<R: RelayPort> {
    relays: R,
}

impl<R: RelayPort> SafeShutdown<R> {
    pub fn new(relays: R) -> Self {
        Self { relays }
    }
}

impl<R: RelayPort> Deref for SafeShutdown<R> {
    type Target = R;

    fn deref(&self) -> &R {
        &self.relays
    }
}

impl<R: RelayPort> DerefMut for SafeShutdown<R> {
    fn deref_mut(&mut self) -> &mut R {
        &mut self.relays
    }
}

impl<R: RelayPort> Drop for SafeShutdown<R> {
    fn drop(&mut self) {
        match self.relays.all_off() {
            Ok(()) => info!("relays de-energised"),
            Err(e) => error!("relay safe shutdown failed: {e}"),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Runner
// ───────────────────────────────────────────────────────────────

/// Run the controller until `shutdown` is raised.
///
/// Spawns the sampler thread, runs the control loop on the calling
/// thread, then joins the sampler and drives every relay off.  Returns
/// early only if the relays cannot be initialised or the sampler thread
/// cannot be spawned; the relays are driven off in those cases too.
pub fn run_controller<S, D, R, E>(
    config: &ControllerConfig,
    shared: &Arc<SharedState>,
    sampler: TemperatureSampler<S, D>,
    relays: R,
    sink: &mut E,
    shutdown: &Arc<AtomicBool>,
) -> Result<()>
where
    S: TemperatureSource + Send + 'static,
    D: DelayNs + Send + 'static,
    R: RelayPort,
    E: EventSink,
{
    let mut relays = SafeShutdown::new(relays);
    let mut service = ControlService::new(config.clone());
    service.start(&mut *relays, sink)?;
    shared.status.publish(service.status(&mut *relays));

    let sampler_thread = spawn_sampler(sampler, Arc::clone(shared), Arc::clone(shutdown))?;

    control_loop(config, shared, &mut service, &mut *relays, sink, shutdown, &sampler_thread);

    shutdown.store(true, Ordering::Release);
    if sampler_thread.join().is_err() {
        error!("sampler thread panicked");
    }

    service.shutdown(&mut *relays, sink)?;
    shared.status.publish(service.status(&mut *relays));
    Ok(())
}

fn spawn_sampler<S, D>(
    mut sampler: TemperatureSampler<S, D>,
    shared: Arc<SharedState>,
    shutdown: Arc<AtomicBool>,
) -> Result<JoinHandle<()>>
where
    S: TemperatureSource + Send + 'static,
    D: DelayNs + Send + 'static,
{
    thread::Builder::new()
        .name("sampler".into())
        .spawn(move || sampler.run(&shared.temperature, &shutdown))
        .map_err(Error::Spawn)
}

fn control_loop<R: RelayPort, E: EventSink>(
    config: &ControllerConfig,
    shared: &SharedState,
    service: &mut ControlService,
    relays: &mut R,
    sink: &mut E,
    shutdown: &AtomicBool,
    sampler_thread: &JoinHandle<()>,
) {
    let interval = Duration::from_millis(u64::from(config.control_loop_interval_ms));
    let max_age = Duration::from_secs(u64::from(config.max_sample_age_secs));
    let telemetry_every = Duration::from_secs(u64::from(config.telemetry_interval_secs));
    let mut last_telemetry = Instant::now();
    let mut sampler_lost = false;

    info!("control loop running every {} ms", config.control_loop_interval_ms);

    while !shutdown.load(Ordering::Acquire) {
        let tick_started = Instant::now();

        if !sampler_lost && sampler_thread.is_finished() {
            sampler_lost = true;
            error!("sampler thread exited; readings will go stale and relays will be held");
        }

        let temperature = shared.temperature.fresh_value(max_age);
        if let Err(e) = service.tick(temperature, &shared.button, relays, sink) {
            warn!("control tick incomplete ({e}), re-applying next tick");
        }

        let status = service.status(relays);
        shared.status.publish(status);

        if !telemetry_every.is_zero() && last_telemetry.elapsed() >= telemetry_every {
            last_telemetry = Instant::now();
            sink.emit(&ControlEvent::Telemetry(TelemetryData {
                temperature: shared.temperature.snapshot().and_then(|r| r.value),
                unit: config.unit,
                status,
            }));
        }

        sleep_until(tick_started + interval, shutdown);
    }

    info!("control loop stopping after {} ticks", service.tick_count());
}

/// Sleep until `deadline` in short slices, returning early on shutdown.
fn sleep_until(deadline: Instant, shutdown: &AtomicBool) {
    loop {
        if shutdown.load(Ordering::Acquire) {
            return;
        }
        let now = Instant::now();
        if now >= deadline {
            return;
        }
        thread::sleep((deadline - now).min(SHUTDOWN_POLL));
    }
}
