//! furnacectl: wood furnace overfire protection and force-heat control.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                     │
//! │                                                              │
//! │  RelayBoard      LogEventSink   JsonConfigFile   StdDelay    │
//! │  (RelayPort)     (EventSink)    (ConfigPort)     (DelayNs)   │
//! │  Max6675 + TemperatureSampler   ButtonMonitor                │
//! │                                                              │
//! │  ─────────────── Port Trait Boundary ─────────────────       │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │            ControlService (pure logic)                 │  │
//! │  │  OverfireSupervisor · FSM (Normal/Startup/Overfire)    │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! │                                                              │
//! │  runtime: sampler thread · control loop · SafeShutdown       │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Built with `--features rpi` it drives the Raspberry Pi GPIO header.
//! Without it, the same controller runs against a simulated furnace and a
//! console on stdin (`press`, `temp <celsius>`, `open`, `close`,
//! `report`).

#![deny(unused_must_use)]

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM};
use tracing_subscriber::EnvFilter;

use furnacectl::adapters::config_file::JsonConfigFile;
use furnacectl::adapters::log_sink::LogEventSink;
use furnacectl::app::ports::ConfigPort;
use furnacectl::config::ControllerConfig;
use furnacectl::runtime::SharedState;
use furnacectl::sensors::TemperatureUnit;

#[derive(Parser, Debug)]
#[command(name = "furnacectl", version, about = "Wood furnace overfire and force-heat controller")]
struct Cli {
    /// JSON configuration file.  Defaults apply when absent.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Working temperature unit (C, K or F).  Thresholds are converted.
    #[arg(short, long)]
    unit: Option<TemperatureUnit>,

    /// Log filter used when RUST_LOG is not set.
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Starting flue temperature of the simulated furnace (Celsius).
    #[cfg(not(feature = "rpi"))]
    #[arg(long, default_value_t = 40.0)]
    sim_start: f32,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    info!("╔══════════════════════════════════════╗");
    info!("║  furnacectl v{:<24}║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let config = load_config(&cli)?;
    info!(
        "unit={} overfire={}/{} startup={}/{} normal={}..{} bounces={}",
        config.unit,
        config.thresholds.overfire_high,
        config.thresholds.overfire_clear,
        config.thresholds.startup_high,
        config.thresholds.startup_low,
        config.thresholds.normal_low,
        config.thresholds.normal_release(),
        config.startup_bounce_cycles,
    );

    let shutdown = Arc::new(AtomicBool::new(false));
    for signal in [SIGINT, SIGTERM, SIGHUP] {
        signal_hook::flag::register(signal, Arc::clone(&shutdown))
            .with_context(|| format!("registering handler for signal {signal}"))?;
    }

    let shared = Arc::new(SharedState::new(&config));
    let mut sink = LogEventSink::new();

    run(&cli, &config, &shared, &mut sink, &shutdown)?;

    info!("furnacectl stopped");
    Ok(())
}

fn load_config(cli: &Cli) -> Result<ControllerConfig> {
    let source = JsonConfigFile::new(cli.config.clone());
    let mut config = source.load().with_context(|| match source.path() {
        Some(path) => format!("loading {}", path.display()),
        None => "loading default configuration".to_owned(),
    })?;
    if let Some(unit) = cli.unit {
        config.set_unit(unit);
        config.validate().context("configuration after unit override")?;
    }
    Ok(config)
}

#[cfg(feature = "rpi")]
fn run(
    _cli: &Cli,
    config: &ControllerConfig,
    shared: &Arc<SharedState>,
    sink: &mut LogEventSink,
    shutdown: &Arc<AtomicBool>,
) -> Result<()> {
    use furnacectl::adapters::time::StdDelay;
    use furnacectl::drivers::rpi::PiHardware;
    use furnacectl::runtime::run_controller;
    use furnacectl::sensors::sampler::TemperatureSampler;

    let mut hw = PiHardware::open(config).context("opening GPIO")?;
    hw.arm_button(Arc::clone(shared)).context("arming startup button")?;
    info!("GPIO ready (BCM pins {:?})", config.pins);

    let sampler = TemperatureSampler::new(hw.thermocouple, StdDelay, config.sampler, config.unit);
    run_controller(config, shared, sampler, hw.relays, sink, shutdown)?;
    drop(hw.button);
    Ok(())
}

#[cfg(not(feature = "rpi"))]
fn run(
    cli: &Cli,
    config: &ControllerConfig,
    shared: &Arc<SharedState>,
    sink: &mut LogEventSink,
    shutdown: &Arc<AtomicBool>,
) -> Result<()> {
    sim::run(cli.sim_start, config, shared, sink, shutdown)
}

/// Host simulation: furnace model, polled button, stdin console.
#[cfg(not(feature = "rpi"))]
mod sim {
    use std::io::BufRead;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;
    use std::time::Duration;

    use anyhow::{Context, Result};
    use log::{info, warn};

    use furnacectl::adapters::hardware::RelayBoard;
    use furnacectl::adapters::log_sink::LogEventSink;
    use furnacectl::adapters::time::StdDelay;
    use furnacectl::config::ControllerConfig;
    use furnacectl::drivers::button::ButtonPoller;
    use furnacectl::drivers::sim::{SimFurnace, SimInputPin, SimOutputPin, SimThermocouple};
    use furnacectl::runtime::{SharedState, run_controller};
    use furnacectl::sensors::max6675::Max6675;
    use furnacectl::sensors::sampler::TemperatureSampler;

    const FURNACE_STEP: Duration = Duration::from_millis(500);
    const BUTTON_POLL: Duration = Duration::from_millis(10);
    const PRESS_HOLD: Duration = Duration::from_millis(50);

    pub fn run(
        start_celsius: f32,
        config: &ControllerConfig,
        shared: &Arc<SharedState>,
        sink: &mut LogEventSink,
        shutdown: &Arc<AtomicBool>,
    ) -> Result<()> {
        let thermo = SimThermocouple::new(start_celsius);
        let force_heat = SimOutputPin::new(true);
        let overfire_shutoff = SimOutputPin::new(true);
        let button = SimInputPin::default();

        let relays = RelayBoard::new(force_heat.clone(), overfire_shutoff.clone())?;
        let (cs, sck, so) = thermo.pins();
        let thermocouple = Max6675::new(cs, sck, so, StdDelay, config.unit)?;
        let sampler = TemperatureSampler::new(thermocouple, StdDelay, config.sampler, config.unit);

        let furnace = {
            let mut model = SimFurnace::new(thermo.clone(), force_heat, overfire_shutoff);
            let shutdown = Arc::clone(shutdown);
            thread::Builder::new()
                .name("sim-furnace".into())
                .spawn(move || {
                    while !shutdown.load(Ordering::Acquire) {
                        model.step(FURNACE_STEP.as_secs_f32());
                        thread::sleep(FURNACE_STEP);
                    }
                })
                .context("spawning furnace model")?
        };

        let poller = {
            let mut poller = ButtonPoller::new(button.clone());
            let shared = Arc::clone(shared);
            let shutdown = Arc::clone(shutdown);
            thread::Builder::new()
                .name("button".into())
                .spawn(move || {
                    while !shutdown.load(Ordering::Acquire) {
                        poller.poll(&shared.button, shared.uptime_ms());
                        thread::sleep(BUTTON_POLL);
                    }
                })
                .context("spawning button poller")?
        };

        // Blocks on stdin, so it is left detached at exit.
        {
            let shared = Arc::clone(shared);
            thread::Builder::new()
                .name("console".into())
                .spawn(move || console(&thermo, &button, &shared))
                .context("spawning console")?;
        }

        info!("simulator running; commands: press | temp <celsius> | open | close | report");
        run_controller(config, shared, sampler, relays, sink, shutdown)?;

        for (name, handle) in [("sim-furnace", furnace), ("button", poller)] {
            if handle.join().is_err() {
                warn!("{name} thread panicked");
            }
        }
        Ok(())
    }

    fn console(thermo: &SimThermocouple, button: &SimInputPin, shared: &SharedState) {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            let mut words = line.split_whitespace();
            match (words.next(), words.next()) {
                (Some("press"), None) => {
                    button.set_level(true);
                    thread::sleep(PRESS_HOLD);
                    button.set_level(false);
                }
                (Some("temp"), Some(value)) => match value.parse::<f32>() {
                    Ok(celsius) => {
                        thermo.set_celsius(celsius);
                        info!("sim: thermocouple set to {celsius:.1} C");
                    }
                    Err(_) => warn!("sim: not a temperature: {value}"),
                },
                (Some("open"), None) => {
                    thermo.set_open_circuit(true);
                    info!("sim: thermocouple disconnected");
                }
                (Some("close"), None) => {
                    thermo.set_open_circuit(false);
                    info!("sim: thermocouple reconnected");
                }
                (Some("report"), None) => match shared.report().to_json() {
                    Ok(json) => println!("{json}"),
                    Err(e) => warn!("sim: report failed: {e}"),
                },
                (None, _) => {}
                _ => warn!("sim: unknown command: {line}"),
            }
        }
    }
}
