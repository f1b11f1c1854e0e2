//! Controller configuration parameters
//!
//! All tunable parameters for the furnace controller.  Values are loaded
//! from a JSON file through a [`ConfigPort`](crate::app::ports::ConfigPort)
//! adapter; any field missing from the file keeps its default.
//!
//! Thresholds are expressed in the configured [`TemperatureUnit`].  The
//! defaults are the Celsius values for one specific furnace and thermocouple, and
//! every installation must set its own.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::pins;
use crate::sensors::TemperatureUnit;
use crate::sensors::max6675::Max6675Timing;
use crate::sensors::sampler::MAX_READS_PER_CYCLE;

/// Temperature thresholds driving the control state machine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Startup bounce: stop forcing heat at or above this.
    pub startup_high: f32,
    /// Startup bounce: force heat again at or below this.
    pub startup_low: f32,
    /// Overfire shutoff trips at or above this.
    pub overfire_high: f32,
    /// Overfire shutoff releases at or below this.
    pub overfire_clear: f32,
    /// Normal heating: force heat below this.
    pub normal_low: f32,
    /// Normal heating: release force heat at `normal_low + normal_low_hysteresis`.
    pub normal_low_hysteresis: f32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            startup_high: 175.0, // wood loaded, taper off
            startup_low: 165.0,  // starting up, bounce from here
            overfire_high: 245.0,
            overfire_clear: 180.0,
            normal_low: 115.0,
            normal_low_hysteresis: 15.0,
        }
    }
}

impl Thresholds {
    /// Temperature at which normal force-heat is released.
    pub fn normal_release(&self) -> f32 {
        self.normal_low + self.normal_low_hysteresis
    }

    /// Re-express every threshold in another unit.
    pub fn converted(&self, from: TemperatureUnit, to: TemperatureUnit) -> Self {
        let point = |v: f32| to.convert_from_celsius(from.convert_to_celsius(v));
        Self {
            startup_high: point(self.startup_high),
            startup_low: point(self.startup_low),
            overfire_high: point(self.overfire_high),
            overfire_clear: point(self.overfire_clear),
            normal_low: point(self.normal_low),
            normal_low_hysteresis: to.delta_from_celsius(from.delta_to_celsius(self.normal_low_hysteresis)),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let all = [
            self.startup_high,
            self.startup_low,
            self.overfire_high,
            self.overfire_clear,
            self.normal_low,
            self.normal_low_hysteresis,
        ];
        if all.iter().any(|v| !v.is_finite()) {
            return Err(ConfigError::ValidationFailed("thresholds must be finite"));
        }
        if self.overfire_clear >= self.overfire_high {
            return Err(ConfigError::ValidationFailed(
                "overfire_clear must be below overfire_high",
            ));
        }
        if self.startup_low >= self.startup_high {
            return Err(ConfigError::ValidationFailed(
                "startup_low must be below startup_high",
            ));
        }
        if self.startup_high >= self.overfire_high {
            return Err(ConfigError::ValidationFailed(
                "startup_high must be below overfire_high",
            ));
        }
        if self.normal_low_hysteresis <= 0.0 {
            return Err(ConfigError::ValidationFailed(
                "normal_low_hysteresis must be positive",
            ));
        }
        if self.normal_release() >= self.overfire_high {
            return Err(ConfigError::ValidationFailed(
                "normal heating release must be below overfire_high",
            ));
        }
        Ok(())
    }
}

/// Sampling pipeline timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Sensor reads averaged per published sample.
    pub reads_per_cycle: u8,
    /// Delay between reads inside one cycle (milliseconds).
    pub inter_read_delay_ms: u32,
    /// Delay after publishing before the next cycle (milliseconds).
    pub inter_cycle_delay_ms: u32,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            reads_per_cycle: 3,
            inter_read_delay_ms: 100,
            inter_cycle_delay_ms: 100,
        }
    }
}

impl SamplerConfig {
    /// Longest gap between two published samples when every read takes
    /// `read_ms`.
    pub fn worst_case_cycle_ms(&self, read_ms: u64) -> u64 {
        let reads = u64::from(self.reads_per_cycle);
        reads * read_ms
            + reads.saturating_sub(1) * u64::from(self.inter_read_delay_ms)
            + u64::from(self.inter_cycle_delay_ms)
    }
}

/// BCM pin assignments.  Only consulted when driving real GPIO.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PinConfig {
    pub thermo_cs: u8,
    pub thermo_sck: u8,
    pub thermo_so: u8,
    pub force_heat: u8,
    pub overfire_shutoff: u8,
    pub startup_button: u8,
}

impl Default for PinConfig {
    fn default() -> Self {
        Self {
            thermo_cs: pins::THERMO_CS_GPIO,
            thermo_sck: pins::THERMO_SCK_GPIO,
            thermo_so: pins::THERMO_SO_GPIO,
            force_heat: pins::FORCE_HEAT_GPIO,
            overfire_shutoff: pins::OVERFIRE_SHUTOFF_GPIO,
            startup_button: pins::STARTUP_BUTTON_GPIO,
        }
    }
}

/// Core controller configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    // --- Measurement ---
    /// Unit of every published temperature and every threshold.
    pub unit: TemperatureUnit,
    /// Sampler timing.
    pub sampler: SamplerConfig,
    /// Readings older than this are treated as unavailable (seconds).
    pub max_sample_age_secs: u32,

    // --- Control ---
    pub thresholds: Thresholds,
    /// How many times startup bounces between startup high and low.
    pub startup_bounce_cycles: u32,
    /// Startup button debounce window (milliseconds).
    pub debounce_ms: u32,
    /// Control loop interval (milliseconds).
    pub control_loop_interval_ms: u32,

    // --- Reporting ---
    /// Telemetry log interval (seconds).  0 disables it.
    pub telemetry_interval_secs: u32,

    // --- Hardware ---
    pub pins: PinConfig,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            unit: TemperatureUnit::Celsius,
            sampler: SamplerConfig::default(),
            max_sample_age_secs: 30,

            thresholds: Thresholds::default(),
            startup_bounce_cycles: 1,
            debounce_ms: 500,
            control_loop_interval_ms: 2000, // 0.5 Hz

            telemetry_interval_secs: 60,

            pins: PinConfig::default(),
        }
    }
}

impl ControllerConfig {
    /// Parse a JSON document and validate it.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Switch the working unit, converting every threshold with it.
    pub fn set_unit(&mut self, unit: TemperatureUnit) {
        self.thresholds = self.thresholds.converted(self.unit, unit);
        self.unit = unit;
    }

    /// Reject configurations that would make the controller unsafe or
    /// unable to run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.thresholds.validate()?;
        if self.startup_bounce_cycles == 0 {
            return Err(ConfigError::ValidationFailed(
                "startup_bounce_cycles must be at least 1",
            ));
        }
        let reads = self.sampler.reads_per_cycle as usize;
        if reads == 0 || reads > MAX_READS_PER_CYCLE {
            return Err(ConfigError::ValidationFailed(
                "sampler.reads_per_cycle must be between 1 and 8",
            ));
        }
        if self.control_loop_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "control_loop_interval_ms must be positive",
            ));
        }
        if self.debounce_ms == 0 {
            return Err(ConfigError::ValidationFailed("debounce_ms must be positive"));
        }
        if u64::from(self.max_sample_age_secs) * 1000 <= u64::from(self.control_loop_interval_ms) {
            return Err(ConfigError::ValidationFailed(
                "max_sample_age_secs must exceed one control interval",
            ));
        }
        let cycle_ms = self.sampler.worst_case_cycle_ms(Max6675Timing::default().transaction_ms());
        if cycle_ms >= u64::from(self.max_sample_age_secs) * 1000 {
            return Err(ConfigError::ValidationFailed(
                "one sampler cycle must finish within max_sample_age_secs",
            ));
        }
        Ok(())
    }
}
