//! Temperature acquisition: the MAX6675 driver, the sampling pipeline,
//! and the shared store the pipeline publishes into.
//!
//! ```text
//!   Max6675 ──read()──▶ TemperatureSampler ──publish()──▶ TemperatureStore
//!   (bit-bang)          (N reads, mean, round)            (lock-guarded snapshot)
//! ```

pub mod max6675;
pub mod sampler;
pub mod store;

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, SensorError};

/// Read-side port: one raw-to-engineering temperature reading per call.
///
/// Implemented by [`max6675::Max6675`] on hardware and by scripted sources
/// in tests.  A failed read is never a value.
pub trait TemperatureSource {
    fn read_temperature(&mut self) -> Result<f32, SensorError>;
}

impl<T: TemperatureSource + ?Sized> TemperatureSource for &mut T {
    fn read_temperature(&mut self) -> Result<f32, SensorError> {
        (**self).read_temperature()
    }
}

/// Unit every published temperature (and every threshold) is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum TemperatureUnit {
    Celsius,
    Kelvin,
    Fahrenheit,
}

impl TemperatureUnit {
    /// Single-letter symbol: `C`, `K` or `F`.
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Celsius => "C",
            Self::Kelvin => "K",
            Self::Fahrenheit => "F",
        }
    }

    /// Express a Celsius temperature in this unit.
    pub fn convert_from_celsius(self, celsius: f32) -> f32 {
        match self {
            Self::Celsius => celsius,
            Self::Kelvin => celsius + 273.15,
            Self::Fahrenheit => celsius * 9.0 / 5.0 + 32.0,
        }
    }

    /// Express a temperature in this unit as Celsius.
    pub fn convert_to_celsius(self, value: f32) -> f32 {
        match self {
            Self::Celsius => value,
            Self::Kelvin => value - 273.15,
            Self::Fahrenheit => (value - 32.0) * 5.0 / 9.0,
        }
    }

    /// Scale a Celsius temperature *difference* into this unit.
    pub fn delta_from_celsius(self, delta: f32) -> f32 {
        match self {
            Self::Celsius | Self::Kelvin => delta,
            Self::Fahrenheit => delta * 9.0 / 5.0,
        }
    }

    /// Scale a temperature difference in this unit into Celsius.
    pub fn delta_to_celsius(self, delta: f32) -> f32 {
        match self {
            Self::Celsius | Self::Kelvin => delta,
            Self::Fahrenheit => delta * 5.0 / 9.0,
        }
    }
}

impl FromStr for TemperatureUnit {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "C" | "c" => Ok(Self::Celsius),
            "K" | "k" => Ok(Self::Kelvin),
            "F" | "f" => Ok(Self::Fahrenheit),
            other => Err(ConfigError::InvalidUnit(other.to_owned())),
        }
    }
}

impl TryFrom<String> for TemperatureUnit {
    type Error = ConfigError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<TemperatureUnit> for &'static str {
    fn from(unit: TemperatureUnit) -> Self {
        unit.symbol()
    }
}

impl fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Kelvin => f.write_str("K"),
            other => write!(f, "\u{00b0}{}", other.symbol()),
        }
    }
}
