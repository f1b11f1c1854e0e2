//! JSON file configuration adapter.
//!
//! Implements [`ConfigPort`] over an optional file path.  No path, or a
//! path that does not exist yet, yields the defaults; anything else that
//! goes wrong is an error, since guessing at thresholds is not an option.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::info;

use crate::app::ports::ConfigPort;
use crate::config::ControllerConfig;
use crate::error::ConfigError;

#[derive(Debug, Clone, Default)]
pub struct JsonConfigFile {
    path: Option<PathBuf>,
}

impl JsonConfigFile {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl ConfigPort for JsonConfigFile {
    fn load(&self) -> Result<ControllerConfig, ConfigError> {
        let Some(path) = &self.path else {
            info!("JsonConfigFile: no config file given, using defaults");
            return Ok(ControllerConfig::default());
        };

        match fs::read_to_string(path) {
            Ok(text) => {
                let config = ControllerConfig::from_json_str(&text)?;
                info!("JsonConfigFile: loaded {}", path.display());
                Ok(config)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("JsonConfigFile: {} not found, using defaults", path.display());
                Ok(ControllerConfig::default())
            }
            Err(e) => Err(ConfigError::Io(e)),
        }
    }
}
