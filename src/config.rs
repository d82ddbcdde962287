//! Console configuration and its JSON/YAML persistence.
//!
//! Every field has a default matching the bench setup the tool was built
//! for, so a partial file only overrides what it names.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::data::regression::{FitWindow, PhysicalParameters};
use crate::data::simulation::SimulationConfig;
use crate::error::ConfigError;

/// Serial link and worker settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionConfig {
    /// Serial port name, e.g. `/dev/ttyUSB0` or `COM3`.
    pub port: String,
    pub baud_rate: u32,
    /// Upper bound of one blocking line read; also the cancellation latency.
    pub read_timeout_ms: u64,
    /// How long `stop()` waits for the worker to exit.
    pub stop_timeout_ms: u64,
    /// Request a redraw every N appended samples (0 disables).
    pub redraw_every: usize,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            port: String::new(),
            baud_rate: 115_200,
            read_timeout_ms: 1_000,
            stop_timeout_ms: 2_000,
            redraw_every: 10,
        }
    }
}

impl AcquisitionConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }
}

/// Complete console configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct HotWireConfig {
    pub physical: PhysicalParameters,
    pub fit_window: FitWindow,
    pub acquisition: AcquisitionConfig,
    pub simulation: SimulationConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Yaml,
}

fn format_for(path: &Path) -> Result<Format, ConfigError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "json" => Ok(Format::Json),
        "yaml" | "yml" => Ok(Format::Yaml),
        _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
    }
}

/// Serialize the configuration as pretty JSON.
pub fn config_to_json(cfg: &HotWireConfig) -> Result<String, ConfigError> {
    Ok(serde_json::to_string_pretty(cfg)?)
}

pub fn config_from_json(json: &str) -> Result<HotWireConfig, ConfigError> {
    Ok(serde_json::from_str(json)?)
}

pub fn config_to_yaml(cfg: &HotWireConfig) -> Result<String, ConfigError> {
    Ok(serde_yaml::to_string(cfg)?)
}

pub fn config_from_yaml(yaml: &str) -> Result<HotWireConfig, ConfigError> {
    Ok(serde_yaml::from_str(yaml)?)
}

/// Save to `path`; the format follows the extension (`.json`, `.yaml`, `.yml`).
pub fn save_config_to_path(cfg: &HotWireConfig, path: &Path) -> Result<(), ConfigError> {
    let txt = match format_for(path)? {
        Format::Json => config_to_json(cfg)?,
        Format::Yaml => config_to_yaml(cfg)?,
    };
    std::fs::write(path, txt).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Load from `path`; the format follows the extension.
pub fn load_config_from_path(path: &Path) -> Result<HotWireConfig, ConfigError> {
    let format = format_for(path)?;
    let txt = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    match format {
        Format::Json => config_from_json(&txt),
        Format::Yaml => config_from_yaml(&txt),
    }
}
