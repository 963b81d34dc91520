//! Game settings
//!
//! Tuning for both modes, the serial pad and the record location. Persisted
//! as JSON; every section falls back to its defaults field by field.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::input::ReleaseTiming;
use crate::input::device::AUTO_PORT;
use crate::sim::difficulty::DifficultyTuning;
use crate::sim::memory::MemoryTuning;

/// Settings file used when `TITANIC_CONFIG` is unset
pub const DEFAULT_SETTINGS_PATH: &str = "titanic-memory.json";
/// Record file used when neither settings nor environment name one
pub const DEFAULT_RECORD_PATH: &str = "titanic-record.json";

pub const ENV_CONFIG: &str = "TITANIC_CONFIG";
pub const ENV_SERIAL_PORT: &str = "TITANIC_SERIAL_PORT";
pub const ENV_SERIAL_DISABLED: &str = "TITANIC_SERIAL_DISABLED";
pub const ENV_RECORD_PATH: &str = "TITANIC_RECORD_PATH";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings file I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("settings file is invalid: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Serial pad configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceSettings {
    pub enabled: bool,
    /// Port name such as `/dev/ttyACM0` or `COM3`, or `auto` to search USB ports
    pub port: String,
    pub baud: u32,
    /// Receive-side debounce window
    pub debounce_ms: u64,
    /// Upper bound on one poll's read
    pub read_timeout_ms: u64,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            port: AUTO_PORT.to_string(),
            baud: 115_200,
            debounce_ms: 200,
            read_timeout_ms: 1,
        }
    }
}

/// Everything the binary reads at startup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Titanic difficulty curve
    pub difficulty: DifficultyTuning,
    /// Memory sequence rules and timings
    pub memory: MemoryTuning,
    pub device: DeviceSettings,
    /// Release detection, used only when the terminal cannot report releases
    pub keyboard: ReleaseTiming,
    /// Where the best memory level lives
    pub record_path: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            difficulty: DifficultyTuning::default(),
            memory: MemoryTuning::default(),
            device: DeviceSettings::default(),
            keyboard: ReleaseTiming::default(),
            record_path: PathBuf::from(DEFAULT_RECORD_PATH),
        }
    }
}

impl Settings {
    /// Load from `path`, falling back to defaults if it is missing or invalid
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::try_load(path) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(SettingsError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                log::info!("No settings at {}, using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                log::warn!("Using default settings: {}", e);
                Self::default()
            }
        }
    }

    pub fn try_load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let json = fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&json)?;
        Ok(settings.sanitized())
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        log::info!("Settings saved");
        Ok(())
    }

    /// Clamp tunables so the game's invariants hold for any file content
    pub fn sanitized(mut self) -> Self {
        self.difficulty = self.difficulty.sanitized();
        self.memory = self.memory.sanitized();
        self.keyboard = self.keyboard.sanitized();
        self
    }

    /// Apply environment overrides through `lookup` (normally `std::env::var`)
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup(ENV_SERIAL_PORT).filter(|p| !p.trim().is_empty()) {
            log::debug!("Serial port overridden: {}", port);
            self.device.port = port;
        }
        if lookup(ENV_SERIAL_DISABLED).is_some_and(|flag| is_truthy(&flag)) {
            log::debug!("Serial pad disabled by environment");
            self.device.enabled = false;
        }
        if let Some(path) = lookup(ENV_RECORD_PATH).filter(|p| !p.trim().is_empty()) {
            self.record_path = PathBuf::from(path);
        }
    }
}

/// Settings file location, honoring `TITANIC_CONFIG`
pub fn settings_path<F>(lookup: F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    lookup(ENV_CONFIG)
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_PATH))
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
