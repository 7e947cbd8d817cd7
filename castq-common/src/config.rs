//! Configuration loading and config file resolution
//!
//! The configuration is a small TOML document. Every key has a built-in
//! default, so a missing file or a partial file is never fatal.
//!
//! Config file resolution priority:
//! 1. Command-line argument (highest priority)
//! 2. `CASTQ_CONFIG` environment variable
//! 3. Platform config directory (`<config_dir>/castq/config.toml`)
//! 4. Built-in defaults (fallback)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "CASTQ_CONFIG";

/// Allowed range for the snapshot refresh cadence
const MIN_TICK_INTERVAL_MS: u64 = 10;
const MAX_TICK_INTERVAL_MS: u64 = 5000;

/// Top-level configuration document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerConfig {
    #[serde(default)]
    pub player: PlayerSettings,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Playback engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSettings {
    /// How often the published elapsed time is refreshed while playing
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Default step for speed increase/decrease
    #[serde(default = "default_speed_step_ms")]
    pub speed_step_ms: u64,

    /// Capacity of the change-notification channel
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_tick_interval_ms() -> u64 {
    100
}

fn default_speed_step_ms() -> u64 {
    500
}

fn default_event_capacity() -> usize {
    100
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            speed_step_ms: default_speed_step_ms(),
            event_capacity: default_event_capacity(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl PlayerSettings {
    /// Tick interval clamped to 10..=5000 ms
    pub fn tick_interval(&self) -> Duration {
        let clamped = self
            .tick_interval_ms
            .clamp(MIN_TICK_INTERVAL_MS, MAX_TICK_INTERVAL_MS);
        if clamped != self.tick_interval_ms {
            warn!(
                "tick_interval_ms={} out of range, using {}",
                self.tick_interval_ms, clamped
            );
        }
        Duration::from_millis(clamped)
    }

    /// Speed step, never zero
    pub fn speed_step(&self) -> Duration {
        Duration::from_millis(self.speed_step_ms.max(1))
    }

    /// Event channel capacity, never zero
    pub fn event_capacity(&self) -> usize {
        self.event_capacity.max(1)
    }
}

impl PlayerConfig {
    /// Parse a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load a specific config file
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::NotFound(format!(
                "config file {}",
                path.display()
            )));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content).map_err(|e| {
            Error::Config(format!("{}: {}", path.display(), e))
        })
    }

    /// Resolve and load configuration, falling back to defaults
    ///
    /// A missing file only produces a warning. A file that exists but does
    /// not parse is an error.
    pub fn load(cli_arg: Option<&Path>) -> Result<Self> {
        let Some(path) = resolve_config_path(cli_arg) else {
            info!("No config file found, using built-in defaults");
            return Ok(Self::default());
        };

        match Self::load_from(&path) {
            Ok(config) => {
                info!("Loaded config from {}", path.display());
                Ok(config)
            }
            Err(Error::NotFound(what)) => {
                warn!("{} not found, using built-in defaults", what);
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }
}

/// Determine which config file to read, if any
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: Platform config directory, only if present
    default_config_path().filter(|path| path.exists())
}

/// Platform config file location (`~/.config/castq/config.toml` on Linux)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("castq").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PlayerConfig::default();
        assert_eq!(config.player.tick_interval(), Duration::from_millis(100));
        assert_eq!(config.player.speed_step(), Duration::from_millis(500));
        assert_eq!(config.player.event_capacity(), 100);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_document_keeps_defaults() {
        let config = PlayerConfig::from_toml_str("[player]\ntick_interval_ms = 250\n").unwrap();
        assert_eq!(config.player.tick_interval_ms, 250);
        assert_eq!(config.player.speed_step_ms, 500);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(PlayerConfig::from_toml_str("").unwrap(), PlayerConfig::default());
    }

    #[test]
    fn test_tick_interval_is_clamped() {
        let mut settings = PlayerSettings::default();
        settings.tick_interval_ms = 1;
        assert_eq!(settings.tick_interval(), Duration::from_millis(10));
        settings.tick_interval_ms = 60_000;
        assert_eq!(settings.tick_interval(), Duration::from_millis(5000));
    }

    #[test]
    fn test_zero_values_are_floored() {
        let settings = PlayerSettings {
            tick_interval_ms: 100,
            speed_step_ms: 0,
            event_capacity: 0,
        };
        assert_eq!(settings.speed_step(), Duration::from_millis(1));
        assert_eq!(settings.event_capacity(), 1);
    }

    #[test]
    fn test_malformed_document_is_rejected() {
        let err = PlayerConfig::from_toml_str("[player]\ntick_interval_ms = \"fast\"\n").unwrap_err();
        assert!(matches!(err, Error::Toml(_)));
    }
}
