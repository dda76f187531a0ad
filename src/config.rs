// SPDX-License-Identifier: GPL-3.0-only

//! User configuration
//!
//! Loaded from a TOML file; every field has a default so a missing file or
//! an empty table works out of the box. The default location is
//! `<config dir>/qrscan/config.toml`.

use crate::constants::{colors, decode, timing};
use crate::decoder::DecodeSettings;
use crate::errors::{AppError, AppResult};
use crate::session::SessionConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub scanner: ScannerConfig,
    #[serde(default)]
    pub overlay: OverlayConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CameraConfig {
    /// Device index (0 for /dev/video0)
    #[serde(default)]
    pub device_index: usize,
    /// Requested capture width; the driver may adjust it
    #[serde(default = "default_width")]
    pub width: u32,
    /// Requested capture height
    #[serde(default = "default_height")]
    pub height: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device_index: 0,
            width: default_width(),
            height: default_height(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScannerConfig {
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    #[serde(default = "default_session_timeout_ms")]
    pub session_timeout_ms: u64,
    #[serde(default = "default_startup_delay_ms")]
    pub startup_delay_ms: u64,
    /// Frames larger than this are downscaled before detection
    #[serde(default = "default_max_dimension")]
    pub max_dimension: u32,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            session_timeout_ms: default_session_timeout_ms(),
            startup_delay_ms: default_startup_delay_ms(),
            max_dimension: default_max_dimension(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OverlayConfig {
    /// Palette name for the detection box
    /// ("purple", "dark-green", "error-red", "teal-green")
    #[serde(default = "default_box_color")]
    pub box_color: String,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            box_color: default_box_color(),
        }
    }
}

impl OverlayConfig {
    /// Resolve the configured palette name; unknown names fall back to purple
    pub fn color_rgba(&self) -> [u8; 4] {
        match self.box_color.as_str() {
            "dark-green" => colors::DARK_GREEN,
            "purple" => colors::PURPLE,
            "error-red" => colors::ERROR_RED,
            "teal-green" => colors::TEAL_GREEN,
            _ => colors::DETECTION_BOX,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("read {}: {}", path.display(), e)))?;
        toml::from_str(&content)
            .map_err(|e| AppError::Config(format!("parse {}: {}", path.display(), e)))
    }

    /// Load from an explicit path, or the default path, or fall back to defaults
    ///
    /// An explicit path that fails to load is an error; a missing default
    /// file is not.
    pub fn load_or_default(path: Option<&Path>) -> AppResult<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }

        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => {
                debug!("No configuration file, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Default configuration file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("qrscan").join("config.toml"))
    }

    /// Timing and overlay knobs for the scan session
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            tick_interval: Duration::from_millis(self.scanner.tick_interval_ms),
            session_timeout: Duration::from_millis(self.scanner.session_timeout_ms),
            startup_delay: Duration::from_millis(self.scanner.startup_delay_ms),
            box_color: self.overlay.color_rgba(),
        }
    }

    /// Settings for the decode engine
    pub fn decode_settings(&self) -> DecodeSettings {
        DecodeSettings {
            max_dimension: self.scanner.max_dimension,
        }
    }
}

fn default_width() -> u32 {
    640
}
fn default_height() -> u32 {
    480
}
fn default_tick_interval_ms() -> u64 {
    timing::TICK_INTERVAL.as_millis() as u64
}
fn default_session_timeout_ms() -> u64 {
    timing::SESSION_TIMEOUT.as_millis() as u64
}
fn default_startup_delay_ms() -> u64 {
    timing::STARTUP_DELAY.as_millis() as u64
}
fn default_max_dimension() -> u32 {
    decode::MAX_DIMENSION
}
fn default_box_color() -> String {
    "purple".to_string()
}
fn default_log_level() -> String {
    "warn".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.camera.device_index, 0);
        assert_eq!(config.scanner.session_timeout_ms, 20_000);
        assert_eq!(config.overlay.box_color, "purple");
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_partial_toml_overrides() {
        let config: Config = toml::from_str(
            r#"
            [scanner]
            session_timeout_ms = 5000

            [overlay]
            box_color = "teal-green"
            "#,
        )
        .unwrap();

        assert_eq!(config.scanner.session_timeout_ms, 5000);
        assert_eq!(config.overlay.color_rgba(), colors::TEAL_GREEN);
        // Untouched sections keep their defaults
        assert_eq!(config.scanner.tick_interval_ms, 33);
    }

    #[test]
    fn test_unknown_color_falls_back() {
        let overlay = OverlayConfig {
            box_color: "mauve".to_string(),
        };
        assert_eq!(overlay.color_rgba(), colors::PURPLE);
    }

    #[test]
    fn test_session_config_conversion() {
        let config = Config::default();
        let session = config.session_config();
        assert_eq!(session.session_timeout, Duration::from_secs(20));
        assert_eq!(session.tick_interval, Duration::from_millis(33));
    }
}
