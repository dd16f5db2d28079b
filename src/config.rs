//! Persistent settings
//!
//! Stored as TOML in a platform-specific directory and re-applied to the
//! engine as one snapshot.
//!
//! ## Config File Locations
//!
//! | Platform | Path |
//! |----------|------|
//! | Linux | `~/.config/pulsekey/config.toml` |
//! | macOS | `~/Library/Application Support/pulsekey/config.toml` |
//! | Windows | `%APPDATA%\pulsekey\config.toml` |
//!
//! ## Example
//!
//! ```no_run
//! use pulsekey::Config;
//!
//! let mut config = Config::load().unwrap_or_default();
//! config.clicker.rate = 250;
//! config.save().expect("Failed to save config");
//! ```

use crate::engine::scheduler::{Humanize, DEFAULT_RATE, MAX_JITTER};
use crate::engine::Mode;
pub use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const APP_DIR: &str = "pulsekey";

/// Directory holding the config file and the log, created on demand
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    let dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?.join(APP_DIR);
    if !dir.exists() {
        fs::create_dir_all(&dir)?;
    }
    Ok(dir)
}

/// Path to the config file
pub fn config_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Main application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub clicker: ClickerConfig,
    #[serde(default)]
    pub humanize: Humanize,
    #[serde(default)]
    pub measure: MeasureConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

/// Trigger and output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClickerConfig {
    /// Target emissions per second
    pub rate: u32,
    pub mode: Mode,
    /// Hotkey token, e.g. "F1" or "MOUSE_LEFT"
    pub hotkey: String,
    /// Output token
    pub output: String,
    /// Button used when an extended mouse button is unsupported
    pub mouse_fallback: String,
}

impl Default for ClickerConfig {
    fn default() -> Self {
        Self {
            rate: DEFAULT_RATE,
            mode: Mode::Toggle,
            hotkey: "F1".to_string(),
            output: "F".to_string(),
            mouse_fallback: "left".to_string(),
        }
    }
}

/// Rate test settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeasureConfig {
    pub duration_secs: u64,
    pub bin_width_ms: u64,
}

impl Default for MeasureConfig {
    fn default() -> Self {
        Self {
            duration_secs: 10,
            bin_width_ms: 100,
        }
    }
}

impl MeasureConfig {
    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_secs)
    }

    pub fn bin_width(&self) -> Duration {
        Duration::from_millis(self.bin_width_ms)
    }
}

/// UI configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Refresh rate for UI updates and measurement ticks (in Hz)
    pub refresh_rate_hz: u32,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self { refresh_rate_hz: 20 }
    }
}

impl Config {
    /// Load configuration from the default config file.
    ///
    /// Returns the default configuration if the file doesn't exist.
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config.sanitized())
    }

    /// Save configuration to the default config file.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = config_path()?;
        self.save_to(&path)
    }

    /// Save configuration to a specific path.
    ///
    /// Writes a sibling temp file and renames it over the target.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;
        let tmp = path.with_extension("toml.tmp");
        fs::write(&tmp, contents)?;
        if let Err(e) = fs::rename(&tmp, path) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }

    /// Clamp every field into range
    pub fn sanitized(mut self) -> Self {
        if self.clicker.rate == 0 {
            log::warn!("config rate 0 replaced with {}", DEFAULT_RATE);
            self.clicker.rate = DEFAULT_RATE;
        }
        if !(0.0..=MAX_JITTER).contains(&self.humanize.jitter) {
            log::warn!("config jitter {} clamped", self.humanize.jitter);
        }
        self.humanize = self.humanize.sanitized();
        self.measure.duration_secs = self.measure.duration_secs.max(1);
        self.measure.bin_width_ms = self.measure.bin_width_ms.max(1);
        self.ui.refresh_rate_hz = self.ui.refresh_rate_hz.clamp(1, 240);
        self
    }

    /// Get UI refresh interval as Duration
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_micros(1_000_000 / self.ui.refresh_rate_hz.max(1) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn temp_config_path(name: &str) -> PathBuf {
        env::temp_dir().join(format!("pulsekey-test-{}-{}.toml", name, std::process::id()))
    }

    #[test]
    fn config_default_values() {
        let config = Config::default();
        assert_eq!(config.clicker.rate, 100);
        assert_eq!(config.clicker.mode, Mode::Toggle);
        assert_eq!(config.clicker.hotkey, "F1");
        assert_eq!(config.clicker.output, "F");
        assert!(!config.humanize.enabled);
        assert_eq!(config.humanize.jitter, 0.12);
        assert!(config.humanize.micro_pause);
        assert_eq!(config.measure.duration_secs, 10);
        assert_eq!(config.measure.bin_width_ms, 100);
    }

    #[test]
    fn config_refresh_interval() {
        let config = Config::default();
        assert_eq!(config.refresh_interval(), Duration::from_millis(50));
    }

    #[test]
    fn config_save_and_load_roundtrip() {
        let path = temp_config_path("roundtrip");

        let mut config = Config::default();
        config.clicker.rate = 250;
        config.clicker.mode = Mode::Hold;
        config.clicker.output = "MOUSE_RIGHT".to_string();
        config.humanize.enabled = true;

        config.save_to(&path).expect("Failed to save config");
        let loaded = Config::load_from(&path).expect("Failed to load config");
        assert_eq!(loaded, config);
        assert!(!path.with_extension("toml.tmp").exists());

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn config_load_missing_file_is_error() {
        let path = PathBuf::from("/nonexistent/path/config.toml");
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn config_serializes_to_toml() {
        let toml_str = toml::to_string_pretty(&Config::default()).expect("Failed to serialize");
        assert!(toml_str.contains("[clicker]"));
        assert!(toml_str.contains("[humanize]"));
        assert!(toml_str.contains("[measure]"));
        assert!(toml_str.contains("mode = \"toggle\""));
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let toml_str = r#"
[clicker]
rate = 40
mode = "hold"
"#;
        let config: Config = toml::from_str(toml_str).expect("Failed to deserialize");
        assert_eq!(config.clicker.rate, 40);
        assert_eq!(config.clicker.mode, Mode::Hold);
        assert_eq!(config.clicker.hotkey, "F1");
        assert_eq!(config.measure, MeasureConfig::default());
    }

    #[test]
    fn sanitize_clamps_out_of_range() {
        let mut config = Config::default();
        config.clicker.rate = 0;
        config.humanize.jitter = 2.0;
        config.measure.duration_secs = 0;
        config.ui.refresh_rate_hz = 0;
        let config = config.sanitized();
        assert_eq!(config.clicker.rate, DEFAULT_RATE);
        assert_eq!(config.humanize.jitter, MAX_JITTER);
        assert_eq!(config.measure.duration_secs, 1);
        assert_eq!(config.ui.refresh_rate_hz, 1);
    }
}
