//! Configuration loaded from `~/.config/voxcalc/config.toml`.

use crate::calculator::DEFAULT_PRECISION;
use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub voice: VoiceConfig,

    #[serde(default)]
    pub display: DisplayConfig,
}

/// Speech capture and synthesis settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VoiceConfig {
    /// Upper bound on a single capture, in seconds.
    #[serde(default = "default_listen_timeout")]
    pub listen_timeout_secs: u64,

    /// Pause before capture starts, in milliseconds.
    #[serde(default = "default_calibration")]
    pub calibration_ms: u64,

    /// Program and arguments printing one transcript to stdout.
    /// Transcripts are read from the terminal when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcribe_command: Option<Vec<String>>,

    /// Program and arguments receiving the text to speak as a final argument.
    /// Spoken text is printed when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speech_command: Option<Vec<String>>,
}

/// Display settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DisplayConfig {
    /// Decimal places kept in numeric results.
    #[serde(default = "default_precision")]
    pub precision: u32,
}

fn default_listen_timeout() -> u64 {
    5
}
fn default_calibration() -> u64 {
    500
}
fn default_precision() -> u32 {
    DEFAULT_PRECISION
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            listen_timeout_secs: default_listen_timeout(),
            calibration_ms: default_calibration(),
            transcribe_command: None,
            speech_command: None,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            precision: default_precision(),
        }
    }
}

impl VoiceConfig {
    pub fn listen_timeout(&self) -> Duration {
        Duration::from_secs(self.listen_timeout_secs)
    }

    pub fn calibration(&self) -> Duration {
        Duration::from_millis(self.calibration_ms)
    }
}

impl Config {
    /// Default location, if the platform has a config directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("voxcalc").join("config.toml"))
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(text: &str) -> anyhow::Result<Self> {
        toml::from_str(text).context("Invalid configuration")
    }

    /// Load from `path`, or from the default location when `None`.
    ///
    /// A missing file yields the defaults; a malformed one is an error.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path.map(Path::to_path_buf).or_else(Self::default_path) else {
            return Ok(Self::default());
        };
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("Failed to load {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.voice.listen_timeout(), Duration::from_secs(5));
        assert_eq!(config.voice.calibration(), Duration::from_millis(500));
        assert_eq!(config.display.precision, 8);
    }

    #[test]
    fn test_partial_config() {
        let config = Config::from_toml(
            r#"
            [voice]
            speech_command = ["espeak", "-s", "150"]

            [display]
            precision = 4
            "#,
        )
        .unwrap();
        assert_eq!(
            config.voice.speech_command,
            Some(vec!["espeak".to_string(), "-s".to_string(), "150".to_string()])
        );
        assert_eq!(config.voice.listen_timeout_secs, 5);
        assert_eq!(config.voice.transcribe_command, None);
        assert_eq!(config.display.precision, 4);
    }

    #[test]
    fn test_malformed_config_is_an_error() {
        assert!(Config::from_toml("[display]\nprecision = \"many\"").is_err());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let path = std::env::temp_dir().join("voxcalc-test-does-not-exist.toml");
        assert_eq!(Config::load(Some(&path)).unwrap(), Config::default());
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("voxcalc-test-{}.toml", std::process::id()));
        std::fs::write(&path, "[voice]\nlisten_timeout_secs = 2\n").unwrap();
        let config = Config::load(Some(&path)).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(config.voice.listen_timeout(), Duration::from_secs(2));
    }
}
