//! The `Config` struct and its in-memory accessors.
//!
//! Persistence (load/save and path helpers) lives in `persistence.rs`.

use crate::error::ConfigError;
use crate::types::{DownloadLimits, LogLevel};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Accept any integer volume and clamp it into 0-100.
pub(crate) fn deserialize_volume<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = i64::deserialize(deserializer)?;
    let clamped = raw.clamp(0, 100);
    if clamped != raw {
        log::warn!("Config volume {} is outside 0-100, clamping to {}", raw, clamped);
    }
    Ok(clamped as u8)
}

/// User settings for failchime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Whether failed commands play an alert at all
    #[serde(default = "crate::defaults::bool_true")]
    pub enabled: bool,

    /// Volume 0-100 passed to the player
    #[serde(
        default = "crate::defaults::volume",
        deserialize_with = "deserialize_volume"
    )]
    pub volume: u8,

    /// Selected sound: a built-in identifier or an absolute path to a custom file
    #[serde(default = "crate::defaults::selected_sound")]
    pub selected_sound: String,

    /// Alerts arriving closer together than this are dropped
    #[serde(default = "crate::defaults::debounce_ms")]
    pub debounce_ms: u64,

    /// Player processes still running after this long are killed
    #[serde(default = "crate::defaults::max_playback_ms")]
    pub max_playback_ms: u64,

    #[serde(default)]
    pub download: DownloadLimits,

    #[serde(default = "crate::defaults::log_level")]
    pub log_level: LogLevel,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enabled: crate::defaults::bool_true(),
            volume: crate::defaults::volume(),
            selected_sound: crate::defaults::selected_sound(),
            debounce_ms: crate::defaults::debounce_ms(),
            max_playback_ms: crate::defaults::max_playback_ms(),
            download: DownloadLimits::default(),
            log_level: crate::defaults::log_level(),
        }
    }
}

impl Config {
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Volume in the 0-100 range.
    pub fn volume(&self) -> u8 {
        self.volume.min(100)
    }

    /// Set the volume, clamping anything above 100.
    pub fn set_volume(&mut self, volume: u8) {
        self.volume = volume.min(100);
    }

    /// The selected sound identifier, or `None` when nothing is selected.
    pub fn selected_sound(&self) -> Option<&str> {
        let trimmed = self.selected_sound.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    }

    pub fn set_selected_sound(&mut self, identifier: impl Into<String>) {
        self.selected_sound = identifier.into();
    }

    pub fn debounce_interval(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn max_playback_duration(&self) -> Duration {
        Duration::from_millis(self.max_playback_ms)
    }

    /// Check field values and repair the ones that can be repaired.
    ///
    /// An out-of-range volume is clamped with a warning; zero durations and a
    /// zero download cap are rejected because they would silently disable
    /// every alert or download.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        if self.volume > 100 {
            log::warn!("Config volume {} is above 100, clamping", self.volume);
            self.volume = 100;
        }
        if self.debounce_ms == 0 {
            return Err(ConfigError::Validation(
                "debounce_ms must be greater than zero".to_string(),
            ));
        }
        if self.max_playback_ms == 0 {
            return Err(ConfigError::Validation(
                "max_playback_ms must be greater than zero".to_string(),
            ));
        }
        if self.download.max_bytes == 0 {
            return Err(ConfigError::Validation(
                "download.max_bytes must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
