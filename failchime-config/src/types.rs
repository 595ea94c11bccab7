//! Supporting configuration types.

use serde::{Deserialize, Serialize};

/// Log verbosity stored in the config file.
///
/// The `--log-level` CLI flag and `RUST_LOG` both take precedence over it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Convert to `log::LevelFilter` name, as understood by `str::parse`.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Bounds applied to every remote sound download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadLimits {
    /// Maximum number of bytes accepted from a response body
    #[serde(default = "crate::defaults::max_download_bytes")]
    pub max_bytes: u64,
    /// Maximum number of redirects followed before giving up
    #[serde(default = "crate::defaults::max_redirects")]
    pub max_redirects: u32,
}

impl Default for DownloadLimits {
    fn default() -> Self {
        Self {
            max_bytes: crate::defaults::max_download_bytes(),
            max_redirects: crate::defaults::max_redirects(),
        }
    }
}
