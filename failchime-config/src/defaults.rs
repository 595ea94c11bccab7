//! Default value functions for configuration.
//!
//! Used as `#[serde(default = "crate::defaults::...")]` attributes on
//! `Config` fields so that a partial YAML file still deserializes.

// ── Primitive helpers ──────────────────────────────────────────────────────

pub fn bool_true() -> bool {
    true
}

// ── Alert ──────────────────────────────────────────────────────────────────

pub fn volume() -> u8 {
    50
}

pub fn selected_sound() -> String {
    "alert".to_string()
}

/// Minimum interval between two accepted alerts.
pub fn debounce_ms() -> u64 {
    300
}

/// Hard ceiling on the lifetime of a player process.
pub fn max_playback_ms() -> u64 {
    20_000
}

// ── Download ───────────────────────────────────────────────────────────────

/// 5 MiB
pub fn max_download_bytes() -> u64 {
    5 * 1024 * 1024
}

pub fn max_redirects() -> u32 {
    5
}

// ── Logging ────────────────────────────────────────────────────────────────

pub fn log_level() -> crate::types::LogLevel {
    crate::types::LogLevel::Info
}
