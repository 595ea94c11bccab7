//! failchime: play a sound when a shell command fails.
//!
//! The playback and download cores live in `failchime-playback` and
//! `failchime-fetch`; this crate holds the dispatch layer, the sound catalog,
//! the alert sources and the CLI around them.

pub mod alert_source;
pub mod app;
pub mod cli;
pub mod debug;
pub mod dispatch;
pub mod sound_library;

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
