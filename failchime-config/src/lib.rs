//! Configuration system for failchime.
//!
//! This crate provides configuration loading, saving, and default values
//! for the alert tool. It includes:
//!
//! - The [`Config`] struct and its YAML persistence
//! - Default value functions used by serde
//! - Platform-specific path helpers (config, sounds and downloads directories)
//! - Typed [`ConfigError`] values for I/O, parse and validation failures

pub mod config;
pub mod defaults;
pub mod error;
mod persistence;
mod types;

pub use config::Config;
pub use error::ConfigError;
pub use types::{DownloadLimits, LogLevel};
