//! Best-effort alert playback through external audio players.
//!
//! Provides:
//! - `platform`: platform families and their ordered candidate players
//! - `launcher`: process launching with a hard kill timeout
//! - `engine`: the fallback chain and fire-and-forget playback

pub mod engine;
pub mod launcher;
pub mod platform;

pub use engine::{DEFAULT_MAX_PLAYBACK, PlaybackEngine, PlaybackError, PlaybackRequest};
pub use launcher::{ChildHandle, LaunchError, LaunchOutcome, ProcessLauncher, TokioLauncher};
pub use platform::{PlatformFamily, PlayerCandidate, VolumeControl, candidates_for};
