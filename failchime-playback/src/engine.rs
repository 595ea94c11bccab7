//! The playback engine: runs the candidate chain for a play request.

use crate::launcher::{ProcessLauncher, TokioLauncher};
use crate::platform::{PlatformFamily, candidates_for};
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Hard ceiling on a single player process.
pub const DEFAULT_MAX_PLAYBACK: Duration = Duration::from_millis(20_000);

/// A single sound to play.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackRequest {
    /// Must reference an existing, readable file
    pub file_path: PathBuf,
    /// Volume 0-100
    pub volume: u8,
}

impl PlaybackRequest {
    pub fn new(file_path: impl Into<PathBuf>, volume: u8) -> Self {
        Self {
            file_path: file_path.into(),
            volume: volume.min(100),
        }
    }
}

/// Reasons a play request produced no sound.
#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    #[error("no audio player is known for this platform")]
    UnsupportedPlatform,
    #[error("sound file not found: {}", .0.display())]
    MissingFile(PathBuf),
    #[error("no player could play {}; tried: {}", .path.display(), .tried.join(", "))]
    PlaybackUnavailable {
        path: PathBuf,
        tried: Vec<&'static str>,
    },
}

/// Plays sounds through external player processes.
///
/// Cloning is cheap; clones share the launcher and the in-flight task list.
pub struct PlaybackEngine<L: ProcessLauncher = TokioLauncher> {
    launcher: Arc<L>,
    family: PlatformFamily,
    max_duration: Duration,
    in_flight: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl<L: ProcessLauncher> Clone for PlaybackEngine<L> {
    fn clone(&self) -> Self {
        Self {
            launcher: Arc::clone(&self.launcher),
            family: self.family,
            max_duration: self.max_duration,
            in_flight: Arc::clone(&self.in_flight),
        }
    }
}

impl Default for PlaybackEngine<TokioLauncher> {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackEngine<TokioLauncher> {
    /// Engine for the running platform using real processes.
    pub fn new() -> Self {
        Self::with_launcher(TokioLauncher, PlatformFamily::current())
    }
}

impl<L: ProcessLauncher> PlaybackEngine<L> {
    pub fn with_launcher(launcher: L, family: PlatformFamily) -> Self {
        Self {
            launcher: Arc::new(launcher),
            family,
            max_duration: DEFAULT_MAX_PLAYBACK,
            in_flight: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Override the per-process ceiling.
    pub fn with_max_duration(mut self, max_duration: Duration) -> Self {
        self.max_duration = max_duration;
        self
    }

    pub fn family(&self) -> PlatformFamily {
        self.family
    }

    pub fn max_duration(&self) -> Duration {
        self.max_duration
    }

    /// Play `request` and wait for the outcome.
    ///
    /// Candidates are tried in order until one exits cleanly (or is killed
    /// at the ceiling, which still means it played). Returns the executable
    /// that played the sound.
    pub async fn play_and_wait(
        &self,
        request: &PlaybackRequest,
    ) -> Result<&'static str, PlaybackError> {
        if !request.file_path.is_file() {
            return Err(PlaybackError::MissingFile(request.file_path.clone()));
        }

        let candidates = candidates_for(self.family, &request.file_path);
        if candidates.is_empty() {
            return Err(PlaybackError::UnsupportedPlatform);
        }

        let mut tried = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let args = candidate.args(&request.file_path, request.volume);
            match self
                .launcher
                .launch(candidate.executable, &args, self.max_duration)
                .await
            {
                Ok(outcome) if outcome.is_success() => {
                    log::info!(
                        "Played {} via {} ({:?})",
                        request.file_path.display(),
                        candidate.executable,
                        outcome
                    );
                    return Ok(candidate.executable);
                }
                Ok(outcome) => {
                    log::debug!("{} failed: {:?}", candidate.executable, outcome);
                }
                Err(e) => {
                    log::debug!("{} unavailable: {}", candidate.executable, e);
                }
            }
            tried.push(candidate.executable);
        }

        Err(PlaybackError::PlaybackUnavailable {
            path: request.file_path.clone(),
            tried,
        })
    }

    /// Fire-and-forget playback on the current tokio runtime.
    ///
    /// Failures are logged and never returned. Use [`Self::wait_idle`] before
    /// shutting the runtime down so a running player is not cut off.
    pub fn play(&self, request: PlaybackRequest) {
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                log::error!("Cannot play alert outside a tokio runtime: {}", e);
                return;
            }
        };

        let engine = self.clone();
        let task = handle.spawn(async move {
            if let Err(e) = engine.play_and_wait(&request).await {
                log::warn!("Alert playback failed: {}", e);
            }
        });

        let mut in_flight = self.in_flight.lock();
        in_flight.retain(|task| !task.is_finished());
        in_flight.push(task);
    }

    /// Wait until every fire-and-forget playback started so far has finished.
    pub async fn wait_idle(&self) {
        let tasks = std::mem::take(&mut *self.in_flight.lock());
        for task in tasks {
            if let Err(e) = task.await {
                log::error!("Playback task failed: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::launcher::{LaunchError, LaunchOutcome};
    use std::collections::HashMap;
    use tempfile::NamedTempFile;

    #[derive(Clone, Copy)]
    enum Behavior {
        Missing,
        Exit(i32),
        Hang,
    }

    /// Launcher that answers from a script and records every call.
    #[derive(Default)]
    struct ScriptedLauncher {
        behaviors: HashMap<&'static str, Behavior>,
        calls: Arc<Mutex<Vec<(String, Vec<String>)>>>,
    }

    impl ScriptedLauncher {
        fn new(behaviors: &[(&'static str, Behavior)]) -> Self {
            Self {
                behaviors: behaviors.iter().copied().collect(),
                calls: Arc::default(),
            }
        }
    }

    impl ProcessLauncher for ScriptedLauncher {
        async fn launch(
            &self,
            program: &str,
            args: &[String],
            _max_duration: Duration,
        ) -> Result<LaunchOutcome, LaunchError> {
            self.calls.lock().push((program.to_string(), args.to_vec()));
            match self.behaviors.get(program) {
                Some(Behavior::Exit(code)) => Ok(LaunchOutcome::Exited(Some(*code))),
                Some(Behavior::Hang) => Ok(LaunchOutcome::TimedOut),
                Some(Behavior::Missing) | None => Err(LaunchError::NotFound(program.to_string())),
            }
        }
    }

    fn sound_file(suffix: &str) -> NamedTempFile {
        tempfile::Builder::new().suffix(suffix).tempfile().unwrap()
    }

    fn engine(
        family: PlatformFamily,
        behaviors: &[(&'static str, Behavior)],
    ) -> (PlaybackEngine<ScriptedLauncher>, Arc<Mutex<Vec<(String, Vec<String>)>>>) {
        let launcher = ScriptedLauncher::new(behaviors);
        let calls = Arc::clone(&launcher.calls);
        (PlaybackEngine::with_launcher(launcher, family), calls)
    }

    fn programs(calls: &Mutex<Vec<(String, Vec<String>)>>) -> Vec<String> {
        calls.lock().iter().map(|(p, _)| p.clone()).collect()
    }

    #[tokio::test]
    async fn test_fallback_stops_at_first_working_candidate() {
        let file = sound_file(".wav");
        let (engine, calls) = engine(
            PlatformFamily::FreeDesktop,
            &[
                ("paplay", Behavior::Missing),
                ("aplay", Behavior::Exit(0)),
                ("ffplay", Behavior::Exit(0)),
            ],
        );

        let used = engine
            .play_and_wait(&PlaybackRequest::new(file.path(), 50))
            .await
            .unwrap();

        assert_eq!(used, "aplay");
        assert_eq!(programs(&calls), vec!["paplay", "aplay"]);
    }

    #[tokio::test]
    async fn test_fallback_on_non_zero_exit() {
        let file = sound_file(".mp3");
        let (engine, calls) = engine(
            PlatformFamily::FreeDesktop,
            &[
                ("paplay", Behavior::Exit(1)),
                ("aplay", Behavior::Exit(1)),
                ("ffplay", Behavior::Exit(0)),
            ],
        );

        let used = engine
            .play_and_wait(&PlaybackRequest::new(file.path(), 40))
            .await
            .unwrap();

        assert_eq!(used, "ffplay");
        let calls = calls.lock();
        assert_eq!(calls.len(), 3);
        assert!(calls[2].1.contains(&"40".to_string()));
    }

    #[tokio::test]
    async fn test_first_candidate_success_passes_volume() {
        let file = sound_file(".wav");
        let (engine, calls) = engine(PlatformFamily::FreeDesktop, &[("paplay", Behavior::Exit(0))]);

        engine
            .play_and_wait(&PlaybackRequest::new(file.path(), 50))
            .await
            .unwrap();

        let calls = calls.lock();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1[0], "--volume=32768");
    }

    #[tokio::test]
    async fn test_all_candidates_fail() {
        let file = sound_file(".wav");
        let (engine, calls) = engine(PlatformFamily::FreeDesktop, &[]);

        let err = engine
            .play_and_wait(&PlaybackRequest::new(file.path(), 50))
            .await
            .unwrap_err();

        match err {
            PlaybackError::PlaybackUnavailable { tried, .. } => {
                assert_eq!(tried, vec!["paplay", "aplay", "ffplay"]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(calls.lock().len(), 3);
    }

    #[tokio::test]
    async fn test_timed_out_player_counts_as_played() {
        let file = sound_file(".wav");
        let (engine, calls) = engine(PlatformFamily::FreeDesktop, &[("paplay", Behavior::Hang)]);

        let used = engine
            .play_and_wait(&PlaybackRequest::new(file.path(), 50))
            .await
            .unwrap();

        assert_eq!(used, "paplay");
        assert_eq!(calls.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_macos_missing_player_has_no_fallback() {
        let file = sound_file(".aiff");
        let (engine, calls) = engine(PlatformFamily::MacOs, &[]);

        let result = engine
            .play_and_wait(&PlaybackRequest::new(file.path(), 100))
            .await;

        assert!(matches!(
            result,
            Err(PlaybackError::PlaybackUnavailable { .. })
        ));
        let calls = calls.lock();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "afplay");
        assert_eq!(calls[0].1[1], "2.00");
    }

    #[tokio::test]
    async fn test_windows_uses_media_player_for_mp3() {
        let file = sound_file(".mp3");
        let (engine, calls) =
            engine(PlatformFamily::Windows, &[("powershell", Behavior::Exit(0))]);

        assert_eq!(
            engine
                .play_and_wait(&PlaybackRequest::new(file.path(), 50))
                .await
                .unwrap(),
            "powershell"
        );
        let calls = calls.lock();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].1.last().unwrap().contains("MediaPlayer"));
    }

    #[tokio::test]
    async fn test_unsupported_platform_spawns_nothing() {
        let file = sound_file(".wav");
        let (engine, calls) = engine(PlatformFamily::Unsupported, &[]);

        let result = engine
            .play_and_wait(&PlaybackRequest::new(file.path(), 50))
            .await;

        assert!(matches!(result, Err(PlaybackError::UnsupportedPlatform)));
        assert!(calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_missing_file_spawns_nothing() {
        let (engine, calls) = engine(PlatformFamily::FreeDesktop, &[("paplay", Behavior::Exit(0))]);

        let result = engine
            .play_and_wait(&PlaybackRequest::new("/definitely/not/here.wav", 50))
            .await;

        assert!(matches!(result, Err(PlaybackError::MissingFile(_))));
        assert!(calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_play_is_fire_and_forget() {
        let file = sound_file(".wav");
        let (engine, calls) = engine(PlatformFamily::FreeDesktop, &[("paplay", Behavior::Exit(0))]);

        engine.play(PlaybackRequest::new(file.path(), 50));
        engine.wait_idle().await;

        assert_eq!(programs(&calls), vec!["paplay"]);
    }

    #[test]
    fn test_play_without_runtime_is_noop() {
        let (engine, calls) = engine(PlatformFamily::FreeDesktop, &[("paplay", Behavior::Exit(0))]);
        engine.play(PlaybackRequest::new("/tmp/a.wav", 50));
        assert!(calls.lock().is_empty());
    }

    #[test]
    fn test_request_clamps_volume() {
        assert_eq!(PlaybackRequest::new("/a.wav", 150).volume, 100);
    }
}
