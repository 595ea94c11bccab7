//! Alert dispatch: debounce, resolve the selected sound, hand it to a player.
//!
//! Collaborators sit behind small traits so the dispatcher can be driven by a
//! manual clock and a recording player in tests.

use crate::sound_library::SoundLibrary;
use failchime_config::Config;
use failchime_playback::{PlaybackEngine, PlaybackRequest, ProcessLauncher};
use parking_lot::{Mutex, RwLock};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Minimum gap between two accepted alerts.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Source of the current instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// The settings an alert needs.
pub trait AlertSettings: Send + Sync {
    fn is_enabled(&self) -> bool;
    fn volume(&self) -> u8;
    fn selected_sound(&self) -> Option<String>;
}

/// Maps a sound identifier to an existing file.
pub trait SoundResolver: Send + Sync {
    fn resolve_path(&self, identifier: &str) -> Option<PathBuf>;
}

/// Starts playback without waiting for it.
pub trait Player: Send + Sync {
    fn play(&self, request: PlaybackRequest);
}

impl AlertSettings for RwLock<Config> {
    fn is_enabled(&self) -> bool {
        self.read().is_enabled()
    }

    fn volume(&self) -> u8 {
        self.read().volume()
    }

    fn selected_sound(&self) -> Option<String> {
        self.read().selected_sound().map(str::to_string)
    }
}

impl<T: AlertSettings + ?Sized> AlertSettings for Arc<T> {
    fn is_enabled(&self) -> bool {
        (**self).is_enabled()
    }

    fn volume(&self) -> u8 {
        (**self).volume()
    }

    fn selected_sound(&self) -> Option<String> {
        (**self).selected_sound()
    }
}

impl SoundResolver for SoundLibrary {
    fn resolve_path(&self, identifier: &str) -> Option<PathBuf> {
        self.resolve_identifier(identifier)
    }
}

impl<T: SoundResolver + ?Sized> SoundResolver for Arc<T> {
    fn resolve_path(&self, identifier: &str) -> Option<PathBuf> {
        (**self).resolve_path(identifier)
    }
}

impl<L: ProcessLauncher> Player for PlaybackEngine<L> {
    fn play(&self, request: PlaybackRequest) {
        PlaybackEngine::play(self, request);
    }
}

/// Accepts at most one event per interval. The first event in a window wins.
#[derive(Debug)]
pub struct Debouncer {
    interval: Duration,
    last_fire: Option<Instant>,
}

impl Debouncer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_fire: None,
        }
    }

    /// Record an event at `now`; `false` means it falls inside the window
    /// opened by the last accepted event and must be dropped.
    pub fn try_acquire(&mut self, now: Instant) -> bool {
        if let Some(last) = self.last_fire
            && now.saturating_duration_since(last) < self.interval
        {
            return false;
        }
        self.last_fire = Some(now);
        true
    }
}

/// What happened to an alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlertOutcome {
    Disabled,
    Debounced,
    /// Accepted, but no playable sound could be found
    Unresolved,
    Dispatched(PathBuf),
}

pub struct Dispatcher<S, R, P> {
    settings: S,
    resolver: R,
    player: P,
    clock: Arc<dyn Clock>,
    debouncer: Mutex<Debouncer>,
}

impl<S: AlertSettings, R: SoundResolver, P: Player> Dispatcher<S, R, P> {
    pub fn new(settings: S, resolver: R, player: P, interval: Duration) -> Self {
        Self {
            settings,
            resolver,
            player,
            clock: Arc::new(SystemClock),
            debouncer: Mutex::new(Debouncer::new(interval)),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Handle one alert event. Never blocks on playback.
    pub fn on_alert(&self) -> AlertOutcome {
        if !self.settings.is_enabled() {
            log::debug!("Alerts disabled, ignoring event");
            return AlertOutcome::Disabled;
        }

        let now = self.clock.now();
        if !self.debouncer.lock().try_acquire(now) {
            log::debug!("Alert debounced");
            return AlertOutcome::Debounced;
        }

        let Some(identifier) = self.settings.selected_sound() else {
            log::warn!("No alert sound selected");
            return AlertOutcome::Unresolved;
        };
        let Some(path) = self.resolver.resolve_path(&identifier) else {
            log::warn!("Could not resolve alert sound '{}'", identifier);
            return AlertOutcome::Unresolved;
        };

        log::info!("Alert: playing {}", path.display());
        self.player
            .play(PlaybackRequest::new(path.clone(), self.settings.volume()));
        AlertOutcome::Dispatched(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct ManualClock(Mutex<Instant>);

    impl ManualClock {
        fn new() -> Arc<Self> {
            Arc::new(Self(Mutex::new(Instant::now())))
        }

        fn advance(&self, by: Duration) {
            *self.0.lock() += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Instant {
            *self.0.lock()
        }
    }

    struct FixedSettings {
        enabled: bool,
        volume: u8,
        sound: Option<&'static str>,
    }

    impl AlertSettings for FixedSettings {
        fn is_enabled(&self) -> bool {
            self.enabled
        }

        fn volume(&self) -> u8 {
            self.volume
        }

        fn selected_sound(&self) -> Option<String> {
            self.sound.map(str::to_string)
        }
    }

    struct MapResolver(HashMap<&'static str, PathBuf>);

    impl SoundResolver for MapResolver {
        fn resolve_path(&self, identifier: &str) -> Option<PathBuf> {
            self.0.get(identifier).cloned()
        }
    }

    #[derive(Default)]
    struct RecordingPlayer(Mutex<Vec<PlaybackRequest>>);

    impl Player for Arc<RecordingPlayer> {
        fn play(&self, request: PlaybackRequest) {
            self.0.lock().push(request);
        }
    }

    fn dispatcher(
        settings: FixedSettings,
    ) -> (
        Dispatcher<FixedSettings, MapResolver, Arc<RecordingPlayer>>,
        Arc<ManualClock>,
        Arc<RecordingPlayer>,
    ) {
        let clock = ManualClock::new();
        let player = Arc::new(RecordingPlayer::default());
        let resolver = MapResolver(HashMap::from([("alert", PathBuf::from("/sounds/alert.wav"))]));
        let dispatcher = Dispatcher::new(settings, resolver, Arc::clone(&player), DEFAULT_DEBOUNCE)
            .with_clock(clock.clone());
        (dispatcher, clock, player)
    }

    fn enabled() -> FixedSettings {
        FixedSettings {
            enabled: true,
            volume: 70,
            sound: Some("alert"),
        }
    }

    #[test]
    fn test_debouncer_window() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(DEFAULT_DEBOUNCE);

        assert!(debouncer.try_acquire(start));
        assert!(!debouncer.try_acquire(start + Duration::from_millis(299)));
        assert!(debouncer.try_acquire(start + Duration::from_millis(300)));
    }

    #[test]
    fn test_dropped_event_does_not_extend_window() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(DEFAULT_DEBOUNCE);

        assert!(debouncer.try_acquire(start));
        assert!(!debouncer.try_acquire(start + Duration::from_millis(200)));
        assert!(debouncer.try_acquire(start + Duration::from_millis(350)));
    }

    #[test]
    fn test_alerts_within_interval_play_once() {
        let (dispatcher, clock, player) = dispatcher(enabled());

        assert!(matches!(dispatcher.on_alert(), AlertOutcome::Dispatched(_)));
        clock.advance(Duration::from_millis(200));
        assert_eq!(dispatcher.on_alert(), AlertOutcome::Debounced);

        assert_eq!(player.0.lock().len(), 1);
    }

    #[test]
    fn test_alerts_past_interval_play_twice() {
        let (dispatcher, clock, player) = dispatcher(enabled());

        dispatcher.on_alert();
        clock.advance(Duration::from_millis(350));
        dispatcher.on_alert();

        let played = player.0.lock();
        assert_eq!(played.len(), 2);
        assert_eq!(played[1].file_path, PathBuf::from("/sounds/alert.wav"));
        assert_eq!(played[1].volume, 70);
    }

    #[test]
    fn test_disabled_has_no_side_effects() {
        let (dispatcher, clock, player) = dispatcher(FixedSettings {
            enabled: false,
            ..enabled()
        });

        assert_eq!(dispatcher.on_alert(), AlertOutcome::Disabled);
        assert!(player.0.lock().is_empty());

        // The window was never opened, so nothing is debounced later.
        clock.advance(Duration::from_millis(10));
        assert!(dispatcher.debouncer.lock().try_acquire(clock.now()));
    }

    #[test]
    fn test_unresolved_sound_still_consumes_window() {
        let (dispatcher, clock, player) = dispatcher(FixedSettings {
            sound: Some("missing"),
            ..enabled()
        });

        assert_eq!(dispatcher.on_alert(), AlertOutcome::Unresolved);
        clock.advance(Duration::from_millis(100));
        assert_eq!(dispatcher.on_alert(), AlertOutcome::Debounced);
        assert!(player.0.lock().is_empty());
    }

    #[test]
    fn test_no_selection_is_unresolved() {
        let (dispatcher, _clock, player) = dispatcher(FixedSettings {
            sound: None,
            ..enabled()
        });

        assert_eq!(dispatcher.on_alert(), AlertOutcome::Unresolved);
        assert!(player.0.lock().is_empty());
    }

    #[test]
    fn test_zero_volume_still_dispatches() {
        let (dispatcher, _clock, player) = dispatcher(FixedSettings {
            volume: 0,
            ..enabled()
        });

        assert!(matches!(dispatcher.on_alert(), AlertOutcome::Dispatched(_)));
        assert_eq!(player.0.lock()[0].volume, 0);
    }

    #[test]
    fn test_config_backed_settings() {
        let mut config = Config::default();
        config.set_volume(35);
        config.set_selected_sound("  ");
        let settings = Arc::new(RwLock::new(config));

        assert!(settings.is_enabled());
        assert_eq!(settings.volume(), 35);
        assert_eq!(settings.selected_sound(), None);

        settings.write().set_enabled(false);
        assert!(!settings.is_enabled());
    }
}
