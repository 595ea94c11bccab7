//! Wiring between the CLI and the core crates.

use crate::alert_source::{self, ExitState};
use crate::cli::{Cli, Commands, ConfigAction, config_level_filter};
use crate::dispatch::{AlertOutcome, Dispatcher};
use crate::sound_library::SoundLibrary;
use anyhow::{Context, Result, bail};
use failchime_config::Config;
use failchime_fetch::{FetchLimits, Fetcher};
use failchime_playback::{PlaybackEngine, PlaybackRequest};
use parking_lot::RwLock;
use std::path::PathBuf;
use std::sync::Arc;

pub struct App {
    config: Arc<RwLock<Config>>,
    config_path: PathBuf,
    library: Arc<SoundLibrary>,
    engine: PlaybackEngine,
    downloads_dir: PathBuf,
}

impl App {
    /// Load the config from its default location.
    ///
    /// With `strict` unset a broken config file is logged and replaced by
    /// the defaults, so a monitored command still runs.
    pub fn load(strict: bool) -> Result<Self> {
        Self::open(
            Config::config_path(),
            Config::sounds_dir(),
            Config::downloads_dir(),
            strict,
        )
    }

    /// Load the config at `config_path` and build an app around it.
    pub fn open(
        config_path: PathBuf,
        sounds_dir: PathBuf,
        downloads_dir: PathBuf,
        strict: bool,
    ) -> Result<Self> {
        let config = match Config::load_from(&config_path) {
            Ok(config) => config,
            Err(e) if !strict => {
                log::warn!(
                    "Ignoring unreadable config {}: {}; using defaults",
                    config_path.display(),
                    e
                );
                Config::default()
            }
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to load config from {}", config_path.display())
                });
            }
        };
        Ok(Self::with_paths(config, config_path, sounds_dir, downloads_dir))
    }

    /// Build an app around an already-loaded config and explicit paths.
    pub fn with_paths(
        config: Config,
        config_path: PathBuf,
        sounds_dir: PathBuf,
        downloads_dir: PathBuf,
    ) -> Self {
        let engine = PlaybackEngine::new().with_max_duration(config.max_playback_duration());
        log::debug!(
            "Playback on {} with a {} ms ceiling",
            engine.family().display_name(),
            engine.max_duration().as_millis()
        );
        Self {
            config: Arc::new(RwLock::new(config)),
            config_path,
            library: Arc::new(SoundLibrary::new(sounds_dir)),
            engine,
            downloads_dir,
        }
    }

    pub fn config(&self) -> Arc<RwLock<Config>> {
        Arc::clone(&self.config)
    }

    fn dispatcher(&self) -> Dispatcher<Arc<RwLock<Config>>, Arc<SoundLibrary>, PlaybackEngine> {
        let interval = self.config.read().debounce_interval();
        Dispatcher::new(
            Arc::clone(&self.config),
            Arc::clone(&self.library),
            self.engine.clone(),
            interval,
        )
    }

    /// Execute a subcommand and return the process exit code.
    pub async fn execute(&self, command: Commands) -> Result<i32> {
        match command {
            Commands::Run { command } => self.run(command).await,
            Commands::Listen => self.listen().await,
            Commands::Play { sound } => self.play(sound).await,
            Commands::Download { url, select } => self.download(url, select).await,
            Commands::Sounds => {
                self.print_sounds();
                Ok(0)
            }
            Commands::Config { action } => self.configure(action),
        }
    }

    async fn run(&self, command: Vec<String>) -> Result<i32> {
        let Some((program, args)) = command.split_first() else {
            bail!("No command given");
        };
        let outcome = alert_source::run_command(program, args).await?;
        if outcome.state.should_alert() {
            self.dispatcher().on_alert();
            self.engine.wait_idle().await;
        }
        Ok(outcome.exit_code)
    }

    async fn listen(&self) -> Result<i32> {
        let dispatcher = self.dispatcher();
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        let lines = alert_source::listen(stdin, |state: ExitState| {
            if state.should_alert()
                && let AlertOutcome::Dispatched(path) = dispatcher.on_alert()
            {
                log::debug!("Alert dispatched for {:?}: {}", state, path.display());
            }
        })
        .await
        .context("Failed to read exit statuses from stdin")?;

        log::info!("Listener finished after {} reports", lines);
        self.engine.wait_idle().await;
        Ok(0)
    }

    async fn play(&self, sound: Option<String>) -> Result<i32> {
        let (identifier, volume) = {
            let config = self.config.read();
            let identifier = sound.or_else(|| config.selected_sound().map(str::to_string));
            (identifier, config.volume())
        };
        let Some(identifier) = identifier else {
            bail!("No sound selected; pass one or run `failchime config select <SOUND>`");
        };
        let Some(path) = self.library.resolve_identifier(&identifier) else {
            bail!("Unknown sound '{}'", identifier);
        };

        match self
            .engine
            .play_and_wait(&PlaybackRequest::new(path.clone(), volume))
            .await
        {
            Ok(player) => {
                println!("Played {} via {}", path.display(), player);
                Ok(0)
            }
            Err(e) => {
                eprintln!("failchime: {}", e);
                Ok(1)
            }
        }
    }

    async fn download(&self, url: String, select: bool) -> Result<i32> {
        std::fs::create_dir_all(&self.downloads_dir).with_context(|| {
            format!(
                "Failed to create downloads directory {}",
                self.downloads_dir.display()
            )
        })?;

        let limits = self.config.read().download;
        let fetcher = Arc::new(Fetcher::new(&self.downloads_dir).with_limits(FetchLimits {
            max_bytes: limits.max_bytes,
            max_redirects: limits.max_redirects,
        }));
        log::info!(
            "Downloading {} into {} (max {} bytes, {} redirects)",
            url,
            fetcher.destination_dir().display(),
            fetcher.limits().max_bytes,
            fetcher.limits().max_redirects
        );
        let path = fetcher
            .download_async(url.clone())
            .await
            .with_context(|| format!("Failed to download {}", url))?;
        println!("{}", path.display());

        if select {
            let mut config = self.config.write();
            config.set_selected_sound(path.display().to_string());
            self.save(&config)?;
            println!("Selected {}", path.display());
        }
        Ok(0)
    }

    fn print_sounds(&self) {
        let entries = self.library.list_builtin();
        if entries.is_empty() {
            println!(
                "No built-in sounds found in {}",
                self.library.dir().display()
            );
            return;
        }
        let config = self.config.read();
        let selected = config.selected_sound();
        for entry in entries {
            let marker = if selected == Some(entry.identifier.as_str()) {
                "*"
            } else {
                " "
            };
            println!(
                "{} {} {:<20} {}",
                marker, entry.emoji, entry.identifier, entry.display_label
            );
        }
    }

    fn configure(&self, action: ConfigAction) -> Result<i32> {
        let mut config = self.config.write();
        match action {
            ConfigAction::Show => {
                println!("config:     {}", self.config_path.display());
                println!("enabled:    {}", config.is_enabled());
                println!("volume:     {}", config.volume());
                println!(
                    "sound:      {}",
                    config.selected_sound().unwrap_or("(none)")
                );
                println!("debounce:   {} ms", config.debounce_ms);
                println!("max play:   {} ms", config.max_playback_ms);
                println!(
                    "downloads:  {} bytes max, {} redirects max",
                    config.download.max_bytes, config.download.max_redirects
                );
                println!("log level:  {}", config.log_level.as_str());
                return Ok(0);
            }
            ConfigAction::Enable => config.set_enabled(true),
            ConfigAction::Disable => config.set_enabled(false),
            ConfigAction::Volume { level } => config.set_volume(level),
            ConfigAction::Select { sound } => {
                if self.library.resolve_identifier(&sound).is_none() {
                    bail!("Unknown sound '{}'", sound);
                }
                config.set_selected_sound(sound);
            }
        }
        self.save(&config)?;
        Ok(0)
    }

    fn save(&self, config: &Config) -> Result<()> {
        config
            .save_to(&self.config_path)
            .with_context(|| format!("Failed to save config to {}", self.config_path.display()))
    }
}

/// Whether `command` edits the config file and so must not start from
/// silently replaced defaults.
fn needs_valid_config(command: &Commands) -> bool {
    matches!(
        command,
        Commands::Config { .. } | Commands::Download { select: true, .. }
    )
}

/// Load settings, apply the config's log level and run `cli`'s command.
pub async fn run(cli: Cli) -> Result<i32> {
    let app = App::load(needs_valid_config(&cli.command))?;
    crate::debug::apply_config_level(config_level_filter(app.config.read().log_level));
    app.execute(cli.command).await
}
