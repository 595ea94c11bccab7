//! Command-line interface for failchime.

use clap::{Parser, Subcommand};
use failchime_config::LogLevel;

/// failchime - play a sound when a shell command fails
#[derive(Debug, Parser)]
#[command(name = "failchime")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Set debug log level (overrides config and RUST_LOG)
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevelArg>,
}

/// Log level argument for CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogLevelArg {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevelArg {
    /// Convert to `log::LevelFilter`
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevelArg::Off => log::LevelFilter::Off,
            LogLevelArg::Error => log::LevelFilter::Error,
            LogLevelArg::Warn => log::LevelFilter::Warn,
            LogLevelArg::Info => log::LevelFilter::Info,
            LogLevelArg::Debug => log::LevelFilter::Debug,
            LogLevelArg::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Convert the config file's level to a `log::LevelFilter`.
pub fn config_level_filter(level: LogLevel) -> log::LevelFilter {
    match level {
        LogLevel::Off => log::LevelFilter::Off,
        LogLevel::Error => log::LevelFilter::Error,
        LogLevel::Warn => log::LevelFilter::Warn,
        LogLevel::Info => log::LevelFilter::Info,
        LogLevel::Debug => log::LevelFilter::Debug,
        LogLevel::Trace => log::LevelFilter::Trace,
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run a command and play the alert if it fails
    Run {
        /// Command and its arguments
        #[arg(
            required = true,
            num_args = 1..,
            trailing_var_arg = true,
            allow_hyphen_values = true,
            value_name = "COMMAND"
        )]
        command: Vec<String>,
    },

    /// Read exit statuses from stdin, one per line, and alert on failures
    Listen,

    /// Play the selected sound (or the given one) once
    Play {
        /// Built-in sound identifier or path to a sound file
        sound: Option<String>,
    },

    /// Download a sound into the downloads directory
    Download {
        /// http or https URL of the sound
        url: String,

        /// Select the downloaded file as the alert sound
        #[arg(long)]
        select: bool,
    },

    /// List the built-in sounds
    Sounds,

    /// Show or change settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the current settings
    Show,
    /// Turn alerts on
    Enable,
    /// Turn alerts off
    Disable,
    /// Set the alert volume
    Volume {
        /// Volume from 0 to 100
        #[arg(value_parser = clap::value_parser!(u8).range(0..=100))]
        level: u8,
    },
    /// Select the alert sound
    Select {
        /// Built-in sound identifier or path to a sound file
        sound: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_keeps_command_flags() {
        let cli = Cli::try_parse_from(["failchime", "run", "--", "ls", "-la", "/nope"]).unwrap();
        match cli.command {
            Commands::Run { command } => assert_eq!(command, vec!["ls", "-la", "/nope"]),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_run_requires_command() {
        assert!(Cli::try_parse_from(["failchime", "run"]).is_err());
    }

    #[test]
    fn test_volume_range() {
        assert!(Cli::try_parse_from(["failchime", "config", "volume", "100"]).is_ok());
        assert!(Cli::try_parse_from(["failchime", "config", "volume", "101"]).is_err());
    }

    #[test]
    fn test_global_log_level() {
        let cli = Cli::try_parse_from(["failchime", "sounds", "--log-level", "debug"]).unwrap();
        assert_eq!(cli.log_level, Some(LogLevelArg::Debug));
        assert_eq!(
            cli.log_level.map(LogLevelArg::to_level_filter),
            Some(log::LevelFilter::Debug)
        );
    }

    #[test]
    fn test_download_select_flag() {
        let cli =
            Cli::try_parse_from(["failchime", "download", "https://x.test/a.wav", "--select"])
                .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Download { ref url, select: true } if url == "https://x.test/a.wav"
        ));
    }
}
