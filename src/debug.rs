//! Log bridge for the `log` facade.
//!
//! Every record goes to `failchime_debug.log` in the temp directory
//! (`/tmp` on Unix/macOS, `%TEMP%` on Windows) so alerts fired from shell
//! hooks never write into the user's terminal. When `RUST_LOG` is set the
//! records are mirrored to stderr as well. Runs append to the file until it
//! passes [`MAX_LOG_BYTES`]; the next run then starts it over.
//!
//! Level precedence: `--log-level`, then `RUST_LOG`, then the config file's
//! `log_level`, then `info`.

use log::{LevelFilter, Log, Metadata, Record};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Default verbosity when nothing else decides.
pub const DEFAULT_LEVEL: LevelFilter = LevelFilter::Info;

/// Size at which the debug log is truncated on the next start (1 MiB).
pub const MAX_LOG_BYTES: u64 = 1024 * 1024;

struct LogBridge {
    file: Option<Mutex<File>>,
    mirror_stderr: bool,
}

impl Log for LogBridge {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format!(
            "[{}] [{:<5}] [{}] {}\n",
            get_timestamp(),
            record.level(),
            record.target(),
            record.args()
        );
        if let Some(file) = &self.file {
            let _ = file.lock().write_all(line.as_bytes());
        }
        if self.mirror_stderr {
            eprint!("{}", line);
        }
    }

    fn flush(&self) {
        if let Some(file) = &self.file {
            let _ = file.lock().flush();
        }
    }
}

static BRIDGE: OnceLock<LogBridge> = OnceLock::new();

/// Set when the flag or `RUST_LOG` chose the level; the config may not
/// override it then.
static LEVEL_PINNED: AtomicBool = AtomicBool::new(false);

/// Path of the debug log file.
pub fn log_path() -> PathBuf {
    #[cfg(unix)]
    {
        PathBuf::from("/tmp/failchime_debug.log")
    }
    #[cfg(not(unix))]
    {
        std::env::temp_dir().join("failchime_debug.log")
    }
}

/// Install the bridge as the global logger. Later calls are no-ops.
pub fn init_log_bridge(cli_level: Option<LevelFilter>) {
    let rust_log = std::env::var("RUST_LOG").ok();
    let pinned = cli_level.or_else(|| rust_log.as_deref().map(parse_rust_log));
    let level = resolve_level(cli_level, rust_log.as_deref(), None);

    let bridge = BRIDGE.get_or_init(|| {
        // Silently run without a file if it can't be opened
        let file = open_log_file(&log_path(), MAX_LOG_BYTES)
            .ok()
            .map(Mutex::new);
        LogBridge {
            file,
            mirror_stderr: rust_log.is_some(),
        }
    });

    if log::set_logger(bridge).is_ok() {
        LEVEL_PINNED.store(pinned.is_some(), Ordering::Relaxed);
        log::set_max_level(level);
    }
}

/// Open `path` for appending, starting it over once it has reached
/// `max_bytes`.
fn open_log_file(path: &Path, max_bytes: u64) -> std::io::Result<File> {
    let oversized = std::fs::metadata(path).is_ok_and(|meta| meta.len() >= max_bytes);
    let mut options = OpenOptions::new();
    options.create(true);
    if oversized {
        options.write(true).truncate(true);
    } else {
        options.append(true);
    }
    options.open(path)
}

/// Apply the config file's level unless the flag or `RUST_LOG` already
/// chose one.
pub fn apply_config_level(level: LevelFilter) {
    if !LEVEL_PINNED.load(Ordering::Relaxed) {
        log::set_max_level(level);
    }
}

/// Pick the effective level from the three sources.
pub fn resolve_level(
    cli_level: Option<LevelFilter>,
    rust_log: Option<&str>,
    config_level: Option<LevelFilter>,
) -> LevelFilter {
    cli_level
        .or_else(|| rust_log.map(parse_rust_log))
        .or(config_level)
        .unwrap_or(DEFAULT_LEVEL)
}

/// Accepts a bare level (`debug`) or a directive list (`failchime=trace`),
/// in which case the most verbose level named wins. Anything else means
/// the user wants logs: `debug`.
fn parse_rust_log(value: &str) -> LevelFilter {
    value
        .split(',')
        .filter_map(|directive| directive.rsplit('=').next())
        .filter_map(|level| level.trim().parse::<LevelFilter>().ok())
        .max()
        .unwrap_or(LevelFilter::Debug)
}

fn get_timestamp() -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    format!("{}.{:06}", now.as_secs(), now.subsec_micros())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_flag_wins() {
        assert_eq!(
            resolve_level(Some(LevelFilter::Warn), Some("trace"), Some(LevelFilter::Error)),
            LevelFilter::Warn
        );
    }

    #[test]
    fn test_rust_log_beats_config() {
        assert_eq!(
            resolve_level(None, Some("error"), Some(LevelFilter::Trace)),
            LevelFilter::Error
        );
    }

    #[test]
    fn test_config_then_default() {
        assert_eq!(
            resolve_level(None, None, Some(LevelFilter::Debug)),
            LevelFilter::Debug
        );
        assert_eq!(resolve_level(None, None, None), DEFAULT_LEVEL);
    }

    #[test]
    fn test_log_file_appends_below_cap() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("debug.log");
        std::fs::write(&path, b"earlier run\n").unwrap();

        let mut file = open_log_file(&path, 1024).unwrap();
        file.write_all(b"this run\n").unwrap();
        drop(file);

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "earlier run\nthis run\n"
        );
    }

    #[test]
    fn test_log_file_truncated_at_cap() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("debug.log");
        std::fs::write(&path, vec![b'x'; 2048]).unwrap();

        let mut file = open_log_file(&path, 1024).unwrap();
        file.write_all(b"fresh\n").unwrap();
        drop(file);

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "fresh\n");
    }

    #[test]
    fn test_repeated_runs_stay_bounded() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("debug.log");
        let line = [b'l'; 100];

        for _ in 0..50 {
            let mut file = open_log_file(&path, 1024).unwrap();
            file.write_all(&line).unwrap();
        }

        assert!(std::fs::metadata(&path).unwrap().len() < 1024 + line.len() as u64);
    }

    #[test]
    fn test_rust_log_directives() {
        assert_eq!(parse_rust_log("info"), LevelFilter::Info);
        assert_eq!(parse_rust_log("warn,failchime=trace"), LevelFilter::Trace);
        assert_eq!(parse_rust_log("failchime_fetch"), LevelFilter::Debug);
    }
}
