use anyhow::Result;
use clap::Parser;
use failchime::cli::{Cli, LogLevelArg};
use std::time::Duration;
use tokio::runtime::Runtime;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Routes all log::info!() etc. to the debug log file; mirrors to stderr
    // when RUST_LOG is set. The config's level is applied once it is loaded.
    failchime::debug::init_log_bridge(cli.log_level.map(LogLevelArg::to_level_filter));

    log::info!("Starting failchime {}", failchime::VERSION);

    let runtime = Runtime::new()?;
    let result = runtime.block_on(failchime::app::run(cli));

    // Give a stuck background task a moment, never block exit on it.
    runtime.shutdown_timeout(Duration::from_secs(2));
    log::logger().flush();

    match result {
        Ok(0) => Ok(()),
        // Mirror the monitored command's exit code to the shell.
        Ok(code) => std::process::exit(code),
        Err(e) => {
            // Exit directly so the error is printed once.
            eprintln!("failchime: error: {e:#}");
            std::process::exit(1);
        }
    }
}
