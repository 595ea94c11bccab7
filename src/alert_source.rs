//! Where alerts come from: finished shell commands.
//!
//! Two front ends feed the dispatcher. [`run_command`] runs a child and
//! classifies how it ended; [`listen`] reads exit statuses written one per
//! line by a shell hook.

use anyhow::{Context, Result};
use std::process::ExitStatus;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// How a command ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitState {
    Success,
    Failure(i32),
    /// No exit code is known (killed by a signal, unparseable report)
    Indeterminate,
}

impl ExitState {
    pub fn from_code(code: Option<i32>) -> Self {
        match code {
            Some(0) => ExitState::Success,
            Some(code) => ExitState::Failure(code),
            None => ExitState::Indeterminate,
        }
    }

    pub fn from_exit_status(status: &ExitStatus) -> Self {
        Self::from_code(status.code())
    }

    /// Parse one line of `listen` input. Blank or non-numeric lines are
    /// indeterminate.
    pub fn parse_line(line: &str) -> Self {
        match line.trim().parse::<i32>() {
            Ok(code) => Self::from_code(Some(code)),
            Err(_) => ExitState::Indeterminate,
        }
    }

    /// Only a definite failure alerts.
    pub fn should_alert(&self) -> bool {
        matches!(self, ExitState::Failure(_))
    }
}

/// Result of running a monitored command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandOutcome {
    pub state: ExitState,
    /// Code this process should exit with to mirror the child
    pub exit_code: i32,
}

/// Run `program` with inherited stdio and wait for it.
pub async fn run_command(program: &str, args: &[String]) -> Result<CommandOutcome> {
    log::debug!("Running {} {:?}", program, args);
    let status = tokio::process::Command::new(program)
        .args(args)
        .status()
        .await
        .with_context(|| format!("Failed to run '{}'", program))?;

    let state = ExitState::from_exit_status(&status);
    let exit_code = status.code().unwrap_or_else(|| signal_exit_code(&status));
    log::info!("'{}' finished: {:?}", program, state);
    Ok(CommandOutcome { state, exit_code })
}

#[cfg(unix)]
fn signal_exit_code(status: &ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status.signal().map_or(1, |signal| 128 + signal)
}

#[cfg(not(unix))]
fn signal_exit_code(_status: &ExitStatus) -> i32 {
    1
}

/// Feed every status line from `reader` to `on_state` until end of input.
///
/// Returns the number of lines read.
pub async fn listen<R, F>(reader: R, mut on_state: F) -> std::io::Result<usize>
where
    R: AsyncBufRead + Unpin,
    F: FnMut(ExitState),
{
    let mut lines = reader.lines();
    let mut count = 0;
    while let Some(line) = lines.next_line().await? {
        count += 1;
        let state = ExitState::parse_line(&line);
        log::debug!("Reported status {:?} -> {:?}", line, state);
        on_state(state);
    }
    Ok(count)
}
