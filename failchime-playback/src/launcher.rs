//! Player process launching with a hard lifetime ceiling.
//!
//! [`ProcessLauncher`] is the seam between the engine and the OS so the
//! fallback chain can be exercised with scripted launchers in tests.
//! [`supervise`] owns the kill-timeout logic and works on any [`ChildHandle`].

use std::future::Future;
use std::io;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, Command};

/// How a launched player finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchOutcome {
    /// The process exited on its own; `None` when terminated by a signal
    Exited(Option<i32>),
    /// The process outlived its ceiling and was killed
    TimedOut,
}

impl LaunchOutcome {
    /// A clean exit or a timeout kill both mean the sound was audible.
    pub fn is_success(&self) -> bool {
        matches!(self, LaunchOutcome::Exited(Some(0)) | LaunchOutcome::TimedOut)
    }
}

/// Errors raised before or while waiting on a player process.
#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error("executable '{0}' not found")]
    NotFound(String),
    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("failed while waiting on '{program}': {source}")]
    Wait {
        program: String,
        #[source]
        source: io::Error,
    },
}

/// Starts an external program and reports how it finished.
pub trait ProcessLauncher: Send + Sync + 'static {
    /// Run `program` with `args`, killing it if it is still alive after `max_duration`.
    fn launch(
        &self,
        program: &str,
        args: &[String],
        max_duration: Duration,
    ) -> impl Future<Output = Result<LaunchOutcome, LaunchError>> + Send;
}

/// The operations [`supervise`] needs from a running process.
pub trait ChildHandle: Send {
    /// Wait for exit, yielding the exit code if there is one.
    fn wait_exit(&mut self) -> impl Future<Output = io::Result<Option<i32>>> + Send;
    /// Forcibly terminate the process and reap it.
    fn terminate(&mut self) -> impl Future<Output = io::Result<()>> + Send;
}

impl ChildHandle for Child {
    async fn wait_exit(&mut self) -> io::Result<Option<i32>> {
        let status = self.wait().await?;
        Ok(status.code())
    }

    async fn terminate(&mut self) -> io::Result<()> {
        self.kill().await
    }
}

/// Wait for `child` to exit, killing it once `max_duration` has elapsed.
///
/// The timer is owned by the wait: when the process exits first the
/// timeout is dropped along with it, so nothing fires afterwards.
pub async fn supervise<C: ChildHandle>(
    child: &mut C,
    max_duration: Duration,
) -> io::Result<LaunchOutcome> {
    let waited = tokio::time::timeout(max_duration, child.wait_exit()).await;
    match waited {
        Ok(code) => Ok(LaunchOutcome::Exited(code?)),
        Err(_) => {
            log::warn!(
                "Player still running after {} ms, killing it",
                max_duration.as_millis()
            );
            child.terminate().await?;
            Ok(LaunchOutcome::TimedOut)
        }
    }
}

/// Launches players as real child processes on the tokio runtime.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioLauncher;

impl ProcessLauncher for TokioLauncher {
    async fn launch(
        &self,
        program: &str,
        args: &[String],
        max_duration: Duration,
    ) -> Result<LaunchOutcome, LaunchError> {
        log::debug!("Launching player: {} {:?}", program, args);

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| {
                if source.kind() == io::ErrorKind::NotFound {
                    LaunchError::NotFound(program.to_string())
                } else {
                    LaunchError::Spawn {
                        program: program.to_string(),
                        source,
                    }
                }
            })?;

        supervise(&mut child, max_duration)
            .await
            .map_err(|source| LaunchError::Wait {
                program: program.to_string(),
                source,
            })
    }
}
