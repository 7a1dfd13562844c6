use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Semaphore, watch};
use tracing::{debug, warn};

use super::CommandLine;
use crate::tools::{ToolError, ToolErrorKind};

/// Captured outcome of a completed process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessResult {
    /// Exit code; `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessResult {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Map a non-zero exit into a `ProcessFailed` error of the form
    /// `"<context>: <stderr>"` carrying the command line.
    pub fn check(self, command: &CommandLine, context: &str) -> Result<Self, ToolError> {
        if self.success() {
            return Ok(self);
        }
        let detail = if self.stderr.trim().is_empty() {
            match self.exit_code {
                Some(code) => format!("exit code {code}"),
                None => "terminated by signal".to_string(),
            }
        } else {
            self.stderr.trim_end().to_string()
        };
        Err(
            ToolError::new(ToolErrorKind::ProcessFailed, format!("{context}: {detail}"))
                .with_command(command),
        )
    }
}

/// Bounds applied by the runner.
#[derive(Debug, Clone, Copy)]
pub struct RunnerLimits {
    pub timeout: Duration,
    pub max_detached: usize,
}

impl Default for RunnerLimits {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(300),
            max_detached: 4,
        }
    }
}

/// Executes `CommandLine`s, either to completion or detached.
///
/// Detached children are owned by reaper tasks: each one holds a slot until
/// its child exits, and every child still running is killed on `shutdown`
/// (or when the runner is dropped).
#[derive(Debug)]
pub struct ProcessRunner {
    limits: RunnerLimits,
    detached_slots: Arc<Semaphore>,
    shutdown: watch::Sender<bool>,
}

impl ProcessRunner {
    pub fn new(limits: RunnerLimits) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            limits,
            detached_slots: Arc::new(Semaphore::new(limits.max_detached)),
            shutdown,
        }
    }

    /// Run to completion, capturing stdout/stderr. A non-zero exit is not an
    /// error here; callers decide via [`ProcessResult::check`].
    pub async fn run(&self, command: &CommandLine) -> Result<ProcessResult, ToolError> {
        debug!(command = %command, "spawning process");
        let child = command
            .to_command()
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| launch_error(command, e))?;

        // On timeout the future (and with it the child) is dropped, which kills it.
        let output = match tokio::time::timeout(self.limits.timeout, child.wait_with_output()).await
        {
            Ok(res) => res.map_err(|e| launch_error(command, e))?,
            Err(_) => {
                return Err(ToolError::new(
                    ToolErrorKind::DeadlineExceeded,
                    format!(
                        "{} did not finish within {}s",
                        command.program(),
                        self.limits.timeout.as_secs_f32()
                    ),
                )
                .with_command(command));
            }
        };

        let result = ProcessResult {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        debug!(command = %command, exit_code = ?result.exit_code, "process finished");
        Ok(result)
    }

    /// Spawn without waiting. Output goes to the null device; the returned
    /// value is the child's pid when the platform reports one.
    pub fn spawn_detached(&self, command: &CommandLine) -> Result<Option<u32>, ToolError> {
        let permit = self
            .detached_slots
            .clone()
            .try_acquire_owned()
            .map_err(|_| {
                ToolError::new(
                    ToolErrorKind::Busy,
                    format!(
                        "Too many background processes running (limit {})",
                        self.limits.max_detached
                    ),
                )
                .with_command(command)
            })?;

        let mut child = command
            .to_command()
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| launch_error(command, e))?;

        let pid = child.id();
        let label = command.to_string();
        let mut shutdown = self.shutdown.subscribe();
        debug!(command = %label, ?pid, "spawned detached process");

        tokio::spawn(async move {
            tokio::select! {
                status = child.wait() => match status {
                    Ok(status) => debug!(command = %label, %status, "detached process exited"),
                    Err(e) => warn!(command = %label, error = %e, "failed to reap detached process"),
                },
                _ = shutdown.changed() => {
                    if let Err(e) = child.kill().await {
                        warn!(command = %label, error = %e, "failed to kill detached process");
                    } else {
                        debug!(command = %label, "killed detached process on shutdown");
                    }
                }
            }
            drop(permit);
        });

        Ok(pid)
    }

    /// Number of detached children still being tracked.
    pub fn detached_count(&self) -> usize {
        self.limits.max_detached - self.detached_slots.available_permits()
    }

    /// Kill every tracked detached child.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new(RunnerLimits::default())
    }
}

fn launch_error(command: &CommandLine, err: std::io::Error) -> ToolError {
    ToolError::new(
        ToolErrorKind::LaunchFailed,
        format!("Failed to launch {}: {err}", command.program()),
    )
    .with_command(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str) -> CommandLine {
        CommandLine::new("sh").unwrap().args(["-c", script])
    }

    #[tokio::test]
    async fn captures_stdout_and_exit_code() {
        let runner = ProcessRunner::default();
        let res = runner.run(&sh("echo hello")).await.unwrap();
        assert!(res.success());
        assert_eq!(res.stdout.trim(), "hello");
    }

    #[tokio::test]
    async fn nonzero_exit_maps_to_failure_with_stderr_and_command() {
        let runner = ProcessRunner::default();
        let cmd = sh("echo oops >&2; exit 3");
        let res = runner.run(&cmd).await.unwrap();
        assert_eq!(res.exit_code, Some(3));
        let err = res.check(&cmd, "Error running tool sh").unwrap_err();
        assert_eq!(err.kind, ToolErrorKind::ProcessFailed);
        let text = err.to_string();
        assert!(text.contains("oops"));
        assert!(text.contains("sh -c 'echo oops >&2; exit 3'"));
    }

    #[tokio::test]
    async fn missing_executable_is_launch_failure() {
        let runner = ProcessRunner::default();
        let cmd = CommandLine::new("definitely-not-a-real-binary-4711").unwrap();
        let err = runner.run(&cmd).await.unwrap_err();
        assert_eq!(err.kind, ToolErrorKind::LaunchFailed);
        assert_eq!(
            err.command.as_deref(),
            Some("definitely-not-a-real-binary-4711")
        );
    }

    #[tokio::test]
    async fn timeout_is_deadline_exceeded() {
        let runner = ProcessRunner::new(RunnerLimits {
            timeout: Duration::from_millis(100),
            max_detached: 1,
        });
        let err = runner.run(&sh("sleep 5")).await.unwrap_err();
        assert_eq!(err.kind, ToolErrorKind::DeadlineExceeded);
    }

    #[tokio::test]
    async fn detached_slots_are_bounded_and_released() {
        let runner = ProcessRunner::new(RunnerLimits {
            timeout: Duration::from_secs(5),
            max_detached: 1,
        });
        runner.spawn_detached(&sh("sleep 5")).unwrap();
        assert_eq!(runner.detached_count(), 1);

        let err = runner.spawn_detached(&sh("sleep 5")).unwrap_err();
        assert_eq!(err.kind, ToolErrorKind::Busy);

        runner.shutdown();
        for _ in 0..50 {
            if runner.detached_count() == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(runner.detached_count(), 0);
    }

    #[tokio::test]
    async fn detached_child_is_reaped_after_exit() {
        let runner = ProcessRunner::default();
        runner.spawn_detached(&sh("exit 0")).unwrap();
        for _ in 0..50 {
            if runner.detached_count() == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(runner.detached_count(), 0);
    }
}
