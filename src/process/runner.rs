use std::io;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command as TokioCommand;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use super::error::{ProcessError, ProcessResult};
use super::sanitize::{
    platform_strips_carriage_returns, remove_carriage_returns, truncate_stderr,
};
use super::{CapturedOutput, ExecOutcome};

/// Trait for executing a single command with a timeout
#[async_trait]
pub trait Runner: Send + Sync + 'static {
    /// Run a command line, waiting at most `timeout` for it to finish.
    ///
    /// Returns the captured output on any outcome that produced a process;
    /// `Err` is reserved for commands that never ran (unparseable command
    /// line, spawn failure).
    async fn run(&self, command: &str, timeout: Duration) -> ProcessResult<CapturedOutput>;
}

/// Production [`Runner`] backed by `tokio::process`
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandRunner;

impl CommandRunner {
    /// Create a new command runner
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Runner for CommandRunner {
    async fn run(
        &self,
        command: &str,
        timeout_duration: Duration,
    ) -> ProcessResult<CapturedOutput> {
        let words = shlex::split(command)
            .filter(|words| !words.is_empty())
            .ok_or_else(|| ProcessError::CommandParse(command.to_string()))?;

        debug!("Running command: {} {:?}", words[0], &words[1..]);

        let mut cmd = TokioCommand::new(&words[0]);
        cmd.args(&words[1..])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(ProcessError::Spawn)?;

        // Drain both pipes concurrently so a chatty command cannot deadlock
        // against a full pipe buffer while we wait on it.
        let stdout_task = drain_pipe(child.stdout.take());
        let stderr_task = drain_pipe(child.stderr.take());

        let outcome = match timeout(timeout_duration, child.wait()).await {
            Ok(Ok(status)) if status.success() => ExecOutcome::Success,
            Ok(Ok(status)) => ExecOutcome::NonZeroExit(status),
            Ok(Err(err)) => return Err(ProcessError::Wait(err)),
            Err(_) => {
                if let Err(err) = child.kill().await {
                    warn!("Failed to kill timed-out command '{}': {}", command, err);
                }
                ExecOutcome::TimedOut(timeout_duration)
            }
        };

        // Killing the child closes its pipes, so these joins cannot hang.
        let stdout = join_pipe(stdout_task).await?;
        let stderr = join_pipe(stderr_task).await?;

        let strip = platform_strips_carriage_returns();
        let stdout = remove_carriage_returns(stdout, strip);
        let stderr = if stderr.is_empty() {
            stderr
        } else {
            truncate_stderr(remove_carriage_returns(stderr, strip))
        };

        Ok(CapturedOutput {
            stdout,
            stderr,
            outcome,
        })
    }
}

/// Read a pipe to EOF on a separate task
fn drain_pipe<R>(pipe: Option<R>) -> JoinHandle<io::Result<Vec<u8>>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            pipe.read_to_end(&mut buf).await?;
        }
        Ok(buf)
    })
}

async fn join_pipe(task: JoinHandle<io::Result<Vec<u8>>>) -> ProcessResult<Vec<u8>> {
    task.await
        .map_err(|err| ProcessError::Read(io::Error::other(err)))?
        .map_err(ProcessError::Read)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_captures_stdout() {
        let runner = CommandRunner::new();
        let output = runner
            .run("echo hello", Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(output.stdout, b"hello\n");
        assert!(output.stderr.is_empty());
        assert!(matches!(output.outcome, ExecOutcome::Success));
        assert!(output.execution_error().is_none());
    }

    #[tokio::test]
    async fn test_run_honours_quoting() {
        let runner = CommandRunner::new();
        let output = runner
            .run("echo 'one two'", Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(output.stdout, b"one two\n");
    }

    #[tokio::test]
    async fn test_run_reports_non_zero_exit() {
        let runner = CommandRunner::new();
        let output = runner
            .run("sh -c 'exit 3'", Duration::from_secs(5))
            .await
            .unwrap();

        assert!(matches!(output.outcome, ExecOutcome::NonZeroExit(_)));
        assert!(matches!(
            output.execution_error(),
            Some(ProcessError::NonZeroExit(_))
        ));
    }

    #[tokio::test]
    async fn test_run_kills_on_timeout() {
        let runner = CommandRunner::new();
        let output = runner
            .run("sleep 5", Duration::from_millis(100))
            .await
            .unwrap();

        assert!(matches!(output.outcome, ExecOutcome::TimedOut(_)));
        assert!(matches!(
            output.execution_error(),
            Some(ProcessError::Timeout(_))
        ));
    }

    #[tokio::test]
    async fn test_run_rejects_unparseable_command() {
        let runner = CommandRunner::new();
        let err = runner
            .run("echo 'unclosed", Duration::from_secs(5))
            .await
            .unwrap_err();

        assert!(matches!(err, ProcessError::CommandParse(_)));
    }

    #[tokio::test]
    async fn test_run_rejects_empty_command() {
        let runner = CommandRunner::new();
        let err = runner.run("", Duration::from_secs(5)).await.unwrap_err();

        assert!(matches!(err, ProcessError::CommandParse(_)));
    }

    #[tokio::test]
    async fn test_run_reports_spawn_failure() {
        let runner = CommandRunner::new();
        let err = runner
            .run("/nonexistent/cmdprobe-test-binary", Duration::from_secs(5))
            .await
            .unwrap_err();

        assert!(matches!(err, ProcessError::Spawn(_)));
    }

    #[tokio::test]
    async fn test_run_truncates_stderr_to_first_line() {
        let runner = CommandRunner::new();
        let output = runner
            .run(
                "sh -c 'echo first >&2; echo second >&2'",
                Duration::from_secs(5),
            )
            .await
            .unwrap();

        assert_eq!(output.stderr, b"first...");
    }
}
