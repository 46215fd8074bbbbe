//! Safe one-shot process execution for metric collection
//!
//! This module runs a single command line with a bounded timeout, capturing
//! stdout and a sanitised slice of stderr. Long-running daemons are out of
//! scope; every invocation is expected to finish (or be killed) within its
//! timeout.

mod error;
mod runner;
mod sanitize;

pub use error::{ProcessError, ProcessResult};
pub use runner::{CommandRunner, Runner};
pub use sanitize::{MAX_STDERR_BYTES, remove_carriage_returns, truncate_stderr};

use std::process::ExitStatus;
use std::time::Duration;

/// How a command invocation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecOutcome {
    /// Exited with status zero
    Success,
    /// Exited with a non-zero status
    NonZeroExit(ExitStatus),
    /// Killed after exceeding its timeout
    TimedOut(Duration),
}

/// Captured output of one command invocation
#[derive(Debug, Clone)]
pub struct CapturedOutput {
    /// Raw stdout bytes (carriage returns stripped on Windows)
    pub stdout: Vec<u8>,

    /// Sanitised stderr: first line only, capped at [`MAX_STDERR_BYTES`]
    pub stderr: Vec<u8>,

    /// Exit outcome of the invocation
    pub outcome: ExecOutcome,
}

impl CapturedOutput {
    /// The execution error corresponding to this outcome, if any
    pub fn execution_error(&self) -> Option<ProcessError> {
        match self.outcome {
            ExecOutcome::Success => None,
            ExecOutcome::NonZeroExit(status) => Some(ProcessError::NonZeroExit(status)),
            ExecOutcome::TimedOut(duration) => Some(ProcessError::Timeout(duration)),
        }
    }

    /// Stderr as a lossy UTF-8 string, for error reporting
    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

impl Default for CapturedOutput {
    fn default() -> Self {
        Self {
            stdout: Vec::new(),
            stderr: Vec::new(),
            outcome: ExecOutcome::Success,
        }
    }
}
