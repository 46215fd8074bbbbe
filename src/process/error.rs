use std::io;
use std::process::ExitStatus;
use std::time::Duration;
use thiserror::Error;

/// Result type for process operations
pub type ProcessResult<T> = std::result::Result<T, ProcessError>;

/// Errors that can occur while running a command
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Unable to parse command '{0}'")]
    CommandParse(String),

    #[error("Failed to spawn process: {0}")]
    Spawn(io::Error),

    #[error("Process exited with non-zero status: {0}")]
    NonZeroExit(ExitStatus),

    #[error("Process timed out after {0:?}")]
    Timeout(Duration),

    #[error("Failed to read from process: {0}")]
    Read(io::Error),

    #[error("Failed to wait for process: {0}")]
    Wait(io::Error),
}

impl From<ProcessError> for crate::error::AgentError {
    fn from(err: ProcessError) -> Self {
        match err {
            ProcessError::Timeout(_) => crate::error::AgentError::Timeout(err.to_string()),
            _ => crate::error::AgentError::Process(err.to_string()),
        }
    }
}
