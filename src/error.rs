// src/error.rs
use std::io;
use thiserror::Error;

// Re-export anyhow's Result type
pub use anyhow::Result;

/// Custom Error type for the cmdprobe library
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Glob error for '{pattern}': {source}")]
    Glob {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("Collection error: {0}")]
    Collection(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Metric error: {0}")]
    Metric(String),

    #[error("Process error: {0}")]
    Process(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Timeout error: {0}")]
    Timeout(String),

    #[error("Other error: {0}")]
    Other(String),
}

impl AgentError {
    /// Wrap a glob pattern failure, keeping the offending pattern
    pub fn glob(pattern: impl Into<String>, source: glob::PatternError) -> Self {
        AgentError::Glob {
            pattern: pattern.into(),
            source,
        }
    }
}
