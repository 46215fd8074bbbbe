use config::{self, File};
use log::{debug, error};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::error::{AgentError, Result};

/// Default per-command timeout in seconds
fn default_timeout_secs() -> u64 {
    5
}

/// Configuration for a command-execution collector
#[derive(Debug, Deserialize, Clone)]
pub struct ExecConfig {
    /// Command specs to run each cycle; the first token of each spec may be
    /// a filesystem glob
    #[serde(default)]
    pub commands: Vec<String>,

    /// Legacy single-command option, folded into `commands` at startup
    #[serde(default)]
    pub command: Option<String>,

    /// Command template with a single `%s` placeholder
    #[serde(default)]
    pub pattern: Option<String>,

    /// Comma-separated ports substituted into `pattern` at startup
    #[serde(default)]
    pub listen_ports: Option<String>,

    /// Timeout for each command to complete, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Measurement name suffix, for separating different commands.
    /// Recognised here but applied by the embedding parser/sink layer.
    #[serde(default)]
    pub name_suffix: Option<String>,

    /// Logging level
    #[serde(default)]
    pub log_level: LogLevel,
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            commands: Vec::new(),
            command: None,
            pattern: None,
            listen_ports: None,
            timeout_secs: default_timeout_secs(),
            name_suffix: None,
            log_level: LogLevel::default(),
        }
    }
}

impl ExecConfig {
    /// Per-command timeout as a [`Duration`]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// The command pattern, treating an empty string as unset
    pub fn pattern(&self) -> Option<&str> {
        self.pattern.as_deref().filter(|pattern| !pattern.is_empty())
    }

    /// Fold the legacy single-command option into `commands`, clearing it
    pub(crate) fn normalize(&mut self) {
        if let Some(command) = self.command.take() {
            if !command.is_empty() {
                debug!("Folding legacy 'command' option into command list");
                self.commands.push(command);
            }
        }
    }

    /// Ports listed in the comma-separated `listen_ports` option
    pub(crate) fn static_ports(&self) -> Vec<String> {
        match self.listen_ports.as_deref() {
            Some(ports) if !ports.is_empty() => {
                ports.split(',').map(str::to_string).collect()
            }
            _ => Vec::new(),
        }
    }
}

/// Logging level
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Error level
    Error,
    /// Warning level
    Warn,
    /// Info level
    #[default]
    Info,
    /// Debug level
    Debug,
    /// Trace level
    Trace,
}

/// Load collector configuration from a file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ExecConfig> {
    let path = path.as_ref();
    debug!("Loading configuration from {}", path.display());

    if !path.exists() {
        error!("Configuration file {} does not exist", path.display());
        return Err(AgentError::Config(format!(
            "Configuration file not found: {}",
            path.display()
        ))
        .into());
    }

    let extension = match path.extension() {
        Some(ext) => ext.to_string_lossy().to_lowercase(),
        None => {
            return Err(AgentError::Config(format!(
                "Configuration file has no extension: {}",
                path.display()
            ))
            .into());
        }
    };

    let format = match extension.as_str() {
        "toml" => config::FileFormat::Toml,
        "json" => config::FileFormat::Json,
        "yaml" | "yml" => config::FileFormat::Yaml,
        format => {
            return Err(
                AgentError::Config(format!("Unsupported config format: {}", format)).into(),
            );
        }
    };

    let config = config::Config::builder()
        .add_source(File::with_name(&path.to_string_lossy()).format(format))
        .build()
        .map_err(|e| AgentError::Config(e.to_string()))?;

    config
        .try_deserialize()
        .map_err(|e| AgentError::Config(e.to_string()).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_load_from_toml_file() {
        let mut file = Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
            commands = ["/tmp/test.sh", "/usr/bin/mycollector --foo=bar"]
            pattern = "check_port %s"
            listen_ports = "80,443"
            timeout_secs = 10
            "#
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.commands.len(), 2);
        assert_eq!(config.pattern(), Some("check_port %s"));
        assert_eq!(config.static_ports(), vec!["80", "443"]);
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert_eq!(config.log_level, LogLevel::Info);
    }

    #[test]
    fn test_defaults() {
        let config = ExecConfig::default();
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert!(config.commands.is_empty());
        assert!(config.pattern().is_none());
        assert!(config.static_ports().is_empty());
    }

    #[test]
    fn test_empty_pattern_is_unset() {
        let config = ExecConfig {
            pattern: Some(String::new()),
            ..Default::default()
        };
        assert!(config.pattern().is_none());
    }

    #[test]
    fn test_normalize_folds_legacy_command() {
        let mut config = ExecConfig {
            commands: vec!["first".to_string()],
            command: Some("legacy --flag".to_string()),
            ..Default::default()
        };

        config.normalize();
        assert_eq!(config.commands, ["first", "legacy --flag"]);
        assert!(config.command.is_none());

        // A second pass has nothing left to fold
        config.normalize();
        assert_eq!(config.commands.len(), 2);
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = load_config("/nonexistent/cmdprobe.toml").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AgentError>(),
            Some(AgentError::Config(_))
        ));
    }
}
