//! Pattern-generated command sets and the runtime-swappable registry

use log::debug;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::{AgentError, Result};

/// Substitution placeholder recognised in command pattern templates
pub const PATTERN_PLACEHOLDER: &str = "%s";

/// A generation of pattern-derived commands and their originating ports.
///
/// Every command in `commands` was produced by substituting its bound port
/// into one template, so a set is always internally consistent; sets are
/// replaced wholesale, never edited.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatternSet {
    commands: Vec<String>,
    binding: HashMap<String, String>,
}

impl PatternSet {
    /// Generated commands, in port order
    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    /// The port that generated `command`, if it belongs to this set
    pub fn port_for(&self, command: &str) -> Option<&str> {
        self.binding.get(command).map(String::as_str)
    }

    /// Whether this set holds no commands
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Number of commands in this set
    pub fn len(&self) -> usize {
        self.commands.len()
    }
}

/// Generate one command per port by substituting each port into the
/// template's single `%s` placeholder.
pub fn expand_pattern<S: AsRef<str>>(pattern: &str, ports: &[S]) -> PatternSet {
    let mut commands = Vec::with_capacity(ports.len());
    let mut binding = HashMap::with_capacity(ports.len());

    for port in ports {
        let port = port.as_ref();
        let command = pattern.replacen(PATTERN_PLACEHOLDER, port, 1);
        binding.insert(command.clone(), port.to_string());
        commands.push(command);
    }

    PatternSet { commands, binding }
}

/// The runtime-replaceable half of the command set.
///
/// Collection cycles take a snapshot under the read lock; an external
/// producer installs a whole new generation under the write lock. A cycle
/// therefore sees exactly one generation from start to finish, and
/// concurrent writers simply overwrite each other (last writer wins).
#[derive(Debug, Default)]
pub struct DynamicRegistry {
    current: RwLock<PatternSet>,
}

impl DynamicRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Clone the current generation for use by one collection cycle
    pub fn snapshot(&self) -> Result<PatternSet> {
        let current = self
            .current
            .read()
            .map_err(|_| AgentError::Other("Lock poisoned".to_string()))?;
        Ok(current.clone())
    }

    /// Install a new generation, discarding the previous one entirely
    pub fn replace(&self, set: PatternSet) -> Result<()> {
        let mut current = self
            .current
            .write()
            .map_err(|_| AgentError::Other("Lock poisoned".to_string()))?;

        debug!(
            "Replacing dynamic command set: {} -> {} commands",
            current.len(),
            set.len()
        );
        *current = set;

        Ok(())
    }

    /// Look up the originating port of a command in the current generation
    pub fn port_for(&self, command: &str) -> Result<Option<String>> {
        let current = self
            .current
            .read()
            .map_err(|_| AgentError::Other("Lock poisoned".to_string()))?;
        Ok(current.port_for(command).map(str::to_string))
    }
}
