//! Metric sinks fed by collection cycles

use log::error;
use std::sync::RwLock;

use crate::error::{AgentError, Result};
use crate::metric::Metric;

/// Trait for sinks that receive metrics and errors from collection cycles.
///
/// Both operations are fire-and-forget; delivery is best-effort per cycle.
pub trait Accumulator: Send + Sync + 'static {
    /// Accept a collected metric
    fn add_metric(&self, metric: Metric);

    /// Accept a non-fatal collection error
    fn add_error(&self, error: AgentError);
}

/// A minimal in-memory accumulator for tests and demos
#[derive(Default)]
pub struct MemoryAccumulator {
    metrics: RwLock<Vec<Metric>>,
    errors: RwLock<Vec<AgentError>>,
}

impl MemoryAccumulator {
    /// Create an empty accumulator
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the metrics received so far
    pub fn metrics(&self) -> Result<Vec<Metric>> {
        let metrics = self
            .metrics
            .read()
            .map_err(|_| AgentError::Other("Lock poisoned".to_string()))?;
        Ok(metrics.clone())
    }

    /// Rendered messages of the errors received so far
    pub fn errors(&self) -> Result<Vec<String>> {
        let errors = self
            .errors
            .read()
            .map_err(|_| AgentError::Other("Lock poisoned".to_string()))?;
        Ok(errors.iter().map(|err| err.to_string()).collect())
    }

    /// Drain all buffered metrics
    pub fn take_metrics(&self) -> Result<Vec<Metric>> {
        let mut metrics = self
            .metrics
            .write()
            .map_err(|_| AgentError::Other("Lock poisoned".to_string()))?;
        Ok(std::mem::take(&mut *metrics))
    }

    /// Drain all buffered errors
    pub fn take_errors(&self) -> Result<Vec<AgentError>> {
        let mut errors = self
            .errors
            .write()
            .map_err(|_| AgentError::Other("Lock poisoned".to_string()))?;
        Ok(std::mem::take(&mut *errors))
    }
}

impl Accumulator for MemoryAccumulator {
    fn add_metric(&self, metric: Metric) {
        match self.metrics.write() {
            Ok(mut metrics) => metrics.push(metric),
            Err(_) => error!("Dropping metric: accumulator lock poisoned"),
        }
    }

    fn add_error(&self, err: AgentError) {
        match self.errors.write() {
            Ok(mut errors) => errors.push(err),
            Err(_) => error!("Dropping error: accumulator lock poisoned"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_accumulator_collects() {
        let acc = MemoryAccumulator::new();
        acc.add_metric(Metric::new("m"));
        acc.add_error(AgentError::Collection("boom".to_string()));

        assert_eq!(acc.metrics().unwrap().len(), 1);
        assert_eq!(acc.errors().unwrap(), vec!["Collection error: boom"]);
    }
}
