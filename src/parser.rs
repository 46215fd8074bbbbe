//! Parsers turning captured command output into metrics

use log::trace;
use serde_json::Value;

use crate::error::{AgentError, Result};
use crate::metric::{FieldValue, Metric};
use crate::process::ProcessError;

/// Trait for parsing raw command output into metrics.
///
/// A parser may declare that it understands exit state: for such parsers an
/// execution failure is not fatal — stdout is parsed anyway and the failure
/// is folded into the metrics via [`add_exit_state`](Parser::add_exit_state).
pub trait Parser: Send + Sync + 'static {
    /// Parse captured stdout into zero or more metrics
    fn parse(&self, output: &[u8]) -> Result<Vec<Metric>>;

    /// Whether execution failures carry state this parser can represent
    fn handles_exit_state(&self) -> bool {
        false
    }

    /// Fold an execution outcome into the parsed metrics
    fn add_exit_state(
        &self,
        error: Option<&ProcessError>,
        metrics: Vec<Metric>,
    ) -> Result<Vec<Metric>> {
        let _ = error;
        Ok(metrics)
    }
}

/// Parser for commands emitting a JSON object (or array of objects).
///
/// Every top-level scalar becomes a field: numbers as floats, strings and
/// booleans as-is. Nested values are skipped.
pub struct JsonParser {
    metric_name: String,
}

impl JsonParser {
    /// Create a JSON parser producing metrics with the given name
    pub fn new(metric_name: impl Into<String>) -> Self {
        Self {
            metric_name: metric_name.into(),
        }
    }

    fn object_to_metric(&self, object: &serde_json::Map<String, Value>) -> Metric {
        let mut metric = Metric::new(&self.metric_name);

        for (key, value) in object {
            match value {
                Value::Number(number) => {
                    if let Some(float) = number.as_f64() {
                        metric.add_field(key.as_str(), FieldValue::Float(float));
                    }
                }
                Value::String(text) => {
                    metric.add_field(key.as_str(), FieldValue::Str(text.clone()))
                }
                Value::Bool(flag) => metric.add_field(key.as_str(), FieldValue::Bool(*flag)),
                _ => trace!("Skipping non-scalar JSON field '{}'", key),
            }
        }

        metric
    }
}

impl Parser for JsonParser {
    fn parse(&self, output: &[u8]) -> Result<Vec<Metric>> {
        if output.iter().all(|b| b.is_ascii_whitespace()) {
            return Ok(Vec::new());
        }

        let value: Value = serde_json::from_slice(output)
            .map_err(|err| AgentError::Parse(format!("Invalid JSON: {}", err)))?;

        match value {
            Value::Object(object) => Ok(vec![self.object_to_metric(&object)]),
            Value::Array(items) => items
                .iter()
                .map(|item| match item {
                    Value::Object(object) => Ok(self.object_to_metric(object)),
                    other => Err(AgentError::Parse(format!(
                        "Expected JSON object, got: {}",
                        other
                    ))
                    .into()),
                })
                .collect(),
            other => {
                Err(AgentError::Parse(format!("Expected JSON object, got: {}", other)).into())
            }
        }
    }
}

/// Parser for Nagios-style check plugins.
///
/// The first output line is split at `|`; perfdata entries
/// (`label=value[;warn;crit;min;max]`) become float fields on a `nagios`
/// metric. The plugin's exit code is state, not failure: a non-zero exit is
/// folded into a `nagios_state` metric instead of being reported as an
/// error.
#[derive(Debug, Clone, Copy, Default)]
pub struct NagiosParser;

impl NagiosParser {
    /// Create a Nagios check parser
    pub fn new() -> Self {
        Self
    }
}

/// Nagios service states, per the plugin development guidelines
const STATE_OK: i64 = 0;
const STATE_UNKNOWN: i64 = 3;

impl Parser for NagiosParser {
    fn parse(&self, output: &[u8]) -> Result<Vec<Metric>> {
        let text = String::from_utf8_lossy(output);
        let Some(first_line) = text.lines().next() else {
            return Ok(Vec::new());
        };

        let Some((_, perfdata)) = first_line.split_once('|') else {
            return Ok(Vec::new());
        };

        let mut metric = Metric::new("nagios");
        for entry in perfdata.split_whitespace() {
            if let Some((label, rest)) = entry.split_once('=') {
                if let Some(value) = parse_perf_value(rest) {
                    metric.add_field(label.trim_matches('\''), FieldValue::Float(value));
                }
            }
        }

        if metric.fields().is_empty() {
            Ok(Vec::new())
        } else {
            Ok(vec![metric])
        }
    }

    fn handles_exit_state(&self) -> bool {
        true
    }

    fn add_exit_state(
        &self,
        error: Option<&ProcessError>,
        mut metrics: Vec<Metric>,
    ) -> Result<Vec<Metric>> {
        let state = match error {
            None => STATE_OK,
            Some(ProcessError::NonZeroExit(status)) => match status.code() {
                // Exit codes above the defined range mean the plugin itself
                // misbehaved, which Nagios treats as unknown.
                Some(code @ 0..=3) => i64::from(code),
                _ => STATE_UNKNOWN,
            },
            Some(_) => STATE_UNKNOWN,
        };

        let mut metric = Metric::new("nagios_state");
        metric.add_field("state", FieldValue::Int(state));
        metrics.push(metric);

        Ok(metrics)
    }
}

/// Parse the value part of a perfdata entry, dropping thresholds and units
fn parse_perf_value(raw: &str) -> Option<f64> {
    let value = raw.split(';').next()?;
    let end = value
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit() && !matches!(c, '.' | '+' | '-'))
        .map(|(i, _)| i)
        .unwrap_or(value.len());

    value[..end].parse().ok()
}
