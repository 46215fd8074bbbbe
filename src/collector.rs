//! The collection orchestrator
//!
//! One [`ExecCollector::gather`] call is one collection cycle: resolve the
//! static and dynamic command sets, run every resolved command on its own
//! task, parse and tag the output, and report everything to the sink. A
//! cycle always runs to completion; individual command failures are
//! reported, never escalated.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error};

use crate::accumulator::Accumulator;
use crate::config::ExecConfig;
use crate::error::{AgentError, Result};
use crate::metric::Metric;
use crate::parser::Parser;
use crate::process::{CapturedOutput, CommandRunner, Runner};
use crate::registry::{DynamicRegistry, PatternSet, expand_pattern};
use crate::resolve::resolve_commands;

/// Trait for metric collectors driven by an external cycle trigger
#[async_trait]
pub trait Collector: Send + Sync + 'static {
    /// Run one collection cycle, reporting metrics and errors to `acc`
    async fn gather(&self, acc: Arc<dyn Accumulator>) -> Result<()>;

    /// Get the collector name
    fn name(&self) -> &str;
}

/// A collector that gathers metrics from external commands.
///
/// The command set has two halves: a static half fixed at construction
/// (configured specs plus pattern-generated port commands) and a dynamic
/// half that an external producer may replace between cycles via
/// [`update_dynamic_commands`](Self::update_dynamic_commands).
pub struct ExecCollector {
    config: ExecConfig,
    static_set: Arc<PatternSet>,
    dynamic: Arc<DynamicRegistry>,
    parser: Arc<dyn Parser>,
    runner: Arc<dyn Runner>,
}

impl ExecCollector {
    /// Create a collector running commands through the system runner
    pub fn new(config: ExecConfig, parser: Arc<dyn Parser>) -> Self {
        Self::with_runner(config, parser, Arc::new(CommandRunner::new()))
    }

    /// Create a collector with a custom [`Runner`], the seam used by tests
    pub fn with_runner(
        mut config: ExecConfig,
        parser: Arc<dyn Parser>,
        runner: Arc<dyn Runner>,
    ) -> Self {
        config.normalize();

        let static_set = match config.pattern() {
            Some(pattern) => expand_pattern(pattern, &config.static_ports()),
            None => PatternSet::default(),
        };

        // Pattern-generated commands join the configured specs so both go
        // through the same per-cycle resolution.
        config
            .commands
            .extend(static_set.commands().iter().cloned());

        Self {
            config,
            static_set: Arc::new(static_set),
            dynamic: Arc::new(DynamicRegistry::new()),
            parser,
            runner,
        }
    }

    /// Regenerate the dynamic command set from an incoming metric batch.
    ///
    /// Every floating-point field value across the batch becomes a port,
    /// in metric and field enumeration order. The previous dynamic set is
    /// discarded wholesale. A batch with no float fields (or a collector
    /// without a pattern) leaves the current set untouched; an empty update
    /// is a no-op, not a reset.
    pub fn update_dynamic_commands(&self, metrics: &[Metric]) -> Result<()> {
        let Some(pattern) = self.config.pattern() else {
            debug!("No command pattern configured; ignoring dynamic update");
            return Ok(());
        };

        let ports = extract_ports(metrics);
        if ports.is_empty() {
            debug!("Dynamic update carried no port values; keeping current set");
            return Ok(());
        }

        debug!("Regenerating dynamic command set from {} ports", ports.len());
        self.dynamic.replace(expand_pattern(pattern, &ports))
    }

    /// The current dynamic command generation
    pub fn dynamic_snapshot(&self) -> Result<PatternSet> {
        self.dynamic.snapshot()
    }

    async fn gather_cycle(&self, acc: &Arc<dyn Accumulator>) -> Result<()> {
        let (commands, resolve_errors) = resolve_commands(&self.config.commands);
        for err in resolve_errors {
            acc.add_error(err);
        }

        // One snapshot per cycle: every command this cycle runs and every
        // tag lookup it makes sees the same dynamic generation.
        let snapshot = match self.dynamic.snapshot() {
            Ok(snapshot) => snapshot,
            Err(err) => {
                report_error(acc, err);
                PatternSet::default()
            }
        };
        let (dynamic_commands, dynamic_errors) = resolve_commands(snapshot.commands());
        for err in dynamic_errors {
            acc.add_error(err);
        }

        let timeout = self.config.timeout();
        let mut handles = Vec::with_capacity(commands.len() + dynamic_commands.len());

        for command in commands.into_iter().chain(dynamic_commands) {
            let runner = Arc::clone(&self.runner);
            let parser = Arc::clone(&self.parser);
            let statics = Arc::clone(&self.static_set);
            let snapshot = snapshot.clone();
            let acc = Arc::clone(acc);

            handles.push(tokio::spawn(async move {
                process_command(command, runner, parser, statics, snapshot, timeout, acc).await;
            }));
        }

        for handle in handles {
            if let Err(err) = handle.await {
                error!("Command task failed to complete: {}", err);
            }
        }

        Ok(())
    }
}

#[async_trait]
impl Collector for ExecCollector {
    async fn gather(&self, acc: Arc<dyn Accumulator>) -> Result<()> {
        self.gather_cycle(&acc).await
    }

    fn name(&self) -> &str {
        "exec"
    }
}

/// Run one resolved command and feed its metrics to the sink
async fn process_command(
    command: String,
    runner: Arc<dyn Runner>,
    parser: Arc<dyn Parser>,
    statics: Arc<PatternSet>,
    dynamic: PatternSet,
    timeout: Duration,
    acc: Arc<dyn Accumulator>,
) {
    let (output, exec_error) = match runner.run(&command, timeout).await {
        Ok(output) => {
            let error = output.execution_error();
            (output, error)
        }
        Err(err) => (CapturedOutput::default(), Some(err)),
    };

    if let Some(err) = &exec_error {
        if !parser.handles_exit_state() {
            acc.add_error(AgentError::Process(format!(
                "{} for command '{}': {}",
                err,
                command,
                output.stderr_lossy()
            )));
            return;
        }
    }

    let metrics = match parser.parse(&output.stdout) {
        Ok(metrics) => metrics,
        Err(err) => {
            report_error(&acc, err);
            return;
        }
    };

    let metrics = if parser.handles_exit_state() {
        match parser.add_exit_state(exec_error.as_ref(), metrics) {
            Ok(metrics) => metrics,
            Err(err) => {
                error!("Failed to add exit state for '{}': {}", command, err);
                return;
            }
        }
    } else {
        metrics
    };

    for mut metric in metrics {
        tag_metric(&statics, &dynamic, &command, &mut metric);
        acc.add_metric(metric);
    }
}

/// Attach the originating port as a tag, if this command was
/// pattern-generated in either half of the command set
fn tag_metric(statics: &PatternSet, dynamic: &PatternSet, command: &str, metric: &mut Metric) {
    if let Some(port) = statics.port_for(command) {
        metric.add_tag("port", port);
    }

    if let Some(port) = dynamic.port_for(command) {
        metric.add_tag("port", port);
    }
}

/// Every floating-point field value across the batch, rendered as a port
fn extract_ports(metrics: &[Metric]) -> Vec<String> {
    let mut ports = Vec::new();
    for metric in metrics {
        for (_, value) in metric.fields() {
            if let Some(float) = value.as_float() {
                ports.push(float.to_string());
            }
        }
    }
    ports
}

/// Forward an error to the sink, preserving its type where possible
fn report_error(acc: &Arc<dyn Accumulator>, err: anyhow::Error) {
    match err.downcast::<AgentError>() {
        Ok(err) => acc.add_error(err),
        Err(err) => acc.add_error(AgentError::Other(err.to_string())),
    }
}
