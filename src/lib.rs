//! A core library for building command-execution metric collection agents

pub mod accumulator;
pub mod collector;
pub mod config;
pub mod error;
pub mod metric;
pub mod parser;
pub mod process;
pub mod registry;
pub mod resolve;
pub mod util;

/// Re-export of commonly used types for convenience
pub mod prelude {
    pub use crate::accumulator::{Accumulator, MemoryAccumulator};
    pub use crate::collector::{Collector, ExecCollector};
    pub use crate::config::{ExecConfig, LogLevel, load_config};
    pub use crate::error::{AgentError, Result};
    pub use crate::metric::{FieldValue, Metric};
    pub use crate::parser::{JsonParser, NagiosParser, Parser};
    pub use crate::process::{CapturedOutput, CommandRunner, ExecOutcome, Runner};
    pub use crate::registry::{DynamicRegistry, PatternSet, expand_pattern};
}

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
