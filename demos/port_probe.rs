// Example of a port-probing agent built on cmdprobe

use clap::Parser as ClapParser;
use cmdprobe::prelude::*;
use cmdprobe::util::logging;
use log::{info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::time::{Duration, interval};

/// Command line arguments for the port probe example
#[derive(ClapParser, Debug)]
#[command(name = "port_probe", about = "cmdprobe port probing example")]
struct Args {
    /// Path to the configuration file (required)
    #[arg(short, long)]
    config: PathBuf,

    /// Interval between collection cycles in seconds
    #[arg(short, long, default_value = "60")]
    interval: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(&args.config)?;
    logging::init(&config.log_level);

    info!(
        "Starting port probe with {} configured commands (cmdprobe {})",
        config.commands.len(),
        cmdprobe::VERSION
    );

    let collector = Arc::new(ExecCollector::new(
        config,
        Arc::new(JsonParser::new("port_probe")),
    ));
    let acc = Arc::new(MemoryAccumulator::new());

    let mut ticker = interval(Duration::from_secs(args.interval));
    loop {
        ticker.tick().await;

        collector
            .gather(Arc::clone(&acc) as Arc<dyn Accumulator>)
            .await?;

        for metric in acc.take_metrics()? {
            println!("{}", metric.to_json());
        }
        for error in acc.take_errors()? {
            warn!("Collection error: {}", error);
        }
    }
}
