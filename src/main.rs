//! `stagevisor` binary: reads operator commands from stdin.
//!
//! ```text
//! $ stagevisor --log-format text
//! transfer
//! received 5 packets from update app
//! query
//! pipeline finished, upgrade succeeded
//! ```
//!
//! Log verbosity follows `RUST_LOG` (default `stagevisor=info`). Stdin is read on
//! its own thread, so SIGINT/SIGTERM end the process even while input is open.

use std::{sync::Arc, time::Duration};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tokio::io;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stagevisor::{
    CommandLoop, Config, LogWriter, Orchestrator, Pipeline, Subscribe, spawn_line_reader,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

/// Multi-stage packet forwarding pipeline driven by `start`, `transfer` and `query`.
#[derive(Debug, Parser)]
#[command(name = "stagevisor", version, about)]
struct Cli {
    /// Budget for `start` and `query` to wait for the queues to drain.
    #[arg(long, default_value_t = 30_000)]
    barrier_timeout_ms: u64,

    /// How often the barrier re-checks a non-empty queue.
    #[arg(long, default_value_t = 200)]
    poll_interval_ms: u64,

    /// How long a worker sleeps between drains while withdrawing.
    #[arg(long, default_value_t = 1_000)]
    withdraw_idle_ms: u64,

    /// Log line format.
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

impl Cli {
    fn config(&self) -> Config {
        Config {
            barrier_timeout: Duration::from_millis(self.barrier_timeout_ms),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            withdraw_idle: Duration::from_millis(self.withdraw_idle_ms),
            ..Config::default()
        }
    }
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "stagevisor=info".into());

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let pipeline = Pipeline::builder(cli.config())
        .with_subscribers(subs)
        .build();
    tracing::info!(config = ?pipeline.config(), "pipeline started");

    let commands = CommandLoop::new(Orchestrator::new(pipeline.clone()));
    let serve = async {
        let lines = spawn_line_reader(std::io::BufReader::new(std::io::stdin()));
        if let Err(e) = commands.run_lines(lines, io::stdout()).await {
            tracing::error!(error = %e, "command input failed");
        }
    };

    pipeline
        .run_until(serve)
        .await
        .context("pipeline shutdown")?;
    Ok(())
}
