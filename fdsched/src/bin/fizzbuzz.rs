//! fizzbuzz: two producers and a consumer multiplexed over two pipes and a
//! timer on a single thread.
//!
//! Prints one line per timer tick to stdout. Logs go to stderr, filtered
//! by `RUST_LOG` (default `warn`).

use std::io;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use fdsched::SchedulerBuilder;
use fdsched::fizzbuzz::{self, FizzBuzzConfig};

/// FizzBuzz over pipes, driven by readiness polling.
#[derive(Parser, Debug)]
#[command(name = "fizzbuzz", version, about)]
struct Cli {
    /// Number of consumer iterations (timer reads) before stopping.
    #[arg(long, env = "FIZZBUZZ_TICKS", default_value_t = 20)]
    ticks: u64,

    /// Timer period in milliseconds.
    #[arg(
        long,
        env = "FIZZBUZZ_INTERVAL_MS",
        default_value_t = 100,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    interval_ms: u64,

    /// Size of the descriptor table; every descriptor must be below it.
    #[arg(long, env = "FIZZBUZZ_MAX_FD", default_value_t = fdsched::MAX_FD)]
    max_fd: usize,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    anyhow::ensure!(cli.max_fd > 0, "--max-fd must be > 0");

    let config = FizzBuzzConfig {
        ticks: cli.ticks,
        interval: Duration::from_millis(cli.interval_ms),
    };

    let report = fizzbuzz::run(
        &config,
        SchedulerBuilder::new().max_fd(cli.max_fd),
        io::stdout(),
    )
    .context("fizzbuzz run failed")?;

    info!(
        iterations = report.iterations,
        expirations = report.expirations,
        "done"
    );

    Ok(())
}
