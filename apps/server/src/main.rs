//! Betwatch - Hourly Betting Risk Alert
//!
//! Queries ClickHouse for high-value or suspicious rounds in the last hour and
//! posts a summary to Slack. Runs once per invocation; scheduling is external.

mod config;

use betwatch_alerts::{run_once, JobError};
use clap::Parser;
use config::AppConfig;
use std::process::ExitCode;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

/// Betwatch CLI
#[derive(Parser, Debug)]
#[command(name = "betwatch")]
#[command(about = "Hourly betting risk alert for Slack", long_about = None)]
struct Args {
    /// Log level: trace, debug, info, warn, error
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Fetch and format, but log the payload instead of posting it
    #[arg(long, default_value_t = false)]
    dry_run: bool,
}

fn init_logging(level: &str) {
    let level = match level {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

fn exit_code(err: &JobError) -> u8 {
    match err {
        JobError::Query(_) => 2,
        JobError::Delivery(_) => 3,
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    init_logging(&args.log_level);

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return ExitCode::from(1);
        }
    };

    info!("Betwatch starting...");
    info!("  ClickHouse: {}", config.job.clickhouse.endpoint());
    info!("  Database: {}", config.job.clickhouse.database);
    info!("  Dry Run: {}", args.dry_run);

    match run_once(&config.job, args.dry_run).await {
        Ok(report) => {
            info!(flagged = report.flagged, "Betwatch finished");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Error in alert job: {}", e);
            ExitCode::from(exit_code(&e))
        }
    }
}
