use std::fs::File;
use std::sync::Mutex;

use clap::{Parser, Subcommand};
use tickerpipe::config::fetch_config;
use tickerpipe::server::run_server;
use tickerpipe::tui::{StartMode, run_dashboard};
use tickerpipe::{PipelineError, Result};
use tracing_subscriber::EnvFilter;

/// Default log file for the dashboard, which owns stdout.
const DEFAULT_DASHBOARD_LOG: &str = "tickerpipe-dashboard.log";

/// Live exchange prices with local fan-out and a terminal dashboard.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Stream prices from the exchange and serve the local API.
    Serve {
        /// Symbol to track at startup (defaults to TICKERPIPE_SYMBOL).
        #[arg(short, long)]
        symbol: Option<String>,
    },
    /// Open the terminal dashboard against a running server.
    Dashboard {
        /// Switch the server to this symbol before showing prices.
        #[arg(short, long, conflicts_with = "select")]
        symbol: Option<String>,
        /// Start in the coin selector.
        #[arg(long)]
        select: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let app_config = fetch_config()?;

    match cli.command {
        Command::Serve { symbol } => {
            init_stdout_logging();
            let symbol = symbol.unwrap_or_else(|| app_config.feed.symbol.clone());
            run_server(&app_config, &symbol).await
        }
        Command::Dashboard { symbol, select } => {
            init_file_logging()?;
            let start = match (symbol, select) {
                (Some(symbol), _) => StartMode::Preselected(symbol.trim().to_ascii_lowercase()),
                (None, true) => StartMode::Select,
                (None, false) => StartMode::Attach,
            };
            run_dashboard(&app_config, start).await
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

fn init_stdout_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_target(true)
        .init();
}

/// Sends logs to a file so they never draw over the dashboard.
fn init_file_logging() -> Result<()> {
    let path = std::env::var("TICKERPIPE_DASHBOARD_LOG")
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_DASHBOARD_LOG.to_string());
    let file = File::create(&path)
        .map_err(|e| PipelineError::Io(format!("failed to create log file {path}: {e}")))?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}
