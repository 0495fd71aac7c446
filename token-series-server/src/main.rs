mod protocol;
mod server;
mod handler;
mod config;
mod error;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::ServerConfig;
use server::RpcServer;
use token_series::{check_tick_budget, MonthMode, SeriesConfig};

#[derive(Parser)]
#[command(name = "token-series-server")]
#[command(about = "JSON-RPC server for token metric OHLC series")]
struct Cli {
    /// Server host to bind to
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Server port to bind to
    #[arg(long, default_value = "7880")]
    port: u16,

    /// Path to the LMDB snapshot store written by token-ingest
    #[arg(long, default_value = "./data/token-snapshots")]
    lmdb_path: String,

    /// Maximum number of buckets per series
    #[arg(long, default_value = "120", value_parser = parse_tick_budget)]
    tick_budget: usize,

    /// Layout of 1M buckets (fixed_stride, calendar)
    #[arg(long, default_value = "fixed_stride")]
    month_mode: MonthMode,

    /// Default row count for series.history
    #[arg(long, default_value = "100")]
    history_limit: usize,

    /// Skip flat filler candles between sparse buckets
    #[arg(long)]
    no_gap_fill: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn parse_tick_budget(value: &str) -> Result<usize, String> {
    let tick_budget: usize = value.parse().map_err(|e| format!("{}", e))?;
    check_tick_budget(tick_budget).map_err(|e| e.to_string())?;
    Ok(tick_budget)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "token_series_server={},token_series={}",
                cli.log_level, cli.log_level
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("🚀 Token Series JSON-RPC Server Starting");
    tracing::info!("Configuration:");
    tracing::info!("  Host: {}", cli.host);
    tracing::info!("  Port: {}", cli.port);
    tracing::info!("  LMDB path: {}", cli.lmdb_path);
    tracing::info!("  Tick budget: {}", cli.tick_budget);
    tracing::info!("  Month mode: {}", cli.month_mode);
    tracing::info!("  Gap fill: {}", !cli.no_gap_fill);

    let config = ServerConfig {
        host: cli.host,
        port: cli.port,
        lmdb_path: cli.lmdb_path,
        history_limit: cli.history_limit,
        series: SeriesConfig {
            tick_budget: cli.tick_budget,
            month_mode: cli.month_mode,
            fill_gaps: !cli.no_gap_fill,
            ..SeriesConfig::default()
        },
    };

    let server = RpcServer::new(config)?;
    server.run().await?;

    Ok(())
}
