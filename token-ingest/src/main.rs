use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use token_core::{timestamp_to_rfc3339, RawTokenReading, TimestampMS, TokenSnapshot};
use token_series::LmdbSnapshotStore;
use tracing::{info, warn, Level};

/// Token Snapshot Ingestion CLI
///
/// Reads collector readings (one JSON document per line), normalizes the
/// supply fields from base units and appends the snapshots to the LMDB store
/// served by token-series-server.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON Lines file with raw readings ("-" for stdin)
    #[arg(short, long)]
    input: PathBuf,

    /// LMDB directory (created if missing)
    #[arg(short = 'p', long, default_value = "./data/token-snapshots")]
    lmdb_path: PathBuf,

    /// Time stamped on readings without a timestamp (RFC3339 format or "now")
    #[arg(short = 'r', long, default_value = "now")]
    received_at: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, default_value = "info")]
    log_level: String,
}

impl Args {
    /// Parse the fallback timestamp from string (either RFC3339 date or "now")
    fn parse_received_at(&self) -> Result<TimestampMS> {
        if self.received_at == "now" {
            return Ok(Utc::now().timestamp_millis());
        }

        let dt = DateTime::parse_from_rfc3339(&self.received_at)
            .with_context(|| format!("Invalid --received-at: {}", self.received_at))?;
        Ok(dt.timestamp_millis())
    }

    /// Parse log level from string
    fn parse_log_level(&self) -> Level {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }
}

/// Line counts of one ingestion run
#[derive(Debug, Default, PartialEq, Eq)]
struct IngestStats {
    stored: usize,
    rejected: usize,
    blank: usize,
}

/// Normalize every reading in `reader` and hand it to `sink`
///
/// Malformed or invalid lines are logged and counted; read and sink errors
/// abort the run.
fn ingest_lines<R, F>(reader: R, received_at: TimestampMS, mut sink: F) -> Result<IngestStats>
where
    R: BufRead,
    F: FnMut(&TokenSnapshot) -> Result<()>,
{
    let mut stats = IngestStats::default();

    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line.with_context(|| format!("Failed to read line {}", line_no))?;
        let line = line.trim();
        if line.is_empty() {
            stats.blank += 1;
            continue;
        }

        let snapshot = match serde_json::from_str::<RawTokenReading>(line) {
            Ok(reading) => reading.normalize(received_at),
            Err(e) => {
                warn!("Line {}: malformed reading: {}", line_no, e);
                stats.rejected += 1;
                continue;
            }
        };

        match snapshot {
            Ok(snapshot) => {
                sink(&snapshot).with_context(|| format!("Failed to store line {}", line_no))?;
                stats.stored += 1;
            }
            Err(e) => {
                warn!("Line {}: rejected: {}", line_no, e);
                stats.rejected += 1;
            }
        }
    }

    Ok(stats)
}

fn open_input(input: &Path) -> Result<Box<dyn BufRead + Send>> {
    if input.as_os_str() == "-" {
        return Ok(Box::new(BufReader::new(io::stdin())));
    }
    let file = File::open(input).with_context(|| format!("Failed to open {}", input.display()))?;
    Ok(Box::new(BufReader::new(file)))
}

fn run(args: &Args) -> Result<IngestStats> {
    let received_at = args.parse_received_at()?;

    std::fs::create_dir_all(&args.lmdb_path)
        .with_context(|| format!("Failed to create {}", args.lmdb_path.display()))?;
    let store = LmdbSnapshotStore::open(&args.lmdb_path)?;

    info!("Configuration:");
    info!("  Input: {}", args.input.display());
    info!("  LMDB path: {}", args.lmdb_path.display());
    info!(
        "  Received at: {} ({})",
        timestamp_to_rfc3339(received_at).unwrap_or_default(),
        received_at
    );
    info!("");

    let reader = open_input(&args.input)?;
    ingest_lines(reader, received_at, |snapshot| store.append(snapshot))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(args.parse_log_level())
        .with_target(false)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    info!("🚀 Token Snapshot Ingestion Tool");
    info!("================================");

    let stats = tokio::task::spawn_blocking(move || run(&args)).await??;

    info!("");
    info!("✅ Ingestion Complete!");
    info!("=====================");
    info!("  Stored: {} snapshots", stats.stored);
    info!("  Rejected: {} lines", stats.rejected);
    if stats.blank > 0 {
        info!("  Blank: {} lines", stats.blank);
    }

    Ok(())
}
