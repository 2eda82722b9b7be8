//! dirsum - directory fingerprinting and snapshot diffing.
//!
//! Usage:
//!   dirsum summary [--dir DIR] [--output FILE]   Write a snapshot of DIR
//!   dirsum diff --src FILE --target FILE         List paths that differ
//!   dirsum serve [--dir DIR] [--port PORT]       Serve diff/upload/delete over HTTP
//!   dirsum --help                                Show help

use std::net::IpAddr;
use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser, Subcommand};
use color_eyre::eyre::{Context, Result, eyre};
use tracing::info;
use tracing_subscriber::EnvFilter;

use dirsum_core::{HashAlgorithm, SnapshotStore, WalkConfig};
use dirsum_diff::{Comparator, DiffConfig, SkipPolicy};
use dirsum_scan::Walker;
use dirsum_serve::{OperationLog, ServeConfig};

/// Environment variable overriding the log filter.
const LOG_ENV: &str = "DIRSUM_LOG";

#[derive(Parser)]
#[command(
    name = "dirsum",
    version,
    about = "Directory fingerprinting and snapshot diffing",
    long_about = "dirsum records a fingerprint (type, size, content hash) for every entry \
                  under a directory and reports which paths differ between two snapshots.\n\n\
                  Snapshots are JSON arrays sorted by path, so identical trees produce \
                  identical files."
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Walk a directory and write its snapshot
    Summary {
        /// Directory to summarize
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,

        /// Files larger than this are not hashed (e.g. "10MB", "512KB", "4096")
        #[arg(short, long, default_value = "10MB")]
        bigfile: String,

        /// Hash algorithm for files within the threshold (adler32, blake3, md5, none)
        #[arg(short, long, default_value = "adler32")]
        algorithm: HashAlgorithm,

        /// Walk threads (0 = auto)
        #[arg(short, long, default_value = "0")]
        threads: usize,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compare two snapshot files
    Diff {
        /// Baseline snapshot
        #[arg(short, long)]
        src: PathBuf,

        /// Candidate snapshot
        #[arg(short, long)]
        target: PathBuf,

        /// Print added/removed/modified classes instead of a flat list
        #[arg(long)]
        detailed: bool,

        /// Compare skipped entries by their recorded fields instead of
        /// always reporting them as changed
        #[arg(long)]
        lenient_skip: bool,
    },

    /// Serve snapshot diffing and file upload/delete over HTTP
    Serve {
        /// Directory to serve
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,

        /// Files larger than this are not hashed
        #[arg(short, long, default_value = "10MB")]
        bigfile: String,

        /// Hash algorithm for files within the threshold
        #[arg(short, long, default_value = "adler32")]
        algorithm: HashAlgorithm,

        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        bind: IpAddr,

        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,

        /// Lines kept by the operation log served at /log
        #[arg(long, default_value = "1000")]
        log_capacity: usize,
    },
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    match cli.command {
        Command::Summary {
            dir,
            bigfile,
            algorithm,
            threads,
            output,
        } => {
            init_logging(cli.verbose, "warn")?;
            run_summary(&dir, &bigfile, algorithm, threads, output)?;
        }
        Command::Diff {
            src,
            target,
            detailed,
            lenient_skip,
        } => {
            init_logging(cli.verbose, "warn")?;
            run_diff(&src, &target, detailed, lenient_skip)?;
        }
        Command::Serve {
            dir,
            bigfile,
            algorithm,
            bind,
            port,
            log_capacity,
        } => {
            init_logging(cli.verbose, "info")?;
            let config = ServeConfig::builder()
                .root(dir)
                .big_file_threshold(parse_size(&bigfile)?)
                .algorithm(algorithm)
                .bind(bind)
                .port(port)
                .log_capacity(log_capacity)
                .build()
                .map_err(|e| eyre!("Invalid serve configuration: {e}"))?;
            run_serve(config)?;
        }
    }

    Ok(())
}

/// Install the stderr subscriber. `DIRSUM_LOG` wins over `-v`.
fn init_logging(verbose: u8, base: &str) -> Result<()> {
    let level = match verbose {
        0 => base,
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| eyre!("Failed to initialize logging: {e}"))
}

/// Walk a directory and emit its snapshot.
fn run_summary(
    dir: &Path,
    bigfile: &str,
    algorithm: HashAlgorithm,
    threads: usize,
    output: Option<PathBuf>,
) -> Result<()> {
    let config = WalkConfig::builder()
        .root(dir)
        .big_file_threshold(parse_size(bigfile)?)
        .algorithm(algorithm)
        .threads(threads)
        .build()
        .map_err(|e| eyre!("Invalid walk configuration: {e}"))?;

    let snapshot = Walker::new().walk(&config).context("Walk failed")?;

    info!(
        entries = snapshot.len(),
        total = %format_size(snapshot.total_size()),
        skipped = snapshot.skipped_count(),
        "snapshot built"
    );

    match output {
        Some(output_path) => {
            SnapshotStore::save(&output_path, &snapshot)
                .with_context(|| format!("Failed to write {}", output_path.display()))?;
            eprintln!(
                "Wrote {} entries ({}) to {}",
                snapshot.len(),
                format_size(snapshot.total_size()),
                output_path.display()
            );
        }
        None => {
            println!("{}", SnapshotStore::to_json(&snapshot)?);
        }
    }

    Ok(())
}

/// Compare two snapshot files and print the changed paths.
fn run_diff(src: &Path, target: &Path, detailed: bool, lenient_skip: bool) -> Result<()> {
    let src_snapshot = SnapshotStore::load(src)
        .with_context(|| format!("Failed to load {}", src.display()))?;
    let target_snapshot = SnapshotStore::load(target)
        .with_context(|| format!("Failed to load {}", target.display()))?;

    let skip_policy = if lenient_skip {
        SkipPolicy::CompareFields
    } else {
        SkipPolicy::AlwaysChanged
    };
    let comparator = Comparator::with_config(DiffConfig { skip_policy });
    let report = comparator.compare(&src_snapshot, &target_snapshot);

    if detailed {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", serde_json::to_string_pretty(&report.into_paths())?);
    }

    Ok(())
}

/// Serve until `/exit` or Ctrl-C, then drop in-flight requests.
fn run_serve(config: ServeConfig) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let log = OperationLog::new(config.log_capacity);
    let result = runtime.block_on(async move {
        tokio::select! {
            result = dirsum_serve::serve(config, log) => result,
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted, stopping");
                Ok(())
            }
        }
    });

    runtime.shutdown_background();
    result.context("Server failed")
}

/// Format size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

/// Parse a size string (e.g., "4096", "512KB", "10MB", "1GB").
fn parse_size(s: &str) -> Result<u64> {
    let s = s.trim().to_uppercase();

    let (digits, multiplier): (&str, u64) = if let Some(n) = s.strip_suffix("GB").or_else(|| s.strip_suffix('G')) {
        (n, 1024 * 1024 * 1024)
    } else if let Some(n) = s.strip_suffix("MB").or_else(|| s.strip_suffix('M')) {
        (n, 1024 * 1024)
    } else if let Some(n) = s.strip_suffix("KB").or_else(|| s.strip_suffix('K')) {
        (n, 1024)
    } else if let Some(n) = s.strip_suffix('B') {
        (n, 1)
    } else {
        (s.as_str(), 1)
    };

    let num: f64 = digits
        .trim()
        .parse()
        .with_context(|| format!("Invalid size: {s}"))?;
    if !num.is_finite() {
        return Err(eyre!("Invalid size: {s}"));
    }
    if num < 0.0 {
        return Err(eyre!("Size cannot be negative: {s}"));
    }

    Ok((num * multiplier as f64) as u64)
}
