//! perfprofd — the perfprof daemon.
//!
//! Assembles a data source, the profile engine and the REST API:
//! - Data source (built-in fixture, local CSV, or S3 CSV)
//! - Profile engine
//! - REST API
//!
//! # Usage
//!
//! ```text
//! perfprofd serve --port 8080 --csv-file /data/benchmarks.csv
//! perfprofd generate --workload workload.json --mock --format text
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod cli;
mod generate;
mod report;
mod serve;

use cli::SourceArgs;

#[derive(Parser)]
#[command(
    name = "perfprofd",
    about = "SLO-bound throughput profiler",
    version,
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the profile API until interrupted.
    Serve {
        /// Path to perfprof.toml.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Port to listen on (overrides [server].port).
        #[arg(long)]
        port: Option<u16>,

        #[command(flatten)]
        source: SourceArgs,
    },
    /// Generate one profile and print it to stdout.
    Generate {
        /// Workload definition file (.json or .toml).
        #[arg(short, long)]
        workload: PathBuf,

        /// Path to perfprof.toml.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format: json or text
        #[arg(short, long, default_value = "json")]
        format: String,

        #[command(flatten)]
        source: SourceArgs,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .or_else(|_| tracing_subscriber::EnvFilter::try_new("info,perfprofd=debug,perfprof=debug"))?,
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            config,
            port,
            source,
        } => serve::run_server(config.as_deref(), port, &source).await,
        Command::Generate {
            workload,
            config,
            format,
            source,
        } => generate::run_generate(&workload, config.as_deref(), &format, &source).await,
    }
}
