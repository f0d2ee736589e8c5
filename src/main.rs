//! `matrank` CLI - Collect wrestling rankings from the best available source

mod cmd;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use matrank::SourceKind;

use cmd::{cmd_category, cmd_run, cmd_sources};

#[derive(Parser)]
#[command(name = "matrank")]
#[command(about = "Multi-source wrestling rankings ingestion")]
#[command(version)]
struct Cli {
    /// Rankings config file (default: ~/.config/matrank/rankings.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command that runs the pipeline.
#[derive(Args, Debug, Clone)]
pub struct PipelineArgs {
    /// Fetch per-weight pages through headless Chrome
    #[arg(long)]
    rendered: bool,

    /// Only consult this source (feed, listing, pages, rendered)
    #[arg(short, long, value_name = "SOURCE")]
    source: Option<SourceKind>,

    /// Per-weight page edition (see `matrank sources`)
    #[arg(short, long)]
    edition: Option<String>,

    /// Print records and diagnostics as JSON
    #[arg(long)]
    json: bool,

    /// Save pages no parser understood into this directory
    #[arg(long, value_name = "DIR")]
    debug_dir: Option<PathBuf>,

    /// Concurrent per-weight page fetches
    #[arg(short, long)]
    workers: Option<usize>,

    /// Give up on the run after this many seconds
    #[arg(long, value_name = "SECS")]
    deadline_secs: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect rankings for every configured weight class
    Run {
        #[command(flatten)]
        pipeline: PipelineArgs,

        /// Replace the contents of this JSON file with the records
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Collect rankings for a single weight class
    Category {
        /// Weight class, e.g. 184
        weight: String,

        #[command(flatten)]
        pipeline: PipelineArgs,
    },

    /// List configured sources and per-weight page editions
    Sources,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so `--json` output stays machine-readable
    let default_filter = if cli.verbose { "matrank=debug" } else { "matrank=info" };
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    let config = cli.config.as_deref();
    match cli.command {
        Commands::Run { pipeline, output } => {
            cmd_run(config, &pipeline, output.as_deref()).await?;
        }
        Commands::Category { weight, pipeline } => {
            cmd_category(config, &weight, &pipeline).await?;
        }
        Commands::Sources => {
            cmd_sources(config)?;
        }
    }

    Ok(())
}
