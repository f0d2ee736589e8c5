//! `matrank` - Multi-source wrestling rankings ingestion
//!
//! # Features
//!
//! - **Source priority**: ranking feed, aggregate listing page, per-weight pages
//! - **Parser cascade**: JSON-LD, embedded scripts, ranking tables, text heuristics
//! - **Rendered pages**: optional headless Chrome for client-rendered rankings
//! - **Normalization**: one canonical record per weight class and rank
//! - **Failure isolation**: every failed fetch is a diagnostic, never an abort
//!
//! # Example
//!
//! ```rust,no_run
//! use matrank::{Orchestrator, RankingsConfig, RunOptions};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = RankingsConfig::load(None)?;
//!     let orchestrator = Orchestrator::from_config(&config, &RunOptions::default())?;
//!     let result = orchestrator.run().await;
//!     println!("{} wrestlers from {:?}", result.records.len(), result.run.winner);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod debug_sink;
pub mod error;
pub mod fetch;
pub mod fingerprint;
pub mod http_client;
pub mod model;
pub mod normalize;
pub mod orchestrator;
pub mod parse;
pub mod source;
pub mod store;

pub use config::{RankingsConfig, WEIGHT_CLASSES};
pub use debug_sink::{DebugSink, FileDebugSink};
pub use error::{ConfigError, FailureReason, FetchError, SourceFailure};
pub use fetch::{FetchMode, Fetcher, PageFetcher, RawContent};
pub use fingerprint::{chrome_profile, firefox_profile, random_profile, BrowserProfile};
pub use http_client::AcceleratedClient;
pub use model::{ParserKind, PipelineRun, RawRow, RecordBatch, Wrestler};
pub use normalize::normalize;
pub use orchestrator::{Orchestrator, PipelineResult, RunOptions};
pub use parse::{CategoryParser, ParserCascade};
pub use source::{SourceAdapter, SourceKind};
pub use store::{JsonFileStore, RankingStore};

/// Version of matrank
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
