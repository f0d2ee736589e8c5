//! Source priority and the run as a whole.
//!
//! Sources are consulted in trust order: feed, listing page, per-category
//! pages. The first source whose batches normalize to at least one record
//! wins wholesale, even if it covered only some categories; later sources are
//! not consulted. When every source comes back empty the run still succeeds
//! with an empty result and the failures in [`PipelineRun`].
//!
//! A run-wide deadline bounds the whole attempt. Batches a source finished
//! before the deadline are kept and no further source is tried.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::config::RankingsConfig;
use crate::debug_sink::{DebugSink, FileDebugSink, NoopSink};
use crate::error::{ConfigError, FetchError};
use crate::fetch::{Fetcher, PageFetcher};
use crate::model::{PipelineRun, Wrestler};
use crate::normalize::normalize_batches;
use crate::source::pages::Pacing;
use crate::source::{
    BatchCollector, CategoryPagesAdapter, FeedAdapter, ListingAdapter, SourceAdapter, SourceKind,
};

/// Operator choices for one run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Per-category edition; the configured default when `None`.
    pub edition: Option<String>,
    /// Use the headless-browser variant of the per-category source.
    pub rendered: bool,
    /// Restrict the run to one source.
    pub only: Option<SourceKind>,
    pub workers: Option<usize>,
    pub deadline: Option<Duration>,
    /// Where to write raw content that no parser understood.
    pub debug_dir: Option<PathBuf>,
}

/// Records and diagnostics of one run.
#[derive(Debug, Clone, Default)]
pub struct PipelineResult {
    pub records: Vec<Wrestler>,
    pub run: PipelineRun,
}

#[derive(Clone, Copy)]
enum Scope<'a> {
    All,
    One(&'a str),
}

pub struct Orchestrator {
    sources: Vec<Box<dyn SourceAdapter>>,
    categories: Vec<String>,
    deadline: Duration,
}

impl Orchestrator {
    pub fn new(sources: Vec<Box<dyn SourceAdapter>>, categories: Vec<String>, deadline: Duration) -> Self {
        Self {
            sources,
            categories,
            deadline,
        }
    }

    /// Validate `config` and build the source list it describes.
    ///
    /// Nothing touches the network here; every error is a configuration
    /// problem.
    pub fn from_config(config: &RankingsConfig, options: &RunOptions) -> Result<Self, ConfigError> {
        config.validate()?;
        let (edition_key, edition) = config.edition(options.edition.as_deref())?;

        let fetcher: Arc<dyn Fetcher> = Arc::new(PageFetcher::new(config).map_err(ConfigError::Client)?);
        let sink: Arc<dyn DebugSink> = match &options.debug_dir {
            Some(dir) => Arc::new(FileDebugSink::new(dir)),
            None => Arc::new(NoopSink),
        };
        let pacing = Pacing {
            workers: options.workers.unwrap_or(config.fetch.workers),
            delay: config.fetch.request_delay(),
        };
        if pacing.workers == 0 {
            return Err(ConfigError::ZeroLimit("workers"));
        }

        let build = |kind: SourceKind| -> Box<dyn SourceAdapter> {
            match kind {
                SourceKind::Feed => Box::new(FeedAdapter::new(
                    &config.feed.name,
                    &config.feed.url,
                    config.feed.timeout(&config.fetch),
                    Arc::clone(&fetcher),
                    Arc::clone(&sink),
                )),
                SourceKind::Listing => Box::new(
                    ListingAdapter::new(
                        &config.listing.name,
                        &config.listing.url,
                        config.listing.timeout(&config.fetch),
                        Arc::clone(&fetcher),
                        Arc::clone(&sink),
                    )
                    .with_known_categories(config.categories.clone()),
                ),
                SourceKind::Pages => Box::new(CategoryPagesAdapter::plain(
                    format!("pages-{edition_key}"),
                    edition.categories.clone(),
                    config.fetch.timeout(),
                    pacing,
                    Arc::clone(&fetcher),
                    Arc::clone(&sink),
                )),
                SourceKind::Rendered => Box::new(CategoryPagesAdapter::rendered(
                    format!("rendered-{edition_key}"),
                    edition.categories.clone(),
                    pacing,
                    Arc::clone(&fetcher),
                    Arc::clone(&sink),
                )),
            }
        };

        let kinds = match options.only {
            Some(kind) => vec![kind],
            None => {
                let mut kinds = Vec::new();
                if config.feed.enabled {
                    kinds.push(SourceKind::Feed);
                }
                if config.listing.enabled {
                    kinds.push(SourceKind::Listing);
                }
                kinds.push(if options.rendered {
                    SourceKind::Rendered
                } else {
                    SourceKind::Pages
                });
                kinds
            }
        };

        Ok(Self::new(
            kinds.into_iter().map(build).collect(),
            config.categories.clone(),
            options.deadline.unwrap_or_else(|| config.fetch.deadline()),
        ))
    }

    #[must_use]
    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    #[must_use]
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Every configured category.
    pub async fn run(&self) -> PipelineResult {
        self.drive(Scope::All).await
    }

    /// One category, with the same source priority as a full run.
    pub async fn run_category(&self, category: &str) -> PipelineResult {
        self.drive(Scope::One(category)).await
    }

    async fn drive(&self, scope: Scope<'_>) -> PipelineResult {
        let started = Instant::now();
        let deadline = tokio::time::Instant::now() + self.deadline;
        let requested: Vec<String> = match scope {
            Scope::All => self.categories.clone(),
            Scope::One(category) => vec![category.to_string()],
        };

        let mut run = PipelineRun::default();
        let mut records = Vec::new();

        for source in &self.sources {
            let name = source.name();
            info!(source = name, categories = requested.len(), "Trying source");

            let collector = BatchCollector::new(name);
            let work = async {
                match scope {
                    Scope::All => source.attempt_all(&requested, &collector).await,
                    Scope::One(category) => match source.attempt(category).await {
                        Ok(batch) => collector.record_batch(batch),
                        Err(failure) => collector.record_failure(category, &failure),
                    },
                }
            };

            if tokio::time::timeout_at(deadline, work).await.is_err() {
                warn!(source = name, deadline = ?self.deadline, "Run deadline reached");
                collector.fill_missing(&requested, &FetchError::DeadlineExceeded);
                run.deadline_hit = true;
            }

            let report = collector.finish();
            let normalized = normalize_batches(&report.batches);
            let failures = report.outcome.failure_count();
            run.sources.push(report.outcome);

            if !normalized.is_empty() {
                info!(source = name, records = normalized.len(), failures, "Source accepted");
                records = normalized;
                run.winner = Some(name.to_string());
                break;
            }

            warn!(source = name, failures, "Source produced no records");
            if run.deadline_hit {
                break;
            }
        }

        if records.is_empty() {
            warn!(
                sources = run.sources.len(),
                failures = run.failure_count(),
                "No rankings available this run"
            );
        }

        run.total_records = records.len();
        run.elapsed = started.elapsed();
        PipelineResult { records, run }
    }
}
