//! One ranking page per category, fetched plain or through the headless
//! browser.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use tracing::{debug, info, instrument};

use super::{BatchCollector, SourceAdapter, SourceKind};
use crate::debug_sink::DebugSink;
use crate::error::SourceFailure;
use crate::fetch::{FetchMode, Fetcher};
use crate::model::RecordBatch;
use crate::parse::{ParseContext, ParserCascade};

/// Pacing for per-category fetches.
#[derive(Debug, Clone, Copy)]
pub struct Pacing {
    /// Categories fetched at the same time.
    pub workers: usize,
    /// Pause each worker takes after its own fetch.
    pub delay: Duration,
}

pub struct CategoryPagesAdapter {
    name: String,
    kind: SourceKind,
    mode: FetchMode,
    pages: BTreeMap<String, String>,
    pacing: Pacing,
    fetcher: Arc<dyn Fetcher>,
    sink: Arc<dyn DebugSink>,
    cascade: ParserCascade,
}

impl CategoryPagesAdapter {
    /// Plain HTTP variant.
    pub fn plain(
        name: impl Into<String>,
        pages: BTreeMap<String, String>,
        timeout: Duration,
        pacing: Pacing,
        fetcher: Arc<dyn Fetcher>,
        sink: Arc<dyn DebugSink>,
    ) -> Self {
        Self::build(name, SourceKind::Pages, FetchMode::Plain { timeout }, pages, pacing, fetcher, sink)
    }

    /// Headless-browser variant; slower and heavier, only used when the
    /// operator asks for it.
    pub fn rendered(
        name: impl Into<String>,
        pages: BTreeMap<String, String>,
        pacing: Pacing,
        fetcher: Arc<dyn Fetcher>,
        sink: Arc<dyn DebugSink>,
    ) -> Self {
        Self::build(name, SourceKind::Rendered, FetchMode::Rendered, pages, pacing, fetcher, sink)
    }

    fn build(
        name: impl Into<String>,
        kind: SourceKind,
        mode: FetchMode,
        pages: BTreeMap<String, String>,
        pacing: Pacing,
        fetcher: Arc<dyn Fetcher>,
        sink: Arc<dyn DebugSink>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            mode,
            pages,
            pacing: Pacing {
                workers: pacing.workers.max(1),
                delay: pacing.delay,
            },
            fetcher,
            sink,
            cascade: ParserCascade::per_category(),
        }
    }

    #[must_use]
    pub fn page_url(&self, category: &str) -> Option<&str> {
        self.pages.get(category).map(String::as_str)
    }
}

#[async_trait]
impl SourceAdapter for CategoryPagesAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> SourceKind {
        self.kind
    }

    #[instrument(skip(self), fields(source = %self.name))]
    async fn attempt(&self, category: &str) -> Result<RecordBatch, SourceFailure> {
        let Some(url) = self.page_url(category) else {
            debug!("No page configured for this category");
            return Ok(RecordBatch::empty(&self.name, Some(category.to_string())));
        };

        let content = self.fetcher.fetch(url, self.mode).await?;
        let outcome = self
            .cascade
            .run(&content, &ParseContext::new(&self.name, Some(category)));

        if outcome.rows.is_empty() {
            info!(url, "No parser recognised the page");
            self.sink.capture(&self.name, category, "html", &content.body);
        } else {
            info!(rows = outcome.rows.len(), parser = ?outcome.parser, "Category parsed");
        }

        Ok(RecordBatch::new(&self.name, Some(category.to_string()), outcome.rows))
    }

    async fn attempt_all(&self, categories: &[String], collector: &BatchCollector) {
        info!(
            source = %self.name,
            categories = categories.len(),
            workers = self.pacing.workers,
            rendered = self.mode.is_rendered(),
            "Fetching category pages"
        );

        stream::iter(categories)
            .for_each_concurrent(self.pacing.workers, |category| async move {
                match self.attempt(category).await {
                    Ok(batch) => collector.record_batch(batch),
                    Err(failure) => collector.record_failure(category, &failure),
                }
                tokio::time::sleep(self.pacing.delay).await;
            })
            .await;

        self.fetcher.release();
    }
}
