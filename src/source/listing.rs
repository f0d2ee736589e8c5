//! Aggregate listing page: one HTML page with a table per category or a
//! single table with a weight column.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, instrument};

use super::{split_by_category, BatchCollector, SourceAdapter, SourceKind};
use crate::debug_sink::DebugSink;
use crate::error::SourceFailure;
use crate::fetch::{FetchMode, Fetcher};
use crate::model::{RawRow, RecordBatch};
use crate::parse::{ParseContext, ParserCascade};

pub struct ListingAdapter {
    name: String,
    url: String,
    timeout: Duration,
    fetcher: Arc<dyn Fetcher>,
    sink: Arc<dyn DebugSink>,
    cascade: ParserCascade,
    /// Categories the page's headings may name.
    known_categories: Vec<String>,
}

impl ListingAdapter {
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        timeout: Duration,
        fetcher: Arc<dyn Fetcher>,
        sink: Arc<dyn DebugSink>,
    ) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            timeout,
            fetcher,
            sink,
            cascade: ParserCascade::listing(),
            known_categories: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_known_categories(mut self, categories: Vec<String>) -> Self {
        self.known_categories = categories;
        self
    }

    #[instrument(skip(self), fields(source = %self.name))]
    async fn fetch_rows(&self) -> Result<Vec<RawRow>, SourceFailure> {
        let content = self
            .fetcher
            .fetch(&self.url, FetchMode::Plain { timeout: self.timeout })
            .await?;

        let ctx = ParseContext::new(&self.name, None).with_known_categories(&self.known_categories);
        let outcome = self.cascade.run(&content, &ctx);
        if outcome.rows.is_empty() {
            info!(url = %self.url, "Listing page had no ranking rows");
            self.sink.capture(&self.name, "listing", "html", &content.body);
        } else {
            info!(rows = outcome.rows.len(), parser = ?outcome.parser, "Listing rows extracted");
        }
        Ok(outcome.rows)
    }
}

#[async_trait]
impl SourceAdapter for ListingAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Listing
    }

    async fn attempt(&self, category: &str) -> Result<RecordBatch, SourceFailure> {
        let rows = self.fetch_rows().await?;
        let wanted = [category.to_string()];
        Ok(split_by_category(&self.name, rows, &wanted)
            .pop()
            .unwrap_or_else(|| RecordBatch::empty(&self.name, Some(category.to_string()))))
    }

    async fn attempt_all(&self, categories: &[String], collector: &BatchCollector) {
        match self.fetch_rows().await {
            Ok(rows) => {
                for batch in split_by_category(&self.name, rows, categories) {
                    collector.record_batch(batch);
                }
            }
            Err(failure) => collector.record_source_failure(&failure),
        }
    }
}
