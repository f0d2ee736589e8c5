//! Source adapters: one ranking provider each, tried in trust order by the
//! orchestrator.
//!
//! | Kind | Adapter | Requests per run |
//! |------|---------|------------------|
//! | [`SourceKind::Feed`] | [`FeedAdapter`] | one JSON request |
//! | [`SourceKind::Listing`] | [`ListingAdapter`] | one aggregate page |
//! | [`SourceKind::Pages`] | [`CategoryPagesAdapter`] | one page per category |
//! | [`SourceKind::Rendered`] | [`CategoryPagesAdapter`] | one browser navigation per category |
//!
//! Adapters never return an error for the whole attempt. Every fetch problem
//! is recorded into the [`BatchCollector`] as data, next to the batches that
//! did succeed.

pub mod feed;
pub mod listing;
pub mod pages;

use std::fmt;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::{FailureRecord, FetchError, SourceFailure};
use crate::model::{CategoryOutcome, RawRow, RecordBatch, SourceOutcome};

pub use feed::FeedAdapter;
pub use listing::ListingAdapter;
pub use pages::CategoryPagesAdapter;

/// Which adapter family a source belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Feed,
    Listing,
    Pages,
    Rendered,
}

impl SourceKind {
    pub const ALL: [SourceKind; 4] = [
        SourceKind::Feed,
        SourceKind::Listing,
        SourceKind::Pages,
        SourceKind::Rendered,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Feed => "feed",
            SourceKind::Listing => "listing",
            SourceKind::Pages => "pages",
            SourceKind::Rendered => "rendered",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SourceKind::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown source {s:?} (expected feed, listing, pages or rendered)"))
    }
}

/// A ranking provider.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Stable name, used as record provenance and in diagnostics.
    fn name(&self) -> &str;

    fn kind(&self) -> SourceKind;

    /// Fetch and parse a single category.
    async fn attempt(&self, category: &str) -> Result<RecordBatch, SourceFailure>;

    /// Fetch every category, recording batches and failures as they
    /// complete so that work finished before a deadline is kept.
    async fn attempt_all(&self, categories: &[String], collector: &BatchCollector);
}

#[derive(Debug, Default)]
struct Collected {
    batches: Vec<RecordBatch>,
    categories: Vec<CategoryOutcome>,
    failure: Option<FailureRecord>,
}

/// Accumulates one source attempt's results.
///
/// Each batch comes from exactly one fetch and parse. Concurrent workers
/// hand their batches over here instead of appending to shared row lists.
#[derive(Debug)]
pub struct BatchCollector {
    source: String,
    inner: Mutex<Collected>,
}

/// What a source attempt produced.
#[derive(Debug)]
pub struct SourceReport {
    pub outcome: SourceOutcome,
    pub batches: Vec<RecordBatch>,
}

impl BatchCollector {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            inner: Mutex::new(Collected::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Collected> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn record_batch(&self, batch: RecordBatch) {
        let category = batch.category.clone().unwrap_or_default();
        debug!(
            source = %self.source,
            category = %category,
            rows = batch.len(),
            parser = ?batch.parser,
            "Batch collected"
        );

        let mut inner = self.lock();
        inner.categories.push(CategoryOutcome {
            category,
            records: batch.len(),
            parser: batch.parser,
            failure: None,
        });
        inner.batches.push(batch);
    }

    pub fn record_failure(&self, category: &str, failure: &SourceFailure) {
        warn!(
            source = %self.source,
            category,
            reason = failure.reason().as_str(),
            "Category failed: {failure}"
        );
        self.lock().categories.push(CategoryOutcome {
            category: category.to_string(),
            records: 0,
            parser: None,
            failure: Some(failure.into()),
        });
    }

    /// Failure that kept the whole source from producing per-category
    /// results.
    pub fn record_source_failure(&self, failure: &SourceFailure) {
        warn!(
            source = %self.source,
            reason = failure.reason().as_str(),
            "Source request failed: {failure}"
        );
        self.lock().failure = Some(failure.into());
    }

    /// Mark every category without an outcome as failed with `error`.
    pub fn fill_missing(&self, categories: &[String], error: &FetchError) {
        let mut inner = self.lock();
        for category in categories {
            if inner.categories.iter().any(|c| &c.category == category) {
                continue;
            }
            let failure = SourceFailure::new(self.source.clone(), error.clone());
            inner.categories.push(CategoryOutcome {
                category: category.clone(),
                records: 0,
                parser: None,
                failure: Some((&failure).into()),
            });
        }
    }

    pub fn finish(self) -> SourceReport {
        let collected = self.inner.into_inner().unwrap_or_else(PoisonError::into_inner);
        let records = collected.batches.iter().map(RecordBatch::len).sum();
        SourceReport {
            outcome: SourceOutcome {
                source: self.source,
                records,
                categories: collected.categories,
                failure: collected.failure,
            },
            batches: collected.batches,
        }
    }
}

/// Split rows from an aggregate response into one batch per requested
/// category, in request order. Rows for categories nobody asked for are
/// dropped.
pub(crate) fn split_by_category(
    source: &str,
    rows: Vec<RawRow>,
    categories: &[String],
) -> Vec<RecordBatch> {
    let mut grouped: Vec<Vec<RawRow>> = vec![Vec::new(); categories.len()];
    let mut unknown = 0usize;

    for row in rows {
        match categories.iter().position(|c| c == row.category.trim()) {
            Some(i) => grouped[i].push(row),
            None => unknown += 1,
        }
    }

    if unknown > 0 {
        debug!(source, rows = unknown, "Dropped rows outside the requested categories");
    }

    categories
        .iter()
        .zip(grouped)
        .map(|(category, rows)| RecordBatch::new(source, Some(category.clone()), rows))
        .collect()
}
