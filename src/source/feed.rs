//! JSON ranking feed: every category from a single request.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, instrument};

use super::{split_by_category, BatchCollector, SourceAdapter, SourceKind};
use crate::debug_sink::DebugSink;
use crate::error::{FetchError, SourceFailure};
use crate::fetch::{FetchMode, Fetcher};
use crate::model::{RawRow, RecordBatch};
use crate::parse::structured::extract_feed;

pub struct FeedAdapter {
    name: String,
    url: String,
    timeout: Duration,
    fetcher: Arc<dyn Fetcher>,
    sink: Arc<dyn DebugSink>,
}

impl FeedAdapter {
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
        }
    }

    /// Fetch and decode the feed. A body that is not JSON is a failure; JSON
    /// without rankings is an empty success.
    #[instrument(skip(self), fields(source = %self.name))]
    async fn fetch_rows(&self) -> Result<Vec<RawRow>, SourceFailure> {
        let content = self
            .fetcher
            .fetch(&self.url, FetchMode::Plain { timeout: self.timeout })
            .await?;

        let payload: serde_json::Value = serde_json::from_str(&content.body)
            .map_err(|e| SourceFailure::new(&self.url, FetchError::Unparseable(e.to_string())))?;

        let rows = extract_feed(&payload, &self.name);
        if rows.is_empty() {
            info!(url = %self.url, "Feed decoded but carried no rankings");
            self.sink.capture(&self.name, "feed", "json", &content.body);
        } else {
            info!(rows = rows.len(), "Feed rankings received");
        }
        Ok(rows)
    }
}

#[async_trait]
impl SourceAdapter for FeedAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Feed
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debug_sink::{FileDebugSink, NoopSink};
    use crate::fetch::testing::ScriptedFetcher;

    const URL: &str = "https://api.example.com/rankings";

    const PAYLOAD: &str = r#"{"body": {"data": {"sub_rankings": [
        {"title": "125 lbs", "rankings": [
            {"rank": 1, "name": "Vincent Robinson", "school": "NC State"},
            {"rank": 2, "name": "Luke Lilledahl", "school": "Penn State"}
        ]},
        {"title": "133 lbs", "rankings": [
            {"rank": 1, "name": "Lucas Byrd", "school": "Illinois"}
        ]},
        {"title": "Heavyweight Extras", "rankings": [
            {"rank": 1, "name": "Not A Weight", "school": "Nowhere"}
        ]}
    ]}}}"#;

    fn adapter(fetcher: ScriptedFetcher) -> (FeedAdapter, Arc<ScriptedFetcher>) {
        let fetcher = Arc::new(fetcher);
        let adapter = FeedAdapter::new(
            "feed",
            URL,
            Duration::from_secs(10),
            fetcher.clone(),
            Arc::new(NoopSink),
        );
        (adapter, fetcher)
    }

    fn categories() -> Vec<String> {
        vec!["125".into(), "133".into(), "141".into()]
    }

    #[tokio::test]
    async fn one_request_covers_every_category() {
        let (adapter, fetcher) = adapter(ScriptedFetcher::new().page(URL, PAYLOAD));
        let collector = BatchCollector::new("feed");
        adapter.attempt_all(&categories(), &collector).await;

        let report = collector.finish();
        assert_eq!(fetcher.call_count(), 1);
        assert_eq!(report.outcome.records, 3);
        let counts: Vec<_> = report.outcome.categories.iter().map(|c| c.records).collect();
        assert_eq!(counts, vec![2, 1, 0]);
        assert_eq!(report.outcome.failure_count(), 0);
    }

    #[tokio::test]
    async fn single_category_is_filtered() {
        let (adapter, _) = adapter(ScriptedFetcher::new().page(URL, PAYLOAD));
        let batch = adapter.attempt("133").await.unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.rows[0].name, "Lucas Byrd");
        assert_eq!(batch.origin, "feed");
    }

    #[tokio::test]
    async fn request_failure_is_recorded_not_raised() {
        let (adapter, _) = adapter(
            ScriptedFetcher::new().failing(URL, FetchError::Timeout(Duration::from_secs(10))),
        );
        let collector = BatchCollector::new("feed");
        adapter.attempt_all(&categories(), &collector).await;

        let report = collector.finish();
        assert_eq!(report.outcome.records, 0);
        let failure = report.outcome.failure.unwrap();
        assert_eq!(failure.reason, crate::error::FailureReason::Timeout);
        assert_eq!(failure.url, URL);
    }

    #[tokio::test]
    async fn non_json_body_is_unparseable() {
        let (adapter, _) = adapter(ScriptedFetcher::new().page(URL, "<html>maintenance</html>"));
        let failure = adapter.attempt("125").await.unwrap_err();
        assert!(matches!(failure.error, FetchError::Unparseable(_)));
    }

    #[tokio::test]
    async fn empty_feed_is_captured_for_inspection() {
        let dir = tempfile::tempdir().unwrap();
        let sink = Arc::new(FileDebugSink::new(dir.path()));
        let adapter = FeedAdapter::new(
            "feed",
            URL,
            Duration::from_secs(10),
            Arc::new(ScriptedFetcher::new().page(URL, r#"{"body": {"data": {}}}"#)),
            sink.clone(),
        );

        let batch = adapter.attempt("125").await.unwrap();
        assert!(batch.is_empty());
        assert!(sink.artifact_path("feed", "feed", "json").exists());
    }
}
