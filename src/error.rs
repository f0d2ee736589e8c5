//! Error types for the ingestion pipeline.
//!
//! Fetch problems never escape a source adapter as `Err`: they are wrapped in
//! a [`SourceFailure`] and recorded in the run diagnostics. The only error the
//! operator sees as a hard failure is [`ConfigError`], raised before any
//! network activity.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

/// Why a single URL could not be turned into usable content.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("rendered fetch unavailable: {0}")]
    RenderUnavailable(String),

    #[error("unparseable content: {0}")]
    Unparseable(String),

    #[error("run deadline exceeded")]
    DeadlineExceeded,
}

impl FetchError {
    /// Diagnostic tag for this error.
    #[must_use]
    pub fn reason(&self) -> FailureReason {
        match self {
            FetchError::Network(_) => FailureReason::Network,
            FetchError::Timeout(_) => FailureReason::Timeout,
            FetchError::Status(_) => FailureReason::Status,
            FetchError::Navigation(_) => FailureReason::Navigation,
            FetchError::RenderUnavailable(_) => FailureReason::RenderUnavailable,
            FetchError::Unparseable(_) => FailureReason::Unparseable,
            FetchError::DeadlineExceeded => FailureReason::Deadline,
        }
    }
}

/// Tag used in run summaries so callers can report a cause without
/// inspecting raw content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    Network,
    Timeout,
    Status,
    Navigation,
    RenderUnavailable,
    Unparseable,
    Deadline,
}

impl FailureReason {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::Network => "network",
            FailureReason::Timeout => "timeout",
            FailureReason::Status => "status",
            FailureReason::Navigation => "navigation",
            FailureReason::RenderUnavailable => "render-unavailable",
            FailureReason::Unparseable => "unparseable",
            FailureReason::Deadline => "deadline",
        }
    }
}

/// A failed fetch (or undecodable payload) for one URL.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{url}: {error}")]
pub struct SourceFailure {
    pub url: String,
    #[source]
    pub error: FetchError,
}

impl SourceFailure {
    pub fn new(url: impl Into<String>, error: FetchError) -> Self {
        Self {
            url: url.into(),
            error,
        }
    }

    #[must_use]
    pub fn reason(&self) -> FailureReason {
        self.error.reason()
    }
}

/// Serializable snapshot of a [`SourceFailure`] for run diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureRecord {
    pub reason: FailureReason,
    pub url: String,
    pub detail: String,
}

impl From<&SourceFailure> for FailureRecord {
    fn from(failure: &SourceFailure) -> Self {
        Self {
            reason: failure.reason(),
            url: failure.url.clone(),
            detail: failure.error.to_string(),
        }
    }
}

/// Configuration problems detected before the pipeline touches the network.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("no categories configured")]
    NoCategories,

    #[error("category {0:?} is listed more than once")]
    DuplicateCategory(String),

    #[error("edition {edition:?} maps unknown category {category:?}")]
    UnknownCategory { edition: String, category: String },

    #[error("unknown edition {0:?}")]
    UnknownEdition(String),

    #[error("invalid URL for {field}: {url:?} ({reason})")]
    InvalidUrl {
        field: String,
        url: String,
        reason: String,
    },

    #[error("{0} must be at least 1")]
    ZeroLimit(&'static str),

    #[error("failed to set up HTTP client: {0}")]
    Client(#[source] FetchError),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML in {path}: {source}")]
    Toml {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_fetch_error_has_a_distinct_reason() {
        let errors = [
            FetchError::Network("refused".into()),
            FetchError::Timeout(Duration::from_secs(15)),
            FetchError::Status(503),
            FetchError::Navigation("net::ERR_NAME_NOT_RESOLVED".into()),
            FetchError::RenderUnavailable("no chrome".into()),
            FetchError::Unparseable("expected value".into()),
            FetchError::DeadlineExceeded,
        ];
        let reasons: std::collections::HashSet<_> = errors.iter().map(FetchError::reason).collect();
        assert_eq!(reasons.len(), errors.len());
    }

    #[test]
    fn failure_record_keeps_url_and_detail() {
        let failure = SourceFailure::new("https://example.com/125", FetchError::Status(404));
        let record = FailureRecord::from(&failure);
        assert_eq!(record.reason, FailureReason::Status);
        assert_eq!(record.url, "https://example.com/125");
        assert!(record.detail.contains("404"));
        assert_eq!(failure.to_string(), "https://example.com/125: unexpected HTTP status 404");
    }
}
