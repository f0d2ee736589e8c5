//! Records flowing through the pipeline.
//!
//! Parsers emit [`RawRow`]s grouped into [`RecordBatch`]es; the normalizer
//! turns the winning source's batches into [`Wrestler`]s; [`PipelineRun`]
//! carries the diagnostics for one invocation.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::FailureRecord;

/// Which extraction strategy produced a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParserKind {
    /// JSON-LD item lists or the structured feed payload.
    StructuredData,
    /// JSON fragments inside inline scripts.
    EmbeddedScript,
    /// Fixed column positions of a ranking table.
    PositionalTable,
    /// Text patterns over class-name-matched elements.
    HeuristicText,
}

impl ParserKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ParserKind::StructuredData => "structured-data",
            ParserKind::EmbeddedScript => "embedded-script",
            ParserKind::PositionalTable => "positional-table",
            ParserKind::HeuristicText => "heuristic-text",
        }
    }
}

/// Provenance of a raw row: the adapter that fetched it and the parser that
/// extracted it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowOrigin {
    pub source: String,
    pub parser: ParserKind,
}

/// An unvalidated extraction from one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    /// Rank as it appeared in the source; may be non-numeric.
    pub rank_text: String,
    pub name: String,
    pub school: String,
    pub category: String,
    pub origin: RowOrigin,
    pub grade: Option<String>,
    pub previous_rank: Option<String>,
}

impl RawRow {
    pub fn new(
        rank_text: impl Into<String>,
        name: impl Into<String>,
        school: impl Into<String>,
        category: impl Into<String>,
        origin: RowOrigin,
    ) -> Self {
        Self {
            rank_text: rank_text.into(),
            name: name.into(),
            school: school.into(),
            category: category.into(),
            origin,
            grade: None,
            previous_rank: None,
        }
    }

    #[must_use]
    pub fn with_grade(mut self, grade: Option<String>) -> Self {
        self.grade = grade.filter(|g| !g.trim().is_empty());
        self
    }

    #[must_use]
    pub fn with_previous_rank(mut self, previous: Option<String>) -> Self {
        self.previous_rank = previous.filter(|p| !p.trim().is_empty());
        self
    }
}

/// Rows produced by one adapter attempt for one category.
///
/// An empty batch is a successful fetch that had nothing to extract, which is
/// different from a [`crate::error::SourceFailure`].
#[derive(Debug, Clone)]
pub struct RecordBatch {
    pub origin: String,
    pub category: Option<String>,
    pub fetched_at: DateTime<Utc>,
    pub parser: Option<ParserKind>,
    pub rows: Vec<RawRow>,
}

impl RecordBatch {
    pub fn new(origin: impl Into<String>, category: Option<String>, rows: Vec<RawRow>) -> Self {
        Self {
            origin: origin.into(),
            category,
            fetched_at: Utc::now(),
            parser: rows.first().map(|r| r.origin.parser),
            rows,
        }
    }

    pub fn empty(origin: impl Into<String>, category: Option<String>) -> Self {
        Self::new(origin, category, Vec::new())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Canonical ranking record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wrestler {
    pub rank: u32,
    pub name: String,
    pub school: String,
    /// Ranking bucket (weight class).
    #[serde(rename = "weight_class")]
    pub category: String,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_rank: Option<String>,
}

/// Outcome of one category within one source attempt.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryOutcome {
    pub category: String,
    pub records: usize,
    pub parser: Option<ParserKind>,
    pub failure: Option<FailureRecord>,
}

/// Outcome of one source attempt.
#[derive(Debug, Clone, Serialize)]
pub struct SourceOutcome {
    pub source: String,
    pub records: usize,
    pub categories: Vec<CategoryOutcome>,
    /// Failure that prevented the source from producing anything per
    /// category (e.g. the single feed request failed).
    pub failure: Option<FailureRecord>,
}

impl SourceOutcome {
    #[must_use]
    pub fn category_failures(&self) -> usize {
        self.categories.iter().filter(|c| c.failure.is_some()).count()
    }

    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.category_failures() + usize::from(self.failure.is_some())
    }
}

/// Diagnostics for one pipeline invocation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineRun {
    pub sources: Vec<SourceOutcome>,
    /// Source whose records were accepted, if any.
    pub winner: Option<String>,
    #[serde(with = "duration_ms")]
    pub elapsed: Duration,
    pub total_records: usize,
    pub deadline_hit: bool,
}

impl PipelineRun {
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.sources.iter().map(SourceOutcome::failure_count).sum()
    }

    #[must_use]
    pub fn category_failures(&self) -> usize {
        self.sources.iter().map(SourceOutcome::category_failures).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total_records == 0
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::Serializer;

    #[allow(clippy::trivially_copy_pass_by_ref)]
    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FetchError, SourceFailure};

    fn origin() -> RowOrigin {
        RowOrigin {
            source: "pages".into(),
            parser: ParserKind::PositionalTable,
        }
    }

    #[test]
    fn batch_records_parser_of_first_row() {
        let batch = RecordBatch::new(
            "pages",
            Some("125".into()),
            vec![RawRow::new("1", "A", "B", "125", origin())],
        );
        assert_eq!(batch.parser, Some(ParserKind::PositionalTable));
        assert_eq!(batch.len(), 1);
        assert!(RecordBatch::empty("pages", None).is_empty());
    }

    #[test]
    fn blank_extras_are_dropped() {
        let row = RawRow::new("1", "A", "B", "125", origin())
            .with_grade(Some("  ".into()))
            .with_previous_rank(Some("3".into()));
        assert_eq!(row.grade, None);
        assert_eq!(row.previous_rank.as_deref(), Some("3"));
    }

    #[test]
    fn run_counts_source_and_category_failures() {
        let failure = SourceFailure::new("u", FetchError::Status(500));
        let run = PipelineRun {
            sources: vec![
                SourceOutcome {
                    source: "feed".into(),
                    records: 0,
                    categories: vec![],
                    failure: Some((&failure).into()),
                },
                SourceOutcome {
                    source: "pages".into(),
                    records: 3,
                    categories: vec![
                        CategoryOutcome {
                            category: "125".into(),
                            records: 0,
                            parser: None,
                            failure: Some((&failure).into()),
                        },
                        CategoryOutcome {
                            category: "133".into(),
                            records: 3,
                            parser: Some(ParserKind::HeuristicText),
                            failure: None,
                        },
                    ],
                    failure: None,
                },
            ],
            ..PipelineRun::default()
        };
        assert_eq!(run.failure_count(), 2);
        assert_eq!(run.category_failures(), 1);
    }

    #[test]
    fn wrestler_serializes_category_as_weight_class() {
        let w = Wrestler {
            rank: 1,
            name: "Vincent Robinson".into(),
            school: "NC State".into(),
            category: "125".into(),
            source: "flowrestling-pages".into(),
            grade: None,
            previous_rank: None,
        };
        let json = serde_json::to_value(&w).unwrap();
        assert_eq!(json["weight_class"], "125");
        assert!(json.get("grade").is_none());
    }
}
