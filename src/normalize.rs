//! Raw rows to canonical [`Wrestler`] records.
//!
//! Applied once, to the winning source's batches:
//!
//! 1. trim and collapse whitespace in every string field
//! 2. parse the rank; an unparseable rank becomes the row's 1-based position
//!    among rows of its category seen so far
//! 3. drop rows whose name or school is empty
//! 4. stable sort by `(category, rank)`, numeric categories first
//! 5. keep the first record for each `(category, rank)`
//!
//! Casing is left as the source wrote it, so a duplicate that differs only in
//! case keeps the first-seen spelling. The function is pure and idempotent.

use std::cmp::Ordering;
use std::collections::HashMap;

use tracing::debug;

use crate::model::{RawRow, RecordBatch, Wrestler};

/// Normalize rows in processing order.
pub fn normalize<'a>(rows: impl IntoIterator<Item = &'a RawRow>) -> Vec<Wrestler> {
    let mut seen_per_category: HashMap<String, u32> = HashMap::new();
    let mut dropped = 0usize;
    let mut records = Vec::new();

    for row in rows {
        let category = clean(&row.category);
        let position = seen_per_category.entry(category.clone()).or_insert(0);
        *position += 1;

        let name = clean(&row.name);
        let school = clean(&row.school);
        if name.is_empty() || school.is_empty() {
            dropped += 1;
            continue;
        }

        records.push(Wrestler {
            rank: parse_rank(&row.rank_text).unwrap_or(*position),
            name,
            school,
            category,
            source: clean(&row.origin.source),
            grade: row.grade.as_deref().map(clean).filter(|g| !g.is_empty()),
            previous_rank: row.previous_rank.as_deref().map(clean).filter(|p| !p.is_empty()),
        });
    }

    records.sort_by(|a, b| {
        compare_categories(&a.category, &b.category).then(a.rank.cmp(&b.rank))
    });

    let before = records.len();
    records.dedup_by(|later, first| later.category == first.category && later.rank == first.rank);

    debug!(
        kept = records.len(),
        dropped_empty = dropped,
        duplicates = before - records.len(),
        "Normalized rows"
    );
    records
}

/// Normalize every row of `batches`, in batch order.
pub fn normalize_batches(batches: &[RecordBatch]) -> Vec<Wrestler> {
    normalize(batches.iter().flat_map(|b| b.rows.iter()))
}

/// Leading digits as a positive rank, e.g. `"3"`, `" 12."`, `"4T"`.
#[must_use]
pub fn parse_rank(text: &str) -> Option<u32> {
    let trimmed = text.trim();
    let end = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    trimmed[..end].parse::<u32>().ok().filter(|r| *r > 0)
}

/// Numeric categories in numeric order, then the rest alphabetically.
///
/// Distinct spellings of the same number (`"125"`, `"0125"`) never compare
/// equal, so rows of one category string stay contiguous after sorting.
#[must_use]
pub fn compare_categories(a: &str, b: &str) -> Ordering {
    match (a.parse::<u32>(), b.parse::<u32>()) {
        (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

fn clean(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ParserKind, RowOrigin};

    fn row(rank: &str, name: &str, school: &str, category: &str) -> RawRow {
        RawRow::new(
            rank,
            name,
            school,
            category,
            RowOrigin {
                source: "pages".into(),
                parser: ParserKind::PositionalTable,
            },
        )
    }

    fn as_rows(records: &[Wrestler]) -> Vec<RawRow> {
        records
            .iter()
            .map(|w| {
                RawRow::new(
                    w.rank.to_string(),
                    w.name.clone(),
                    w.school.clone(),
                    w.category.clone(),
                    RowOrigin {
                        source: w.source.clone(),
                        parser: ParserKind::StructuredData,
                    },
                )
                .with_grade(w.grade.clone())
                .with_previous_rank(w.previous_rank.clone())
            })
            .collect()
    }

    #[test]
    fn case_varying_duplicate_keeps_first_casing() {
        let rows = vec![
            row("1", "john smith", "state U", "184"),
            row("1", "JOHN SMITH", "State U", "184"),
        ];
        let out = normalize(&rows);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].name, "john smith");
        assert_eq!(out[0].school, "state U");
        assert_eq!(out[0].rank, 1);
    }

    #[test]
    fn unparseable_ranks_follow_encounter_order() {
        let rows = vec![
            row("N/A", "Alice", "SchoolA", "133"),
            row("N/A", "Bob", "SchoolB", "133"),
            row("N/A", "Cara", "SchoolC", "133"),
        ];
        let out = normalize(&rows);
        let ranks: Vec<_> = out.iter().map(|w| (w.rank, w.name.as_str())).collect();
        assert_eq!(ranks, vec![(1, "Alice"), (2, "Bob"), (3, "Cara")]);
    }

    #[test]
    fn positional_fallback_is_counted_per_category() {
        let rows = vec![
            row("-", "A", "S", "125"),
            row("-", "B", "S", "133"),
            row("", "C", "S", "125"),
        ];
        let out = normalize(&rows);
        assert_eq!(out[0].category, "125");
        assert_eq!(out[0].rank, 1);
        assert_eq!(out[1].rank, 2);
        assert_eq!(out[1].name, "C");
        assert_eq!(out[2].category, "133");
        assert_eq!(out[2].rank, 1);
    }

    #[test]
    fn drops_rows_with_empty_name_or_school() {
        let rows = vec![
            row("1", "   ", "Iowa", "125"),
            row("2", "Person", "\t", "125"),
            row("3", "Kept Person", "Iowa", "125"),
        ];
        let out = normalize(&rows);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].rank, 3);
    }

    #[test]
    fn trims_and_collapses_whitespace() {
        let rows = vec![row(" 2 ", "  Vincent \n Robinson ", " NC   State", " 125 ")
            .with_grade(Some(" SO ".into()))];
        let out = normalize(&rows);
        assert_eq!(out[0].name, "Vincent Robinson");
        assert_eq!(out[0].school, "NC State");
        assert_eq!(out[0].category, "125");
        assert_eq!(out[0].grade.as_deref(), Some("SO"));
        assert_eq!(out[0].source, "pages");
    }

    #[test]
    fn sorts_by_category_then_rank() {
        let rows = vec![
            row("2", "B", "S", "285"),
            row("1", "C", "S", "97"),
            row("3", "D", "S", "unknown"),
            row("1", "A", "S", "285"),
        ];
        let out = normalize(&rows);
        let keys: Vec<_> = out.iter().map(|w| (w.category.as_str(), w.rank)).collect();
        assert_eq!(keys, vec![("97", 1), ("285", 1), ("285", 2), ("unknown", 3)]);
    }

    #[test]
    fn at_most_one_record_per_category_and_rank() {
        let rows = vec![
            row("1", "First", "S", "149"),
            row("1", "Second", "S", "149"),
            row("2", "Third", "S", "149"),
            row("1", "Other Weight", "S", "157"),
        ];
        let out = normalize(&rows);
        let mut keys: Vec<_> = out.iter().map(|w| (w.category.clone(), w.rank)).collect();
        let total = keys.len();
        keys.dedup();
        assert_eq!(keys.len(), total);
        assert_eq!(out[0].name, "First");
    }

    #[test]
    fn same_number_spelled_differently_does_not_split_duplicates() {
        let rows = vec![
            row("1", "A", "S", "125"),
            row("1", "B", "S", "+125"),
            row("1", "C", "S", "125"),
        ];
        let out = normalize(&rows);
        let keys: Vec<_> = out
            .iter()
            .map(|w| (w.category.as_str(), w.rank, w.name.as_str()))
            .collect();
        assert_eq!(keys, vec![("+125", 1, "B"), ("125", 1, "A")]);
        assert_eq!(compare_categories("125", "0125"), Ordering::Greater);
        assert_eq!(compare_categories("125", "133"), Ordering::Less);
    }

    #[test]
    fn normalizing_twice_changes_nothing() {
        let rows = vec![
            row("N/A", "  zed  ", "Y", "174"),
            row("3", "Carter Starocci", "Penn State", "174"),
            row("1", "Dup", "X", "165"),
            row("1", "dup", "x", "165"),
            row("", "", "Empty", "165"),
            row("2", "Keckeisen", "UNI", "184").with_previous_rank(Some("4".into())),
        ];
        let once = normalize(&rows);
        let twice = normalize(&as_rows(&once));
        assert_eq!(once, twice);
    }

    #[test]
    fn batches_are_read_in_order() {
        let first = RecordBatch::new("pages", Some("125".into()), vec![row("1", "Early", "S", "125")]);
        let second = RecordBatch::new("pages", Some("125".into()), vec![row("1", "Late", "S", "125")]);
        let out = normalize_batches(&[first, second]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].name, "Early");
    }

    #[test]
    fn rank_parsing() {
        assert_eq!(parse_rank("3"), Some(3));
        assert_eq!(parse_rank(" 12."), Some(12));
        assert_eq!(parse_rank("4T"), Some(4));
        assert_eq!(parse_rank("0"), None);
        assert_eq!(parse_rank("N/A"), None);
        assert_eq!(parse_rank(""), None);
    }
}
