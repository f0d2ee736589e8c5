//! Structured data: JSON-LD item lists in pages and the ranking feed payload.

use std::sync::LazyLock;

use scraper::Selector;
use serde_json::Value;
use tracing::debug;

use super::{leading_number, CategoryParser, Page, ParseContext};
use crate::model::{ParserKind, RawRow, RowOrigin};

static LD_JSON: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"script[type="application/ld+json"]"#).expect("static selector")
});

/// Reads `itemListElement` entries from JSON-LD blocks.
///
/// An entry needs a position, a name and an affiliation. Blocks that do not decode are
/// skipped; other blocks on the page are still read.
pub struct StructuredDataParser;

impl CategoryParser for StructuredDataParser {
    fn kind(&self) -> ParserKind {
        ParserKind::StructuredData
    }

    fn matches(&self, page: &Page<'_>) -> bool {
        page.document.select(&LD_JSON).next().is_some()
    }

    fn extract(&self, page: &Page<'_>, ctx: &ParseContext<'_>) -> Vec<RawRow> {
        let category = ctx.category.unwrap_or_default();
        let mut rows = Vec::new();

        for script in page.document.select(&LD_JSON) {
            let text = script.text().collect::<String>();
            let value: Value = match serde_json::from_str(text.trim()) {
                Ok(v) => v,
                Err(e) => {
                    debug!(url = %page.raw.url, "Skipping undecodable JSON-LD block: {e}");
                    continue;
                }
            };

            for list in item_lists(&value) {
                rows.extend(
                    list.iter()
                        .filter_map(|item| list_item_row(item, category, ctx)),
                );
            }
        }

        rows
    }
}

/// Every `itemListElement` array reachable from a JSON-LD document, whether
/// the document is a single object, an array of objects or an `@graph`.
fn item_lists(value: &Value) -> Vec<&Vec<Value>> {
    match value {
        Value::Array(items) => items.iter().flat_map(item_lists).collect(),
        Value::Object(map) => {
            let mut lists = Vec::new();
            if let Some(list) = map.get("itemListElement").and_then(Value::as_array) {
                lists.push(list);
            }
            if let Some(graph) = map.get("@graph") {
                lists.extend(item_lists(graph));
            }
            lists
        }
        _ => Vec::new(),
    }
}

fn list_item_row(item: &Value, category: &str, ctx: &ParseContext<'_>) -> Option<RawRow> {
    let position = item.get("position").and_then(scalar_text)?;
    let inner = item.get("item");

    let name = item
        .get("name")
        .and_then(scalar_text)
        .or_else(|| inner.and_then(|i| i.get("name")).and_then(scalar_text))?;

    let school = item
        .get("affiliation")
        .or_else(|| inner.and_then(|i| i.get("affiliation")))
        .and_then(named_text)?;

    Some(RawRow::new(
        position,
        name,
        school,
        category,
        ctx.origin(ParserKind::StructuredData),
    ))
}

/// Rows from the decoded ranking feed.
///
/// The feed nests ranking groups under `body.data.rankings` and/or
/// `body.data.sub_rankings`; each group looks like
/// `{"title": "125 lbs", "rankings": [athlete, ...]}`. A group's category is
/// the leading number of its title, or its `weight_class` field.
/// Athletes without a name or school are skipped. Athletes without a known
/// category get an empty one and are left for the caller to filter.
#[must_use]
pub fn extract_feed(payload: &Value, source: &str) -> Vec<RawRow> {
    let Some(data) = payload.pointer("/body/data") else {
        return Vec::new();
    };

    let origin = RowOrigin {
        source: source.to_string(),
        parser: ParserKind::StructuredData,
    };

    let mut rows = Vec::new();
    for key in ["rankings", "sub_rankings"] {
        let Some(groups) = data.get(key).and_then(Value::as_array) else {
            continue;
        };

        for group in groups {
            let group_category = group_category(group);
            match group.get("rankings").and_then(Value::as_array) {
                Some(athletes) => rows.extend(
                    athletes
                        .iter()
                        .filter_map(|a| feed_row(a, group_category.as_deref(), &origin)),
                ),
                // A flat entry is itself an athlete carrying its own weight.
                None => rows.extend(feed_row(group, None, &origin)),
            }
        }
    }

    rows
}

fn group_category(group: &Value) -> Option<String> {
    group
        .get("title")
        .and_then(Value::as_str)
        .and_then(leading_number)
        .map(str::to_string)
        .or_else(|| group.get("weight_class").and_then(scalar_text))
}

fn feed_row(athlete: &Value, category: Option<&str>, origin: &RowOrigin) -> Option<RawRow> {
    if !athlete.is_object() {
        return None;
    }
    let field = |keys: &[&str]| keys.iter().find_map(|k| athlete.get(*k).and_then(scalar_text));

    let rank = field(&["rank", "position"]).unwrap_or_default();
    let name = field(&["name", "athlete_name"]).unwrap_or_else(|| {
        let first = field(&["first_name"]).unwrap_or_default();
        let last = field(&["last_name"]).unwrap_or_default();
        format!("{first} {last}").trim().to_string()
    });
    let school = field(&["school", "team", "school_name"])?;
    if name.is_empty() {
        return None;
    }
    let category = category
        .map(str::to_string)
        .or_else(|| {
            field(&["weight_class", "weight"])
                .map(|w| leading_number(&w).map_or(w.clone(), str::to_string))
        })
        .unwrap_or_default();

    Some(
        RawRow::new(rank, name, school, category, origin.clone())
            .with_grade(field(&["grade", "class_year"]))
            .with_previous_rank(field(&["previous_rank", "previous"])),
    )
}

/// String or number as trimmed text; anything else is `None`.
fn scalar_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// Plain text, or the `name` of a schema.org object such as an organization.
fn named_text(value: &Value) -> Option<String> {
    scalar_text(value).or_else(|| value.get("name").and_then(scalar_text))
}
