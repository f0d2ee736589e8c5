//! Athlete objects embedded in inline scripts.
//!
//! Ranking pages built by client-side frameworks often ship their data as
//! object literals inside `<script>` tags. Only flat objects with a `"name"`
//! key are read; nested state trees are out of reach of this parser and left
//! to the rendered fetch.

use std::sync::LazyLock;

use regex::Regex;
use scraper::Selector;
use serde_json::Value;

use super::{CategoryParser, Page, ParseContext};
use crate::model::{ParserKind, RawRow};

static SCRIPT: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"script:not([type="application/ld+json"])"#).expect("static selector")
});

static NAMED_OBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\{[^{}]*"name"[^{}]*\}"#).expect("static regex"));

pub struct EmbeddedScriptParser;

impl EmbeddedScriptParser {
    /// Scripts worth scanning mention both rankings and athletes.
    fn ranking_scripts<'p>(page: &'p Page<'_>) -> impl Iterator<Item = String> + 'p {
        page.document
            .select(&SCRIPT)
            .map(|s| s.text().collect::<String>())
            .filter(|text| {
                let lower = text.to_lowercase();
                lower.contains("ranking") && lower.contains("athlete")
            })
    }
}

impl CategoryParser for EmbeddedScriptParser {
    fn kind(&self) -> ParserKind {
        ParserKind::EmbeddedScript
    }

    fn matches(&self, page: &Page<'_>) -> bool {
        Self::ranking_scripts(page).next().is_some()
    }

    fn extract(&self, page: &Page<'_>, ctx: &ParseContext<'_>) -> Vec<RawRow> {
        let category = ctx.category.unwrap_or_default();
        let mut rows: Vec<RawRow> = Vec::new();

        for script in Self::ranking_scripts(page) {
            for fragment in NAMED_OBJECT.find_iter(&script) {
                let Ok(Value::Object(object)) = serde_json::from_str::<Value>(fragment.as_str())
                else {
                    continue;
                };

                let text = |key: &str| match object.get(key) {
                    Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
                    Some(Value::Number(n)) => Some(n.to_string()),
                    _ => None,
                };

                let Some(name) = text("name") else {
                    continue;
                };
                let rank = text("rank")
                    .or_else(|| text("position"))
                    .unwrap_or_else(|| (rows.len() + 1).to_string());
                let Some(school) = text("school").or_else(|| text("team")) else {
                    continue;
                };

                rows.push(RawRow::new(
                    rank,
                    name,
                    school,
                    category,
                    ctx.origin(ParserKind::EmbeddedScript),
                ));
            }
        }

        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::RawContent;

    fn extract(html: &str) -> Vec<RawRow> {
        let content = RawContent::html("https://example.com/157", html);
        let page = Page::parse(&content);
        EmbeddedScriptParser.extract(&page, &ParseContext::new("pages", Some("157")))
    }

    #[test]
    fn extracts_flat_athlete_objects_in_order() {
        let rows = extract(
            r#"<script>
              window.rankingData = {athletes: [
                {"name": "Jacori Teemer", "school": "Arizona State"},
                {"name": "Levi Haines", "team": "Penn State"}
              ]};
            </script>"#,
        );
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].rank_text, "1");
        assert_eq!(rows[1].rank_text, "2");
        assert_eq!(rows[1].school, "Penn State");
        assert_eq!(rows[0].category, "157");
        assert_eq!(rows[0].origin.parser, ParserKind::EmbeddedScript);
    }

    #[test]
    fn explicit_rank_wins_over_discovery_order() {
        let rows = extract(
            r#"<script>var ranking = {athlete: {"rank": 7, "name": "A Person", "school": "Iowa"}};</script>"#,
        );
        assert_eq!(rows[0].rank_text, "7");
    }

    #[test]
    fn scripts_without_ranking_vocabulary_are_ignored() {
        let html = r#"<script>var user = {"name": "Logged In User", "school": "None"};</script>"#;
        let content = RawContent::html("u", html);
        let page = Page::parse(&content);
        assert!(!EmbeddedScriptParser.matches(&page));
        assert!(extract(html).is_empty());
    }

    #[test]
    fn fragments_without_school_are_skipped() {
        let rows = extract(
            r#"<script>ranking; athlete; a = {"name": "No School"}; b = {"name": "Ok Person", "team": "Iowa"};</script>"#,
        );
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Ok Person");
        assert_eq!(rows[0].rank_text, "1");
    }

    #[test]
    fn undecodable_fragments_are_skipped() {
        let rows = extract(
            r#"<script>ranking; athlete; x = {"name": broken}; y = {"name": "Ok Person", "school": "Iowa"};</script>"#,
        );
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Ok Person");
        assert_eq!(rows[0].rank_text, "1");
    }
}
