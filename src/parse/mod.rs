//! Category parsers and the cascade that tries them in order.
//!
//! Each parser makes one structural assumption about a ranking page:
//!
//! | Priority | Parser | Looks for |
//! |----------|--------|-----------|
//! | 1 | [`StructuredDataParser`] | JSON-LD `itemListElement` blocks |
//! | 2 | [`EmbeddedScriptParser`] | `{"name": ...}` fragments in inline scripts |
//! | 3 | [`PositionalTableParser`] | ranking table with fixed columns |
//! | 4 | [`HeuristicTextParser`] | "Name (School)"-style text in rank-ish elements |
//!
//! The first parser that returns at least one row wins; later parsers are not
//! run for that page.
//!
//! # Example
//!
//! ```rust
//! use matrank::fetch::RawContent;
//! use matrank::parse::{ParseContext, ParserCascade};
//!
//! let html = r#"<div class="athlete">1. Jane Doe (Iowa)</div>"#;
//! let content = RawContent::html("https://example.com/125", html);
//! let outcome = ParserCascade::per_category().run(&content, &ParseContext::new("demo", Some("125")));
//! assert_eq!(outcome.rows[0].name, "Jane Doe");
//! ```

pub mod heuristic;
pub mod script;
pub mod structured;
pub mod table;

use scraper::{ElementRef, Html};
use tracing::debug;

use crate::fetch::RawContent;
use crate::model::{ParserKind, RawRow, RowOrigin};

pub use heuristic::HeuristicTextParser;
pub use script::EmbeddedScriptParser;
pub use structured::StructuredDataParser;
pub use table::{PositionalTableParser, TableLayout};

/// A fetched page, parsed once and shared by every parser in the cascade.
pub struct Page<'a> {
    pub raw: &'a RawContent,
    pub document: Html,
}

impl<'a> Page<'a> {
    #[must_use]
    pub fn parse(raw: &'a RawContent) -> Self {
        Self {
            raw,
            document: Html::parse_document(&raw.body),
        }
    }
}

/// What the parser knows about the page besides its content.
#[derive(Debug, Clone, Copy)]
pub struct ParseContext<'a> {
    /// Name of the source adapter, recorded as row provenance.
    pub source: &'a str,
    /// Category the page was fetched for; `None` for aggregate pages that
    /// carry several categories.
    pub category: Option<&'a str>,
    /// Categories a heading or caption may name; empty accepts any number.
    pub known_categories: &'a [String],
}

impl<'a> ParseContext<'a> {
    #[must_use]
    pub fn new(source: &'a str, category: Option<&'a str>) -> Self {
        Self {
            source,
            category,
            known_categories: &[],
        }
    }

    #[must_use]
    pub fn with_known_categories(mut self, categories: &'a [String]) -> Self {
        self.known_categories = categories;
        self
    }

    pub(crate) fn is_known_category(&self, category: &str) -> bool {
        self.known_categories.is_empty() || self.known_categories.iter().any(|c| c == category)
    }

    pub(crate) fn origin(&self, parser: ParserKind) -> RowOrigin {
        RowOrigin {
            source: self.source.to_string(),
            parser,
        }
    }
}

/// One extraction strategy.
pub trait CategoryParser: Send + Sync {
    fn kind(&self) -> ParserKind;

    /// Cheap precondition: does the page have the structure this parser
    /// relies on?
    fn matches(&self, page: &Page<'_>) -> bool;

    /// Extract rows. An empty result is a miss, not an error.
    fn extract(&self, page: &Page<'_>, ctx: &ParseContext<'_>) -> Vec<RawRow>;
}

/// Result of running a cascade over one page.
#[derive(Debug, Clone, Default)]
pub struct CascadeOutcome {
    /// Parser that produced the rows; `None` when every parser missed.
    pub parser: Option<ParserKind>,
    pub rows: Vec<RawRow>,
}

/// Ordered list of parsers; first non-empty result wins.
pub struct ParserCascade {
    parsers: Vec<Box<dyn CategoryParser>>,
}

impl ParserCascade {
    #[must_use]
    pub fn new(parsers: Vec<Box<dyn CategoryParser>>) -> Self {
        Self { parsers }
    }

    /// Cascade for a page that holds a single category.
    #[must_use]
    pub fn per_category() -> Self {
        Self::new(vec![
            Box::new(StructuredDataParser),
            Box::new(EmbeddedScriptParser),
            Box::new(PositionalTableParser::new(TableLayout::CategoryPage)),
            Box::new(HeuristicTextParser::default()),
        ])
    }

    /// Cascade for an aggregate listing page with several categories.
    #[must_use]
    pub fn listing() -> Self {
        Self::new(vec![Box::new(PositionalTableParser::new(TableLayout::Listing))])
    }

    #[must_use]
    pub fn kinds(&self) -> Vec<ParserKind> {
        self.parsers.iter().map(|p| p.kind()).collect()
    }

    /// Run parsers in priority order against `content`.
    pub fn run(&self, content: &RawContent, ctx: &ParseContext<'_>) -> CascadeOutcome {
        let page = Page::parse(content);

        for parser in &self.parsers {
            if !parser.matches(&page) {
                continue;
            }

            let rows = parser.extract(&page, ctx);
            if rows.is_empty() {
                debug!(
                    url = %content.url,
                    parser = parser.kind().as_str(),
                    "Parser matched but extracted nothing"
                );
                continue;
            }

            debug!(
                url = %content.url,
                parser = parser.kind().as_str(),
                rows = rows.len(),
                "Parser succeeded"
            );
            return CascadeOutcome {
                parser: Some(parser.kind()),
                rows,
            };
        }

        CascadeOutcome::default()
    }
}

/// Visible text of an element with whitespace collapsed.
pub(crate) fn element_text(element: &ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Leading run of digits, e.g. `"125 lbs"` → `"125"`.
pub(crate) fn leading_number(text: &str) -> Option<&str> {
    let trimmed = text.trim_start();
    let end = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    (end > 0).then(|| &trimmed[..end])
}

/// First run of digits anywhere in `text`, e.g. `"Weight: 133"` → `"133"`.
pub(crate) fn first_number(text: &str) -> Option<&str> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    leading_number(&text[start..])
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(ParserKind, usize, bool);

    impl CategoryParser for Fixed {
        fn kind(&self) -> ParserKind {
            self.0
        }

        fn matches(&self, _page: &Page<'_>) -> bool {
            self.2
        }

        fn extract(&self, _page: &Page<'_>, ctx: &ParseContext<'_>) -> Vec<RawRow> {
            (0..self.1)
                .map(|i| {
                    RawRow::new(
                        (i + 1).to_string(),
                        "Name",
                        "School",
                        ctx.category.unwrap_or(""),
                        ctx.origin(self.0),
                    )
                })
                .collect()
        }
    }

    fn ctx() -> ParseContext<'static> {
        ParseContext::new("test", Some("125"))
    }

    #[test]
    fn first_non_empty_parser_wins() {
        let cascade = ParserCascade::new(vec![
            Box::new(Fixed(ParserKind::StructuredData, 0, true)),
            Box::new(Fixed(ParserKind::EmbeddedScript, 2, true)),
            Box::new(Fixed(ParserKind::PositionalTable, 5, true)),
        ]);
        let outcome = cascade.run(&RawContent::html("u", ""), &ctx());
        assert_eq!(outcome.parser, Some(ParserKind::EmbeddedScript));
        assert_eq!(outcome.rows.len(), 2);
        assert!(outcome
            .rows
            .iter()
            .all(|r| r.origin.parser == ParserKind::EmbeddedScript));
    }

    #[test]
    fn parsers_whose_precondition_fails_are_skipped() {
        let cascade = ParserCascade::new(vec![
            Box::new(Fixed(ParserKind::StructuredData, 3, false)),
            Box::new(Fixed(ParserKind::HeuristicText, 1, true)),
        ]);
        let outcome = cascade.run(&RawContent::html("u", ""), &ctx());
        assert_eq!(outcome.parser, Some(ParserKind::HeuristicText));
    }

    #[test]
    fn total_miss_yields_empty_outcome() {
        let outcome = ParserCascade::per_category()
            .run(&RawContent::html("u", "<html><body><p>Nothing</p></body></html>"), &ctx());
        assert!(outcome.parser.is_none());
        assert!(outcome.rows.is_empty());
    }

    #[test]
    fn structured_data_shadows_every_later_parser() {
        let html = r#"<html><head>
            <script type="application/ld+json">
              {"itemListElement": [{"position": 1, "name": "Vincent Robinson", "affiliation": "NC State"}]}
            </script>
            <script>var ranking = {athlete: {"name": "Script Person", "school": "Elsewhere"}};</script>
            </head><body>
            <div data-test="ranking-content"><table>
              <tr><td>1</td><td>SR</td><td>Table Person</td><td>Somewhere</td></tr>
            </table></div>
            <div class="athlete">Heuristic Person (Nowhere)</div>
            </body></html>"#;
        let outcome = ParserCascade::per_category().run(&RawContent::html("u", html), &ctx());
        assert_eq!(outcome.parser, Some(ParserKind::StructuredData));
        assert_eq!(outcome.rows.len(), 1);
        assert_eq!(outcome.rows[0].name, "Vincent Robinson");
    }

    #[test]
    fn partial_structured_rows_fall_through_to_the_table() {
        let html = r#"<html><head>
            <script type="application/ld+json">
              {"itemListElement": [{"position": 1, "name": "Vincent Robinson"}]}
            </script>
            </head><body>
            <div data-test="ranking-content"><table>
              <tr><td>1</td><td>SO</td><td>Vincent Robinson</td><td>NC State</td><td>1</td></tr>
            </table></div>
            </body></html>"#;
        let outcome = ParserCascade::per_category().run(&RawContent::html("u", html), &ctx());
        assert_eq!(outcome.parser, Some(ParserKind::PositionalTable));
        assert_eq!(outcome.rows.len(), 1);
        assert_eq!(outcome.rows[0].school, "NC State");

        let records = crate::normalize::normalize(&outcome.rows);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].school, "NC State");
    }

    #[test]
    fn cascade_orders() {
        assert_eq!(
            ParserCascade::per_category().kinds(),
            vec![
                ParserKind::StructuredData,
                ParserKind::EmbeddedScript,
                ParserKind::PositionalTable,
                ParserKind::HeuristicText,
            ]
        );
        assert_eq!(ParserCascade::listing().kinds(), vec![ParserKind::PositionalTable]);
    }

    #[test]
    fn number_helpers() {
        assert_eq!(leading_number("125 lbs"), Some("125"));
        assert_eq!(leading_number("  7."), Some("7"));
        assert_eq!(leading_number("lbs"), None);
        assert_eq!(first_number("Weight: 133"), Some("133"));
        assert_eq!(first_number("none"), None);
        assert_eq!(collapse_whitespace("  a \n\t b  "), "a b");
    }
}
