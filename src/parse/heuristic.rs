//! Last-resort text patterns over ranking-looking elements.
//!
//! Candidates are `div`, `li` and `tr` elements whose class mentions one of
//! [`CLASS_KEYWORDS`]. Each candidate's text is tried against the patterns
//! in order:
//!
//! 1. `Name (School)`, optionally prefixed by `N.`
//! 2. `Name, School`, optionally prefixed by `N.`
//! 3. `N. Name - School`
//! 4. `N. Name School` (name is the first two words)
//!
//! Once a candidate yields a row its descendants are not tried again.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Selector};

use super::{element_text, CategoryParser, Page, ParseContext};
use crate::model::{ParserKind, RawRow};

pub const CLASS_KEYWORDS: [&str; 4] = ["rank", "athlete", "wrestler", "player"];

/// Upper bound on rows from one page.
pub const MAX_ROWS: usize = 20;

static CANDIDATE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div, li, tr").expect("static selector"));

/// Navigation and UI words that never appear in a ranking entry.
static STOPLIST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(view|subscribe|login|logout|log in|sign in|sign up|signin|signup|register|menu|search|share|watch|advertisement|cookies?|privacy)\b",
    )
    .expect("static regex")
});

static PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"^(?:(\d+)[.)]?\s+)?([A-Za-z][A-Za-z.'\- ]*?)\s*\(([^()]+)\)$",
        r"^(?:(\d+)[.)]?\s+)?([A-Za-z][A-Za-z.'\- ]*?)\s*,\s*([A-Za-z][A-Za-z.'&\- ]*)$",
        r"^(\d+)\.\s*([A-Za-z][A-Za-z.'\-]*(?:\s+[A-Za-z][A-Za-z.'\-]*)*?)\s+-\s+([A-Za-z][A-Za-z.'&\- ]*)$",
        r"^(\d+)\.\s*([A-Za-z][A-Za-z.'\-]*\s+[A-Za-z][A-Za-z.'\-]*)\s+([A-Za-z][A-Za-z.'&\- ]*)$",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static regex"))
    .collect()
});

#[derive(Debug, Clone)]
pub struct HeuristicTextParser {
    max_rows: usize,
}

impl Default for HeuristicTextParser {
    fn default() -> Self {
        Self { max_rows: MAX_ROWS }
    }
}

impl HeuristicTextParser {
    #[must_use]
    pub fn with_max_rows(max_rows: usize) -> Self {
        Self { max_rows }
    }

    fn candidates<'p>(page: &'p Page<'_>) -> impl Iterator<Item = ElementRef<'p>> + 'p {
        page.document.select(&CANDIDATE).filter(is_candidate)
    }
}

fn is_candidate(element: &ElementRef<'_>) -> bool {
    element.value().attr("class").is_some_and(|class| {
        let class = class.to_lowercase();
        CLASS_KEYWORDS.iter().any(|k| class.contains(k))
    })
}

/// `(rank, name, school)` from candidate text, if any pattern applies.
fn match_text(text: &str) -> Option<(Option<String>, String, String)> {
    if STOPLIST.is_match(text) {
        return None;
    }

    PATTERNS.iter().find_map(|pattern| {
        let caps = pattern.captures(text)?;
        let name = caps.get(2)?.as_str().trim();
        let school = caps.get(3)?.as_str().trim();
        if name.is_empty() || school.is_empty() {
            return None;
        }
        Some((
            caps.get(1).map(|m| m.as_str().to_string()),
            title_case(name),
            title_case(school),
        ))
    })
}

/// Capitalise words that are entirely lower case, or entirely upper case and
/// longer than an acronym.
fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let has_lower = word.chars().any(char::is_lowercase);
            let has_upper = word.chars().any(char::is_uppercase);
            let shout =
                has_upper && !has_lower && word.chars().filter(|c| c.is_alphabetic()).count() > 3;
            if (has_lower && has_upper) || !(has_lower || shout) {
                return word.to_string();
            }
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

impl CategoryParser for HeuristicTextParser {
    fn kind(&self) -> ParserKind {
        ParserKind::HeuristicText
    }

    fn matches(&self, page: &Page<'_>) -> bool {
        Self::candidates(page).next().is_some()
    }

    fn extract(&self, page: &Page<'_>, ctx: &ParseContext<'_>) -> Vec<RawRow> {
        let category = ctx.category.unwrap_or_default();
        let mut rows = Vec::new();
        let mut matched: Vec<ElementRef<'_>> = Vec::new();

        for candidate in Self::candidates(page) {
            if rows.len() >= self.max_rows {
                break;
            }
            if candidate
                .ancestors()
                .any(|a| matched.iter().any(|m| m.id() == a.id()))
            {
                continue;
            }

            let Some((rank, name, school)) = match_text(&element_text(&candidate)) else {
                continue;
            };

            let rank = rank.unwrap_or_else(|| (rows.len() + 1).to_string());
            rows.push(RawRow::new(
                rank,
                name,
                school,
                category,
                ctx.origin(ParserKind::HeuristicText),
            ));
            matched.push(candidate);
        }

        rows
    }
}
