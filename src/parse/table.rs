//! Ranking tables read by fixed column position.

use std::sync::LazyLock;

use scraper::{ElementRef, Selector};

use super::{element_text, first_number, leading_number, CategoryParser, Page, ParseContext};
use crate::model::{ParserKind, RawRow};

static CONTENT_TABLE: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"div[data-test="ranking-content"] table"#).expect("static selector")
});
static ANY_TABLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table").expect("static selector"));
static TBODY_ROW: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tbody tr").expect("static selector"));
static ROW: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").expect("static selector"));
static TD: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td").expect("static selector"));
static CELL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td, th").expect("static selector"));
static CAPTION: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("caption").expect("static selector"));

/// Column layout of the table being read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableLayout {
    /// One category per page, inside the ranking-content container:
    /// `Rank | Grade | Name | School | Previous`.
    CategoryPage,
    /// Aggregate page, any table: `Rank | Name | School | Weight`.
    Listing,
}

impl TableLayout {
    fn min_cells(self) -> usize {
        match self {
            TableLayout::CategoryPage => 4,
            TableLayout::Listing => 3,
        }
    }
}

pub struct PositionalTableParser {
    layout: TableLayout,
}

impl PositionalTableParser {
    #[must_use]
    pub fn new(layout: TableLayout) -> Self {
        Self { layout }
    }

    fn tables<'p>(&self, page: &'p Page<'_>) -> Vec<ElementRef<'p>> {
        let selector = match self.layout {
            TableLayout::CategoryPage => &*CONTENT_TABLE,
            TableLayout::Listing => &*ANY_TABLE,
        };
        page.document.select(selector).collect()
    }

    fn row(&self, cells: &[String], table_category: Option<&str>, ctx: &ParseContext<'_>) -> Option<RawRow> {
        if cells.len() < self.layout.min_cells() {
            return None;
        }

        let rank = cells[0].as_str();
        let name_index = match self.layout {
            TableLayout::CategoryPage => 2,
            TableLayout::Listing => 1,
        };
        let name = cells[name_index].as_str();

        if rank.eq_ignore_ascii_case("rank") || name.eq_ignore_ascii_case("name") {
            return None;
        }
        leading_number(rank)?;

        let school = match self.layout {
            TableLayout::CategoryPage => cells[3].as_str(),
            TableLayout::Listing => cells[2].as_str(),
        };
        if name.is_empty() || school.is_empty() {
            return None;
        }

        let origin = ctx.origin(ParserKind::PositionalTable);
        let row = match self.layout {
            TableLayout::CategoryPage => RawRow::new(
                rank,
                name,
                school,
                ctx.category.unwrap_or_default(),
                origin,
            )
            .with_grade(Some(cells[1].clone()))
            .with_previous_rank(cells.get(4).cloned()),
            TableLayout::Listing => {
                let category = cells
                    .get(3)
                    .and_then(|w| first_number(w))
                    .or(table_category)
                    .or(ctx.category)
                    .unwrap_or_default();
                RawRow::new(rank, name, school, category, origin)
            }
        };
        Some(row)
    }
}

impl CategoryParser for PositionalTableParser {
    fn kind(&self) -> ParserKind {
        ParserKind::PositionalTable
    }

    fn matches(&self, page: &Page<'_>) -> bool {
        !self.tables(page).is_empty()
    }

    fn extract(&self, page: &Page<'_>, ctx: &ParseContext<'_>) -> Vec<RawRow> {
        let mut rows = Vec::new();

        for table in self.tables(page) {
            let table_category = match self.layout {
                TableLayout::Listing => heading_category(&table, ctx),
                TableLayout::CategoryPage => None,
            };

            let mut body_rows: Vec<ElementRef<'_>> = table.select(&TBODY_ROW).collect();
            if body_rows.is_empty() {
                body_rows = table.select(&ROW).collect();
            }

            for tr in body_rows {
                let cell_selector = match self.layout {
                    TableLayout::CategoryPage => &*TD,
                    TableLayout::Listing => &*CELL,
                };
                let cells: Vec<String> = tr.select(cell_selector).map(|c| element_text(&c)).collect();
                rows.extend(self.row(&cells, table_category.as_deref(), ctx));
            }
        }

        rows
    }
}

/// Category named by the table's caption or the closest heading before it
/// that carries a known category, e.g. `<h2>133 lbs</h2><h3>Top 20</h3><table>`.
fn heading_category(table: &ElementRef<'_>, ctx: &ParseContext<'_>) -> Option<String> {
    let known = |element: &ElementRef<'_>| {
        let text = element_text(element);
        first_number(&text)
            .filter(|n| ctx.is_known_category(n))
            .map(str::to_string)
    };

    if let Some(category) = table.select(&CAPTION).next().and_then(|c| known(&c)) {
        return Some(category);
    }

    // Walk outwards: preceding siblings first, then the parent's.
    let mut current = Some(*table);
    while let Some(node) = current {
        for sibling in node.prev_siblings().filter_map(ElementRef::wrap) {
            if is_heading(&sibling) {
                if let Some(category) = known(&sibling) {
                    return Some(category);
                }
            }
        }
        current = node.parent().and_then(ElementRef::wrap);
    }
    None
}

fn is_heading(element: &ElementRef<'_>) -> bool {
    matches!(
        element.value().name(),
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6"
    )
}
