//! Benchmarks for the parser cascade and normalization.
//!
//! Run with: `cargo bench --bench parse_bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use matrank::fetch::RawContent;
use matrank::model::{ParserKind, RowOrigin};
use matrank::normalize;
use matrank::parse::{ParseContext, ParserCascade};
use matrank::RawRow;

/// Per-weight ranking page with `rows` table rows, wrapped in site chrome.
fn table_page(rows: usize) -> String {
    let mut html = String::from(
        r#"<!DOCTYPE html><html><head><title>Rankings</title>
<script>window.analytics = {"page": "rankings"};</script></head><body>
<nav><ul><li><a href="/">Home</a></li><li><a href="/login">Log in</a></li></ul></nav>
<div data-test="ranking-content"><table><tbody>
<tr><td>Rank</td><td>Grade</td><td>Name</td><td>School</td><td>Prev</td></tr>
"#,
    );
    for i in 1..=rows {
        html.push_str(&format!(
            "<tr><td>{i}</td><td>SR</td><td>Wrestler Number{i}</td><td>School {i}</td><td>{}</td></tr>\n",
            i + 1
        ));
    }
    html.push_str("</tbody></table></div><footer>Privacy</footer></body></html>");
    html
}

/// Page only the text heuristics understand.
fn text_page(rows: usize) -> String {
    let mut html = String::from("<html><body><ul>");
    for i in 1..=rows {
        html.push_str(&format!(
            r#"<li class="ranking-item">{i}. Wrestler Number{i} (School {i})</li>"#
        ));
    }
    html.push_str("</ul></body></html>");
    html
}

fn bench_cascade(c: &mut Criterion) {
    let cascade = ParserCascade::per_category();
    let ctx = ParseContext::new("bench", Some("184"));
    let mut group = c.benchmark_group("cascade");

    for rows in [10, 33, 100] {
        let table = RawContent::html("https://example.com/184", table_page(rows));
        group.throughput(Throughput::Bytes(table.body.len() as u64));
        group.bench_with_input(BenchmarkId::new("table", rows), &table, |b, page| {
            b.iter(|| cascade.run(black_box(page), &ctx));
        });

        let text = RawContent::html("https://example.com/184", text_page(rows));
        group.throughput(Throughput::Bytes(text.body.len() as u64));
        group.bench_with_input(BenchmarkId::new("heuristic", rows), &text, |b, page| {
            b.iter(|| cascade.run(black_box(page), &ctx));
        });
    }

    group.finish();
}

fn bench_normalize(c: &mut Criterion) {
    let origin = RowOrigin {
        source: "bench".to_string(),
        parser: ParserKind::PositionalTable,
    };
    let weights = ["125", "133", "141", "149", "157", "165", "174", "184", "197", "285"];
    let rows: Vec<RawRow> = weights
        .iter()
        .rev()
        .flat_map(|w| {
            let origin = origin.clone();
            (1..=33).rev().map(move |r| {
                RawRow::new(
                    r.to_string(),
                    format!("  Wrestler   {w}-{r} "),
                    "Some  School",
                    *w,
                    origin.clone(),
                )
            })
        })
        .collect();

    let mut group = c.benchmark_group("normalize");
    group.throughput(Throughput::Elements(rows.len() as u64));
    group.bench_function("ten_weights", |b| b.iter(|| normalize(black_box(&rows))));
    group.finish();
}

criterion_group!(benches, bench_cascade, bench_normalize);
criterion_main!(benches);
