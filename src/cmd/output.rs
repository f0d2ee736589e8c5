use std::path::Path;

use anyhow::Result;
use serde::Serialize;

use matrank::model::{PipelineRun, SourceOutcome};
use matrank::{PipelineResult, Wrestler};

const SAMPLE_SIZE: usize = 3;

#[derive(Serialize)]
struct JsonReport<'a> {
    records: &'a [Wrestler],
    run: &'a PipelineRun,
}

pub fn print_json(result: &PipelineResult) -> Result<()> {
    let report = JsonReport {
        records: &result.records,
        run: &result.run,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

pub fn print_summary(result: &PipelineResult, rendered: bool, debug_dir: Option<&Path>) {
    let run = &result.run;

    println!("\n📊 Run summary ({:.1}s)", run.elapsed.as_secs_f64());
    for source in &run.sources {
        print_source(source, run.winner.as_deref() == Some(source.source.as_str()));
    }
    if run.deadline_hit {
        println!("   ⏱️  Run deadline reached, remaining sources skipped");
    }

    if result.records.is_empty() {
        print_guidance(rendered, debug_dir);
        return;
    }

    println!(
        "\n✅ {} wrestlers from {}",
        result.records.len(),
        run.winner.as_deref().unwrap_or("?")
    );
    for w in result.records.iter().take(SAMPLE_SIZE) {
        println!("   {:>3} lbs  #{:<2} {} ({})", w.category, w.rank, w.name, w.school);
    }
    if result.records.len() > SAMPLE_SIZE {
        println!("   ... {} more", result.records.len() - SAMPLE_SIZE);
    }
}

fn print_source(source: &SourceOutcome, winner: bool) {
    let marker = if winner {
        "✅"
    } else if source.records > 0 {
        "⚠️ "
    } else {
        "❌"
    };
    println!(
        "\n{marker} {}: {} records, {} failures",
        source.source,
        source.records,
        source.failure_count()
    );

    if let Some(failure) = &source.failure {
        println!("   {} {}: {}", failure.reason.as_str(), failure.url, failure.detail);
    }

    for category in &source.categories {
        match &category.failure {
            Some(failure) => println!(
                "   {:>4}  ❌ {} ({})",
                category.category,
                failure.reason.as_str(),
                failure.detail
            ),
            None => {
                let parser = category.parser.map_or("-", |p| p.as_str());
                println!("   {:>4}  {:>3} rows  [{parser}]", category.category, category.records);
            }
        }
    }
}

fn print_guidance(rendered: bool, debug_dir: Option<&Path>) {
    println!("\n⚠️  No rankings available this run.");
    println!("   Things to try:");
    if !rendered {
        println!("   • re-run with --rendered to load per-weight pages in headless Chrome");
    }
    println!("   • check network access to the ranking sites");
    match debug_dir {
        Some(dir) => println!("   • inspect the saved pages in {}", dir.display()),
        None => println!("   • re-run with --debug-dir DIR and inspect the saved pages"),
    }
}
