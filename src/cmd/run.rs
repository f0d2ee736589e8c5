use std::path::Path;

use anyhow::{Context, Result};

use matrank::{JsonFileStore, Orchestrator, RankingStore};

use super::output::{print_json, print_summary};
use super::{load_config, run_options};
use crate::PipelineArgs;

pub async fn cmd_run(config_path: Option<&Path>, args: &PipelineArgs, output: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let orchestrator = Orchestrator::from_config(&config, &run_options(args))
        .context("building ranking sources")?;

    if !args.json {
        println!(
            "🌐 Collecting {} weight classes from {}",
            orchestrator.categories().len(),
            orchestrator.source_names().join(" → ")
        );
    }

    let result = orchestrator.run().await;

    if let Some(path) = output {
        // An empty run leaves the previous snapshot in place
        if result.records.is_empty() {
            if !args.json {
                println!("⚠️  Nothing to save, {} left unchanged", path.display());
            }
        } else {
            JsonFileStore::new(path)
                .replace_all(&result.records)
                .with_context(|| format!("saving rankings to {}", path.display()))?;
            if !args.json {
                println!("💾 Saved {} wrestlers to {}", result.records.len(), path.display());
            }
        }
    }

    if args.json {
        print_json(&result)
    } else {
        print_summary(&result, args.rendered, args.debug_dir.as_deref());
        Ok(())
    }
}
