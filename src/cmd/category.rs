use std::path::Path;

use anyhow::{bail, Context, Result};

use matrank::Orchestrator;

use super::output::{print_json, print_summary};
use super::{load_config, run_options};
use crate::PipelineArgs;

pub async fn cmd_category(config_path: Option<&Path>, weight: &str, args: &PipelineArgs) -> Result<()> {
    let config = load_config(config_path)?;
    let weight = weight.trim().trim_end_matches("lbs").trim();
    if !config.categories.iter().any(|c| c == weight) {
        bail!(
            "unknown weight class {weight:?} (configured: {})",
            config.categories.join(", ")
        );
    }

    let orchestrator = Orchestrator::from_config(&config, &run_options(args))
        .context("building ranking sources")?;

    if !args.json {
        println!(
            "🌐 Collecting {weight} lbs from {}",
            orchestrator.source_names().join(" → ")
        );
    }

    let result = orchestrator.run_category(weight).await;

    if args.json {
        print_json(&result)
    } else {
        print_summary(&result, args.rendered, args.debug_dir.as_deref());
        Ok(())
    }
}
