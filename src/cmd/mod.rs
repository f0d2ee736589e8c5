mod category;
mod output;
mod run;
mod sources;

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};

use matrank::{RankingsConfig, RunOptions};

use crate::PipelineArgs;

pub use category::cmd_category;
pub use run::cmd_run;
pub use sources::cmd_sources;

fn load_config(path: Option<&Path>) -> Result<RankingsConfig> {
    let config = RankingsConfig::load(path).with_context(|| match path {
        Some(p) => format!("loading config from {}", p.display()),
        None => "loading default config".to_string(),
    })?;
    config.validate().context("invalid rankings config")?;
    Ok(config)
}

fn run_options(args: &PipelineArgs) -> RunOptions {
    RunOptions {
        edition: args.edition.clone(),
        rendered: args.rendered,
        only: args.source,
        workers: args.workers,
        deadline: args.deadline_secs.map(Duration::from_secs),
        debug_dir: args.debug_dir.clone(),
    }
}
