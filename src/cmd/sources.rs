use std::path::Path;

use anyhow::Result;

use matrank::config::EndpointConfig;

use super::load_config;

pub fn cmd_sources(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;

    println!("📋 Weight classes: {}\n", config.categories.join(" "));

    println!("🌐 Single-request sources (tried first)");
    print_endpoint("feed", &config.feed);
    print_endpoint("listing", &config.listing);

    println!("\n📚 Per-weight page editions");
    for (key, edition) in &config.editions {
        let default = if *key == config.default_edition { " (default)" } else { "" };
        println!("\n   {key}{default}: {}", edition.name);
        if let Some(base) = &edition.base_url {
            println!("   base: {base}");
        }
        for category in &config.categories {
            match edition.categories.get(category) {
                Some(url) => println!("   {category:>4}  {url}"),
                None => println!("   {category:>4}  (no page)"),
            }
        }
    }

    Ok(())
}

fn print_endpoint(kind: &str, endpoint: &EndpointConfig) {
    let state = if endpoint.enabled { "✅" } else { "⏸️ " };
    println!("   {state} {kind:<8} {}  {}", endpoint.name, endpoint.url);
}
