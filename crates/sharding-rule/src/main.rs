//! sharding-rule-check: validate a sharding rule configuration
//!
//! Builds a rule engine from a JSON configuration, prints what it resolved
//! and optionally runs one binding correlation query.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use sharding_rule::{RuleEngine, ShardingRuleApi, ShardingRuleConfig};

/// Validate a sharding rule configuration
#[derive(Parser, Debug)]
#[command(name = "sharding-rule-check")]
#[command(about = "Build a sharding rule engine from a JSON configuration and report it")]
struct Args {
    /// Path to the JSON rule configuration
    config: PathBuf,

    /// Correlate a bound table: data_source,target_table,source_table,source_actual_table
    #[arg(long, value_delimiter = ',')]
    resolve: Option<Vec<String>>,
}

fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let config = ShardingRuleConfig::from_json_file(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    let engine = RuleEngine::from_config(&config).context("building sharding rule engine")?;
    info!("[sharding] {} is valid", args.config.display());

    println!("data sources: {}", engine.data_source_names().join(", "));
    for (logic_table, locations) in engine.all_addresses() {
        println!("{:<24} {:>4} locations", logic_table, locations.len());
    }
    for group in engine.binding_groups() {
        println!("binding group: [{}]", group.declaration());
    }

    if let Some(query) = args.resolve {
        let [data_source, target, source, source_actual] = query.as_slice() else {
            bail!("--resolve expects data_source,target_table,source_table,source_actual_table");
        };
        let bound = engine
            .resolve_bound_location(data_source, target, source, source_actual)
            .context("resolving bound location")?;
        println!("{}.{} -> {}.{}", data_source, source_actual, data_source, bound);
    }

    Ok(())
}
