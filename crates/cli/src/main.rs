//! Adaptix CLI - adaptive decision and predictive optimization engine.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{info, Level};

use adaptix_core::{DecisionRequest, EngineConfig};
use adaptix_runtime::AdaptiveEngine;

#[derive(Parser)]
#[command(name = "adaptix")]
#[command(about = "Adaptive decision and predictive optimization engine", long_about = None)]
struct Cli {
    /// Path to a TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the engine with its background cadences until interrupted
    Run,
    /// Produce one decision from metric readings
    Decide {
        /// Metric readings as name=value pairs (repeatable)
        #[arg(long = "metric", value_parser = parse_metric)]
        metrics: Vec<(String, f64)>,
        /// Request priority (0-255)
        #[arg(long, default_value = "128")]
        priority: u8,
    },
    /// Show an engine status snapshot
    Status,
    /// Run one hyperparameter tuning pass
    Tune {
        /// Desired metric values as name=value pairs (repeatable)
        #[arg(long = "target", value_parser = parse_metric)]
        targets: Vec<(String, f64)>,
        /// Apply the best parameters instead of only reporting them
        #[arg(long)]
        commit: bool,
    },
}

fn parse_metric(raw: &str) -> Result<(String, f64), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{raw}'"))?;
    let value: f64 = value
        .parse()
        .map_err(|e| format!("bad value in '{raw}': {e}"))?;
    Ok((name.to_string(), value))
}

fn load_config(path: Option<&PathBuf>) -> Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => Ok(EngineConfig::default()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;
    let engine = AdaptiveEngine::new(config);
    engine.seed_default_models().await?;

    match cli.command {
        Commands::Run => {
            engine.start().await;
            info!("engine running, press ctrl-c to stop");
            tokio::signal::ctrl_c()
                .await
                .context("waiting for interrupt")?;
            engine.shutdown().await;
        }
        Commands::Decide { metrics, priority } => {
            let request = DecisionRequest {
                real_time_metrics: metrics.into_iter().collect::<HashMap<_, _>>(),
                priority,
                ..Default::default()
            };
            let decision = engine.decide(&request).await;
            println!("{}", serde_json::to_string_pretty(&decision)?);
        }
        Commands::Status => {
            let status = engine.status().await;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        Commands::Tune { targets, commit } => {
            let targets: HashMap<String, f64> = targets.into_iter().collect();
            let report = engine.tune(&targets, commit).await?;
            println!("model:       {}", report.model_id);
            println!("improvement: {:.4}", report.improvement_score);
            println!(
                "parameters:  {}",
                serde_json::to_string(&report.optimized_parameters)?
            );
            for recommendation in &report.recommendations {
                println!("  - {recommendation}");
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_pairs_parse() {
        assert_eq!(
            parse_metric("cpu_usage=0.85").unwrap(),
            ("cpu_usage".to_string(), 0.85)
        );
        assert!(parse_metric("cpu_usage").is_err());
        assert!(parse_metric("cpu_usage=high").is_err());
    }
}
