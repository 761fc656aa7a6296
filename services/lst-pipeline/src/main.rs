//! LST climate-risk pipeline.
//!
//! Runs the bronze (normalize granule searches), silver (extract daily LST
//! metrics) and gold (API payloads) stages over the configured data
//! directories.

mod config;
mod config_loader;
mod stages;

use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::Path;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use config::PipelineConfig;
use stages::Stage;

#[derive(Parser, Debug)]
#[command(name = "lst-pipeline")]
#[command(about = "Satellite LST medallion pipeline for urban climate-risk metrics")]
struct Args {
    /// Configuration file path (falls back to LST_* environment variables)
    #[arg(short, long, env = "LST_CONFIG", default_value = "config/pipeline.yaml")]
    config: String,

    /// Stage to run
    #[arg(short, long, value_enum, default_value = "all")]
    stage: Stage,

    /// Force raster download on, overriding the config
    #[arg(long)]
    enable_download: bool,

    /// Seed for mock temperatures
    #[arg(long)]
    mock_seed: Option<u64>,

    /// Log level (overrides the config)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let mut config = if Path::new(&args.config).exists() {
        PipelineConfig::from_yaml(&args.config)?
    } else {
        PipelineConfig::from_env()?
    };
    if args.enable_download {
        config.extraction.enable_download = true;
    }
    if args.mock_seed.is_some() {
        config.extraction.mock_seed = args.mock_seed;
    }

    // Initialize tracing
    let level_name = args
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.clone());
    let level = match level_name.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true);
    if config.logging.format == "pretty" {
        tracing::subscriber::set_global_default(builder.pretty().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    }

    if !Path::new(&args.config).exists() {
        warn!(path = %args.config, "Config file not found, using environment configuration");
    }

    let prometheus = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install metrics recorder")?;

    info!(
        stage = ?args.stage,
        regions = config.regions.len(),
        enable_download = config.extraction.enable_download,
        "Starting LST pipeline"
    );

    let outcome = stages::run(&config, args.stage).await;

    if let Some(path) = &config.metrics_file {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, prometheus.render())
            .with_context(|| format!("Failed to write metrics to {:?}", path))?;
    }

    outcome?;
    info!("LST pipeline finished");
    Ok(())
}
