//! Pipeline configuration.

use anyhow::{Context, Result};
use lst_common::{builtin_regions, Region};
use lst_ingestion::{ExtractionConfig, MetricConfig};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Top-level pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Stage directories
    pub paths: PathsConfig,

    /// Raster download and decoding
    pub extraction: ExtractionConfig,

    /// Degree-day, UHI, heatwave and anomaly parameters
    pub metrics: MetricConfig,

    pub logging: LoggingConfig,

    /// Regions enriched into gold metadata
    pub regions: Vec<Region>,

    /// Where to write run counters in Prometheus text format
    pub metrics_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Holds `discovery_results.json` and the per-region search payloads
    pub raw_dir: PathBuf,
    pub bronze_dir: PathBuf,
    pub silver_dir: PathBuf,
    pub gold_dir: PathBuf,
}

impl PathsConfig {
    pub fn discovery_results(&self) -> PathBuf {
        self.raw_dir.join("discovery_results.json")
    }

    pub fn bronze_partitions(&self) -> PathBuf {
        self.bronze_dir.join("partitions")
    }

    pub fn silver_partitions(&self) -> PathBuf {
        self.silver_dir.join("partitions")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    /// `json` or `pretty`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "json".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn validate(&self) -> Result<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        anyhow::ensure!(
            valid_levels.contains(&self.level.as_str()),
            "Invalid log level: {}. Must be one of: {:?}",
            self.level,
            valid_levels
        );

        let valid_formats = ["json", "pretty"];
        anyhow::ensure!(
            valid_formats.contains(&self.format.as_str()),
            "Invalid log format: {}. Must be one of: {:?}",
            self.format,
            valid_formats
        );

        Ok(())
    }
}

impl PipelineConfig {
    /// Load configuration from a YAML file.
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self> {
        use crate::config_loader;

        let file = config_loader::load_pipeline_config(path)?;
        file.to_runtime_config()
    }

    /// Load configuration from `LST_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let data_dir = PathBuf::from(env::var("LST_DATA_DIR").unwrap_or_else(|_| "./data".to_string()));
        let dir = |var: &str, sub: &str| {
            env::var(var)
                .map(PathBuf::from)
                .unwrap_or_else(|_| data_dir.join(sub))
        };

        let paths = PathsConfig {
            raw_dir: dir("LST_RAW_DIR", "raw"),
            bronze_dir: dir("LST_BRONZE_DIR", "bronze"),
            silver_dir: dir("LST_SILVER_DIR", "silver"),
            gold_dir: dir("LST_GOLD_DIR", "gold"),
        };

        let mut extraction = ExtractionConfig {
            download_dir: dir("LST_DOWNLOAD_DIR", "raw/tiles"),
            auth_token: env::var("EARTHDATA_TOKEN").ok().filter(|t| !t.is_empty()),
            ..Default::default()
        };
        if let Some(enabled) = parse_var::<bool>("LST_ENABLE_DOWNLOAD")? {
            extraction.enable_download = enabled;
        }
        extraction.mock_seed = parse_var("LST_MOCK_SEED")?;

        let mut metrics = MetricConfig::default();
        if let Some(v) = parse_var("LST_BASE_TEMP_C")? {
            metrics.base_temp_c = v;
        }
        if let Some(v) = parse_var("LST_RURAL_BASELINE_C")? {
            metrics.rural_baseline_c = v;
        }
        if let Some(v) = parse_var("LST_HEATWAVE_THRESHOLD_C")? {
            metrics.heatwave.threshold_c = v;
        }
        if let Some(v) = parse_var("LST_HEATWAVE_MIN_DAYS")? {
            metrics.heatwave.min_consecutive_days = v;
        }
        if let Some(v) = parse_var("LST_ANOMALY_WINDOW")? {
            metrics.anomaly_window = v;
        }
        if let Some(v) = parse_var("LST_CLOUD_COVER_THRESHOLD")? {
            metrics.cloud_cover_threshold = v;
        }

        let logging = LoggingConfig {
            level: env::var("LST_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            format: env::var("LST_LOG_FORMAT").unwrap_or_else(|_| "json".to_string()),
        };

        let config = Self {
            paths,
            extraction,
            metrics,
            logging,
            regions: builtin_regions(),
            metrics_file: env::var("LST_METRICS_FILE").ok().map(PathBuf::from),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        validate_settings(
            &self.paths,
            &self.extraction,
            &self.metrics,
            &self.regions,
            &self.logging,
        )
    }
}

/// Checks shared by the YAML and environment loaders.
pub fn validate_settings(
    paths: &PathsConfig,
    extraction: &ExtractionConfig,
    metrics: &MetricConfig,
    regions: &[Region],
    logging: &LoggingConfig,
) -> Result<()> {
    let dirs = [
        ("raw_dir", &paths.raw_dir),
        ("bronze_dir", &paths.bronze_dir),
        ("silver_dir", &paths.silver_dir),
        ("gold_dir", &paths.gold_dir),
    ];
    for (name, path) in dirs {
        anyhow::ensure!(
            !path.as_os_str().is_empty(),
            "paths.{} cannot be empty",
            name
        );
    }

    extraction.validate()?;
    metrics.validate()?;

    anyhow::ensure!(
        metrics.anomaly_window > 0,
        "metrics.anomaly_window must be at least 1"
    );
    anyhow::ensure!(
        metrics.heatwave.min_consecutive_days > 0,
        "metrics.heatwave.min_consecutive_days must be at least 1"
    );

    for region in regions {
        anyhow::ensure!(!region.id.is_empty(), "Region id cannot be empty");
        region
            .bbox
            .validate()
            .with_context(|| format!("Invalid bbox for region {}", region.id))?;
    }

    logging.validate()
}

/// Parse an optional environment variable.
fn parse_var<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("Invalid value for {}: {}", name, raw)),
        _ => Ok(None),
    }
}
