//! Configuration loader for the LST pipeline.
//!
//! Loads and validates `pipeline.yaml`:
//! - Stage directories (raw, bronze, silver, gold)
//! - Raster extraction settings
//! - Climate metric parameters
//! - Region catalog and logging
//!
//! Supports environment variable substitution using ${VAR} syntax.

use anyhow::{Context, Result};
use lst_common::{builtin_regions, Region};
use lst_ingestion::{ExtractionConfig, MetricConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{validate_settings, LoggingConfig, PathsConfig, PipelineConfig};

// ============================================================================
// Pipeline Configuration (pipeline.yaml)
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineFile {
    pub paths: PathsConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub metrics: MetricConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Empty means the built-in catalog
    #[serde(default)]
    pub regions: Vec<Region>,
    #[serde(default)]
    pub metrics_file: Option<PathBuf>,
}

impl PipelineFile {
    pub fn to_runtime_config(self) -> Result<PipelineConfig> {
        let regions = if self.regions.is_empty() {
            builtin_regions()
        } else {
            self.regions
        };

        Ok(PipelineConfig {
            paths: self.paths,
            extraction: self.extraction,
            metrics: self.metrics,
            logging: self.logging,
            regions,
            metrics_file: self.metrics_file,
        })
    }
}

// ============================================================================
// Loading Functions
// ============================================================================

/// Load and parse pipeline.yaml with environment variable substitution
pub fn load_pipeline_config<P: AsRef<Path>>(path: P) -> Result<PipelineFile> {
    let content = fs::read_to_string(path.as_ref())
        .with_context(|| format!("Failed to read pipeline config from {:?}", path.as_ref()))?;

    parse_pipeline_config(&content)
}

pub fn parse_pipeline_config(content: &str) -> Result<PipelineFile> {
    let expanded = expand_env_vars(content)?;

    let config: PipelineFile = serde_yaml::from_str(&expanded)
        .with_context(|| "Failed to parse pipeline config YAML")?;

    validate_pipeline_config(&config)?;

    Ok(config)
}

// ============================================================================
// Environment Variable Substitution
// ============================================================================

/// Replace `${VAR}` and `${VAR:-default}` with environment values.
fn expand_env_vars(content: &str) -> Result<String> {
    let mut result = String::new();
    let mut chars = content.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && chars.peek() == Some(&'{') {
            chars.next(); // consume '{'

            let mut var_expr = String::new();
            let mut brace_count = 1;

            while brace_count > 0 {
                match chars.next() {
                    Some('{') => {
                        brace_count += 1;
                        var_expr.push('{');
                    }
                    Some('}') => {
                        brace_count -= 1;
                        if brace_count > 0 {
                            var_expr.push('}');
                        }
                    }
                    Some(c) => var_expr.push(c),
                    None => anyhow::bail!("Unclosed variable substitution: ${{{}", var_expr),
                }
            }

            let value = resolve_var_expr(&var_expr)?;
            result.push_str(&value);
        } else {
            result.push(ch);
        }
    }

    Ok(result)
}

fn resolve_var_expr(expr: &str) -> Result<String> {
    if let Some((var_name, default)) = expr.split_once(":-") {
        match std::env::var(var_name.trim()) {
            Ok(val) if !val.is_empty() => Ok(val),
            _ => Ok(default.to_string()),
        }
    } else {
        std::env::var(expr.trim())
            .with_context(|| format!("Environment variable {} not set", expr))
    }
}

// ============================================================================
// Validation
// ============================================================================

fn validate_pipeline_config(config: &PipelineFile) -> Result<()> {
    validate_settings(
        &config.paths,
        &config.extraction,
        &config.metrics,
        &config.regions,
        &config.logging,
    )
}

// ============================================================================
// Tests
// ============================================================================
