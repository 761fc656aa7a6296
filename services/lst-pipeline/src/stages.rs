//! Bronze, silver and gold stage runners.
//!
//! Each stage reads the previous stage's partition directory and writes its
//! own, so stages can be rerun independently.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::ValueEnum;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::{info, instrument, warn};

use lst_ingestion::{
    aggregate_gold, bronze_metadata, consolidate_store, load_discovery_results, prepare_bronze,
    DailyMetricRecord, GranuleRecord, PartitionStore, SilverProcessor,
};

use crate::config::PipelineConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Stage {
    Bronze,
    Silver,
    Gold,
    All,
}

impl Stage {
    fn includes(self, other: Stage) -> bool {
        self == Stage::All || self == other
    }
}

/// Run the selected stage(s) in order.
pub async fn run(config: &PipelineConfig, stage: Stage) -> Result<()> {
    if stage.includes(Stage::Bronze) {
        run_bronze(config)?;
    }
    if stage.includes(Stage::Silver) {
        run_silver(config).await?;
    }
    if stage.includes(Stage::Gold) {
        run_gold(config)?;
    }
    Ok(())
}

// ============================================================================
// Bronze
// ============================================================================

#[instrument(skip(config))]
pub fn run_bronze(config: &PipelineConfig) -> Result<()> {
    let results_path = config.paths.discovery_results();
    let results = load_discovery_results(&results_path)
        .with_context(|| format!("Failed to load discovery results from {:?}", results_path))?;
    info!(regions = results.len(), "Loaded discovery results");

    let batch = prepare_bronze(&results, &config.paths.raw_dir);

    let store = PartitionStore::create(config.paths.bronze_partitions())?;
    remove_stale_partitions(&store, batch.partitions.keys())?;
    store
        .save_all(&batch.partitions)
        .context("Failed to write bronze partitions")?;

    let bronze_dir = &config.paths.bronze_dir;
    write_json(&bronze_dir.join("region_status.json"), &batch.statuses)?;
    write_json(
        &bronze_dir.join("region_metadata.json"),
        &bronze_metadata(&results, &config.regions, Utc::now()),
    )?;

    let report = consolidate_store::<GranuleRecord>(&store, None)?;
    write_json(&bronze_dir.join("lst_consolidated.json"), &report.table)?;
    write_json(&bronze_dir.join("manifest.json"), &report.manifest)?;

    info!(
        run_id = %report.run_id,
        ingested = batch.ingested_count(),
        skipped = batch.skipped_count(),
        records = report.table.len(),
        "Bronze stage complete"
    );
    Ok(())
}

// ============================================================================
// Silver
// ============================================================================

#[instrument(skip(config))]
pub async fn run_silver(config: &PipelineConfig) -> Result<()> {
    let bronze = PartitionStore::open(config.paths.bronze_partitions())
        .context("Bronze partitions are missing; run the bronze stage first")?;

    let mut processor = SilverProcessor::from_config(config.metrics.clone(), &config.extraction)?;
    info!(mode = %processor.mode(), "Silver extraction mode");

    let batch = processor
        .process_partitions(bronze.load_lazy::<GranuleRecord>()?)
        .await;

    let store = PartitionStore::create(config.paths.silver_partitions())?;
    remove_stale_partitions(&store, batch.series.keys())?;
    store
        .save_all(&batch.partitions())
        .context("Failed to write silver partitions")?;

    let report = consolidate_store::<DailyMetricRecord>(&store, None)?;
    let silver_dir = &config.paths.silver_dir;
    write_json(&silver_dir.join("daily_metrics.json"), &report.table)?;
    write_json(&silver_dir.join("manifest.json"), &report.manifest)?;
    if !batch.skipped.is_empty() {
        write_json(&silver_dir.join("skipped.json"), &batch.skipped)?;
    }

    info!(
        run_id = %report.run_id,
        regions = batch.series.len(),
        processed = batch.processed_count(),
        failed = batch.failed_count(),
        skipped = batch.skipped_count(),
        "Silver stage complete"
    );
    Ok(())
}

/// Drop partitions of regions that are no longer produced.
fn remove_stale_partitions<'a>(
    store: &PartitionStore,
    current: impl Iterator<Item = &'a String>,
) -> Result<()> {
    let current: Vec<&String> = current.collect();
    for key in store.keys()? {
        if !current.contains(&&key) {
            warn!(region = %key, "Removing stale partition");
            fs::remove_file(store.partition_path(&key))?;
        }
    }
    Ok(())
}

// ============================================================================
// Gold
// ============================================================================

#[instrument(skip(config))]
pub fn run_gold(config: &PipelineConfig) -> Result<()> {
    let silver = PartitionStore::open(config.paths.silver_partitions())
        .context("Silver partitions are missing; run the silver stage first")?;

    let batch = aggregate_gold(
        silver.load_lazy::<DailyMetricRecord>()?,
        &config.regions,
        Utc::now(),
    );

    let gold_dir = &config.paths.gold_dir;
    fs::create_dir_all(gold_dir)
        .with_context(|| format!("Failed to create gold directory {:?}", gold_dir))?;

    for (region_id, payload) in &batch.payloads {
        write_json(&gold_dir.join(format!("{}.json", region_id)), payload)?;
    }
    let index: Vec<_> = batch.payloads.values().map(|p| &p.meta).collect();
    write_json(&gold_dir.join("regions.json"), &index)?;

    metrics::counter!("lst_gold_payloads_total").increment(batch.payloads.len() as u64);
    info!(
        payloads = batch.payloads.len(),
        skipped = batch.skipped.len(),
        "Gold stage complete"
    );
    Ok(())
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let bytes = serde_json::to_vec_pretty(value)?;
    fs::write(path, bytes).with_context(|| format!("Failed to write {:?}", path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LoggingConfig, PathsConfig};
    use lst_common::builtin_regions;
    use lst_ingestion::{ExtractionConfig, MetricConfig};
    use serde_json::{json, Value};
    use test_utils::{bbox, daily_granules, search_payload};

    fn test_config(root: &Path) -> PipelineConfig {
        PipelineConfig {
            paths: PathsConfig {
                raw_dir: root.join("raw"),
                bronze_dir: root.join("bronze"),
                silver_dir: root.join("silver"),
                gold_dir: root.join("gold"),
            },
            extraction: ExtractionConfig {
                mock_seed: Some(1),
                ..Default::default()
            },
            metrics: MetricConfig::default(),
            logging: LoggingConfig::default(),
            regions: builtin_regions(),
            metrics_file: None,
        }
    }

    fn read_json(path: &Path) -> Value {
        serde_json::from_slice(&fs::read(path).unwrap()).unwrap()
    }

    fn seed_raw(raw: &Path) {
        fs::create_dir_all(raw).unwrap();
        write_json(
            &raw.join("NYC001_lst.json"),
            &search_payload(bbox::NYC, daily_granules("NYC001", 4, 20.0)),
        )
        .unwrap();
        write_json(
            &raw.join("discovery_results.json"),
            &json!({
                "NYC001": {"status": "success", "file_path": "NYC001_lst.json"},
                "LAX001": {"status": "error", "error_message": "no granules found"}
            }),
        )
        .unwrap();
    }

    #[tokio::test]
    async fn test_all_stages_in_mock_mode() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        seed_raw(&config.paths.raw_dir);

        run(&config, Stage::All).await.unwrap();

        let status = read_json(&config.paths.bronze_dir.join("region_status.json"));
        assert_eq!(status["LAX001"]["status"], "skipped");
        assert_eq!(status["NYC001"]["records"], 4);

        let metadata = read_json(&config.paths.bronze_dir.join("region_metadata.json"));
        assert_eq!(metadata.as_array().unwrap().len(), 4);

        let daily = read_json(&config.paths.silver_dir.join("daily_metrics.json"));
        assert_eq!(daily.as_array().unwrap().len(), 4);
        assert_eq!(daily[0]["source_mode"], "mock");

        let gold = read_json(&config.paths.gold_dir.join("NYC001.json"));
        assert_eq!(gold["meta"]["region_name"], "New York City");
        assert_eq!(gold["metrics"].as_array().unwrap().len(), 4);
        assert!(gold["kpi_summary"]["ytd"]["avg_lst_c"].is_number());

        let index = read_json(&config.paths.gold_dir.join("regions.json"));
        assert_eq!(index.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_silver_requires_bronze() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        assert!(run(&config, Stage::Silver).await.is_err());
    }

    #[test]
    fn test_missing_discovery_results_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        assert!(run_bronze(&config).is_err());
    }

    #[test]
    fn test_stage_selection() {
        assert!(Stage::All.includes(Stage::Gold));
        assert!(Stage::Silver.includes(Stage::Silver));
        assert!(!Stage::Bronze.includes(Stage::Silver));
    }
}
