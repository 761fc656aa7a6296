//! Partition consolidation into a unified table and manifest.

use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::Result;
use crate::partition::{resolve_rows, Partition, PartitionRow, SkipReason, SkippedPartition};
use crate::store::PartitionStore;

/// Summary of one region's partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub region_id: String,
    pub record_count: usize,
    pub date_min: NaiveDate,
    pub date_max: NaiveDate,
    pub product: Option<String>,
    pub ingestion_timestamp: DateTime<Utc>,
    pub cloud_cover_mean: f64,
    /// Distinct granule ids
    pub granule_count: usize,
    pub has_missing_dates: bool,
    /// Calendar days in `date_min..=date_max` without a row
    pub missing_date_count: u64,
}

/// Result of one consolidation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsolidationReport<R> {
    pub run_id: Uuid,
    pub table: Vec<R>,
    pub manifest: Vec<ManifestEntry>,
    pub skipped: Vec<SkippedPartition>,
}

impl<R> ConsolidationReport<R> {
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}

/// Build a manifest entry from a non-empty partition.
///
/// `product` falls back to `default_product` when no row names one.
pub fn manifest_entry<R: PartitionRow>(
    region_id: &str,
    rows: &[R],
    default_product: Option<&str>,
    now: DateTime<Utc>,
) -> Option<ManifestEntry> {
    let dates: BTreeSet<NaiveDate> = rows.iter().map(PartitionRow::date).collect();
    let date_min = *dates.first()?;
    let date_max = *dates.last()?;

    let span = (date_max - date_min).num_days() as u64 + 1;
    let missing_date_count = span - dates.len() as u64;

    let granules: HashSet<&str> = rows.iter().map(PartitionRow::granule_id).collect();
    let cloud_cover_mean =
        rows.iter().map(PartitionRow::cloud_cover).sum::<f64>() / rows.len() as f64;

    let product = rows
        .iter()
        .find_map(PartitionRow::product)
        .or(default_product)
        .map(str::to_string);

    Some(ManifestEntry {
        region_id: region_id.to_string(),
        record_count: rows.len(),
        date_min,
        date_max,
        product,
        ingestion_timestamp: now,
        cloud_cover_mean,
        granule_count: granules.len(),
        has_missing_dates: missing_date_count > 0,
        missing_date_count,
    })
}

/// Merge region partitions into one table sorted by (region, date, granule).
///
/// Partitions that fail to resolve, are malformed, empty, or repeat an
/// already seen key are skipped and reported; they never abort the run.
pub fn consolidate<R, I>(partitions: I, default_product: Option<&str>) -> ConsolidationReport<R>
where
    R: PartitionRow,
    I: IntoIterator<Item = (String, Partition<Vec<R>>)>,
{
    let run_id = Uuid::new_v4();
    let now = Utc::now();
    let mut seen = HashSet::new();
    let mut table = Vec::new();
    let mut manifest = Vec::new();
    let mut skipped = Vec::new();

    for (region_id, partition) in partitions {
        let outcome = if seen.insert(region_id.clone()) {
            resolve_rows(&region_id, partition)
        } else {
            Err(SkipReason::Malformed("duplicate partition key".to_string()))
        };

        match outcome {
            Ok(rows) => {
                if let Some(entry) = manifest_entry(&region_id, &rows, default_product, now) {
                    manifest.push(entry);
                }
                table.extend(rows);
            }
            Err(reason) => {
                warn!(%run_id, region = %region_id, reason = %reason, "Skipping partition");
                metrics::counter!("lst_partitions_skipped_total", "stage" => "consolidate")
                    .increment(1);
                skipped.push(SkippedPartition { region_id, reason });
            }
        }
    }

    table.sort_by(|a, b| {
        a.region_id()
            .cmp(b.region_id())
            .then_with(|| a.date().cmp(&b.date()))
            .then_with(|| a.granule_id().cmp(b.granule_id()))
    });
    manifest.sort_by(|a, b| a.region_id.cmp(&b.region_id));

    info!(
        %run_id,
        rows = table.len(),
        partitions = manifest.len(),
        skipped = skipped.len(),
        "Consolidation complete"
    );

    ConsolidationReport {
        run_id,
        table,
        manifest,
        skipped,
    }
}

/// Consolidate every partition of a store, loading each lazily.
pub fn consolidate_store<R>(
    store: &PartitionStore,
    default_product: Option<&str>,
) -> Result<ConsolidationReport<R>>
where
    R: PartitionRow + DeserializeOwned + Send + 'static,
{
    let partitions = store.load_lazy::<R>()?;
    Ok(consolidate(partitions, default_product))
}
