//! Bronze stage: discovery results → per-region granule partitions.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use lst_common::{BoundingBox, Region};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::discovery::{load_payload, DiscoveryResults, DiscoveryStatus, RegionDiscoveryResult};
use crate::normalize::normalize;
use crate::records::GranuleRecord;

/// What happened to one region during the bronze stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RegionStatus {
    Ingested {
        records: usize,
        dropped: usize,
        duplicates: usize,
    },
    Skipped {
        reason: String,
    },
}

/// Bronze partitions plus a status for every region seen.
#[derive(Debug, Clone, Default)]
pub struct BronzeBatch {
    pub partitions: BTreeMap<String, Vec<GranuleRecord>>,
    pub statuses: BTreeMap<String, RegionStatus>,
}

impl BronzeBatch {
    pub fn ingested_count(&self) -> usize {
        self.partitions.len()
    }

    pub fn skipped_count(&self) -> usize {
        self.statuses
            .values()
            .filter(|s| matches!(s, RegionStatus::Skipped { .. }))
            .count()
    }

    pub fn record_count(&self) -> usize {
        self.partitions.values().map(Vec::len).sum()
    }
}

/// Normalize every successful region's payload.
///
/// Relative `file_path`s are resolved against `base_dir`. A region whose
/// discovery failed, whose payload is missing or unreadable, or which yields
/// no valid granules is skipped with a reason; the other regions proceed.
pub fn prepare_bronze(results: &DiscoveryResults, base_dir: &Path) -> BronzeBatch {
    let mut batch = BronzeBatch::default();

    for (region_id, result) in results {
        let status = match ingest_region(region_id, result, base_dir) {
            Ok((records, dropped, duplicates)) => {
                let status = RegionStatus::Ingested {
                    records: records.len(),
                    dropped,
                    duplicates,
                };
                info!(
                    region = %region_id,
                    records = records.len(),
                    dropped,
                    duplicates,
                    "Region ingested"
                );
                batch.partitions.insert(region_id.clone(), records);
                status
            }
            Err(reason) => {
                warn!(region = %region_id, reason = %reason, "Skipping region");
                metrics::counter!("lst_regions_skipped_total", "stage" => "bronze").increment(1);
                RegionStatus::Skipped { reason }
            }
        };
        batch.statuses.insert(region_id.clone(), status);
    }

    batch
}

fn ingest_region(
    region_id: &str,
    result: &RegionDiscoveryResult,
    base_dir: &Path,
) -> Result<(Vec<GranuleRecord>, usize, usize), String> {
    if result.status != DiscoveryStatus::Success {
        return Err(format!(
            "discovery failed: {}",
            result.error_message.as_deref().unwrap_or("unknown error")
        ));
    }

    let path = result
        .file_path
        .as_ref()
        .map(|p| resolve_path(base_dir, p))
        .ok_or_else(|| "no payload file path".to_string())?;

    let payload =
        load_payload(&path).map_err(|e| format!("cannot read {}: {}", path.display(), e))?;

    if payload.granules.is_empty() {
        return Err("no granules".to_string());
    }

    let normalized = normalize(region_id, &payload);
    if normalized.records.is_empty() {
        return Err(format!(
            "no valid granules ({} dropped)",
            normalized.dropped
        ));
    }

    Ok((normalized.records, normalized.dropped, normalized.duplicates))
}

fn resolve_path(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

// ============================================================================
// Region metadata
// ============================================================================

/// Per-region ingestion metadata row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BronzeMetadataRow {
    pub region_id: String,
    pub region_name: String,
    pub bbox: BoundingBox,
    /// `success`, `error` or `unknown` when discovery never ran for the region
    pub discovery_status: String,
    pub date_start: Option<NaiveDate>,
    pub date_end: Option<NaiveDate>,
    pub file_path: Option<PathBuf>,
    pub error_message: Option<String>,
    pub ingestion_timestamp: DateTime<Utc>,
}

/// One metadata row per configured region.
pub fn bronze_metadata(
    results: &DiscoveryResults,
    regions: &[Region],
    now: DateTime<Utc>,
) -> Vec<BronzeMetadataRow> {
    regions
        .iter()
        .map(|region| {
            let result = results.get(&region.id);
            BronzeMetadataRow {
                region_id: region.id.clone(),
                region_name: region.name.clone(),
                bbox: region.bbox,
                discovery_status: result
                    .map(|r| r.status.to_string())
                    .unwrap_or_else(|| "unknown".to_string()),
                date_start: result.and_then(|r| r.date_range).map(|d| d.start),
                date_end: result.and_then(|r| r.date_range).map(|d| d.end),
                file_path: result.and_then(|r| r.file_path.clone()),
                error_message: result.and_then(|r| r.error_message.clone()),
                ingestion_timestamp: now,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lst_common::builtin_regions;
    use serde_json::json;

    #[test]
    fn test_metadata_marks_unknown_regions() {
        let results: DiscoveryResults = serde_json::from_value(json!({
            "NYC001": {
                "status": "success",
                "file_path": "nyc.json",
                "date_range": {"start": "2024-07-01", "end": "2024-07-31"}
            },
            "LAX001": {"status": "error", "error_message": "timeout"}
        }))
        .unwrap();

        let rows = bronze_metadata(&results, &builtin_regions(), Utc::now());
        assert_eq!(rows.len(), 4);

        let by_id: BTreeMap<_, _> = rows.iter().map(|r| (r.region_id.as_str(), r)).collect();
        assert_eq!(by_id["NYC001"].discovery_status, "success");
        assert_eq!(by_id["NYC001"].date_end.unwrap().to_string(), "2024-07-31");
        assert_eq!(by_id["LAX001"].discovery_status, "error");
        assert_eq!(by_id["CHI001"].discovery_status, "unknown");
        assert!(by_id["CHI001"].file_path.is_none());
    }

    #[test]
    fn test_failed_discovery_is_skipped() {
        let results: DiscoveryResults = serde_json::from_value(json!({
            "LAX001": {"status": "error", "error_message": "timeout"},
            "MIA001": {"status": "success"}
        }))
        .unwrap();

        let batch = prepare_bronze(&results, Path::new("."));
        assert_eq!(batch.ingested_count(), 0);
        assert_eq!(batch.skipped_count(), 2);
        assert!(matches!(
            &batch.statuses["LAX001"],
            RegionStatus::Skipped { reason } if reason.contains("timeout")
        ));
    }

    #[test]
    fn test_relative_paths_resolve_against_base() {
        assert_eq!(
            resolve_path(Path::new("/data/raw"), Path::new("nyc.json")),
            PathBuf::from("/data/raw/nyc.json")
        );
        assert_eq!(
            resolve_path(Path::new("/data/raw"), Path::new("/abs/nyc.json")),
            PathBuf::from("/abs/nyc.json")
        );
    }

    #[test]
    fn test_mistyped_granule_field_keeps_region() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("nyc.json"),
            serde_json::to_vec(&json!({
                "region": [-74.3, 40.5, -73.7, 40.9],
                "product": "MOD11A1",
                "granules": [
                    {"id": "G1", "time_start": "2024-07-01T15:30:00Z"},
                    {"id": "G2", "time_start": "2024-07-02T15:30:00Z", "title": 42},
                    {"id": {"nested": true}, "time_start": "2024-07-03T15:30:00Z"}
                ]
            }))
            .unwrap(),
        )
        .unwrap();
        let results: DiscoveryResults = serde_json::from_value(json!({
            "NYC001": {"status": "success", "file_path": "nyc.json"}
        }))
        .unwrap();

        let batch = prepare_bronze(&results, dir.path());
        assert_eq!(batch.ingested_count(), 1);
        assert_eq!(batch.partitions["NYC001"].len(), 2);
        assert_eq!(
            batch.statuses["NYC001"],
            RegionStatus::Ingested {
                records: 2,
                dropped: 1,
                duplicates: 0
            }
        );
    }
}
