//! Raster-mode silver processing against synthetic GeoTIFF tiles.

use std::fs;
use std::path::Path;

use lst_ingestion::{
    prepare_bronze, DiscoveryResults, GranuleRecord, LocalTileDirectory, LstDecoding, LstSource,
    MetricConfig, ProcessingStatus, RasterExtractor, RegionDiscoveryResult, SilverProcessor,
    SourceMode,
};
use lst_raster::TiffReader;
use serde_json::json;
use test_utils::{
    bbox, celsius_to_raw, create_lst_grid, daily_granules, search_payload, write_lst_tiff,
};

const SUBDATASET: &str = "LST_Day_1km";

fn tiff_processor(tile_root: &Path) -> SilverProcessor {
    SilverProcessor::new(
        MetricConfig::default(),
        LstSource::Raster {
            fetcher: Box::new(LocalTileDirectory::new(tile_root)),
            extractor: RasterExtractor::new(Box::new(TiffReader::new()), LstDecoding::default()),
        },
    )
}

/// Write `<root>/NYC001/<granule_id>/LST_Day_1km.tif`.
fn write_tile(root: &Path, granule_id: &str, data: &[u16]) {
    let dir = root.join("NYC001").join(granule_id);
    fs::create_dir_all(&dir).unwrap();
    write_lst_tiff(&dir.join(format!("{}.tif", SUBDATASET)), 4, 4, data);
}

fn nyc_granules(dir: &Path, days: usize) -> Vec<GranuleRecord> {
    let payload_path = dir.join("nyc.json");
    fs::write(
        &payload_path,
        serde_json::to_vec(&search_payload(bbox::NYC, daily_granules("NYC001", days, 5.0))).unwrap(),
    )
    .unwrap();
    let results: DiscoveryResults = [(
        "NYC001".to_string(),
        serde_json::from_value::<RegionDiscoveryResult>(json!({
            "status": "success",
            "file_path": payload_path
        }))
        .unwrap(),
    )]
    .into_iter()
    .collect();
    prepare_bronze(&results, dir).partitions.remove("NYC001").unwrap()
}

#[tokio::test]
async fn test_extracts_stats_from_tiles() {
    let dir = tempfile::tempdir().unwrap();
    let granules = nyc_granules(dir.path(), 1);
    write_tile(dir.path(), &granules[0].granule_id, &create_lst_grid(4, 4, 20.0, 26.0));

    let series = tiff_processor(dir.path()).process_region("NYC001", &granules).await;
    let record = &series.records[0];

    assert_eq!(record.processing_status, ProcessingStatus::Processed);
    assert_eq!(record.source_mode, SourceMode::Raster);
    assert_eq!(record.valid_pixel_count, Some(16));
    assert!((record.lst_mean_c.unwrap() - 23.0).abs() < 0.02);
    assert!((record.lst_min_c.unwrap() - 20.0).abs() < 0.02);
    assert!((record.lst_max_c.unwrap() - 26.0).abs() < 0.02);
    assert!((record.cdd.unwrap() - 5.0).abs() < 0.02);
    assert_eq!(record.hdd, Some(0.0));
}

#[tokio::test]
async fn test_zero_valid_pixels_yields_failed_record() {
    let dir = tempfile::tempdir().unwrap();
    let granules = nyc_granules(dir.path(), 2);
    // fill value 0 everywhere on day one, a warm tile on day two
    write_tile(dir.path(), &granules[0].granule_id, &[0u16; 16]);
    write_tile(dir.path(), &granules[1].granule_id, &[celsius_to_raw(25.0); 16]);

    let series = tiff_processor(dir.path()).process_region("NYC001", &granules).await;
    assert_eq!(series.records.len(), 2);

    let failed = &series.records[0];
    assert_eq!(failed.processing_status, ProcessingStatus::Failed);
    assert!(failed.lst_mean_c.is_none());
    assert!(failed.cdd.is_none());
    assert!(failed.anomaly_zscore.is_none());
    assert!(failed.failure_reason.as_deref().unwrap().contains("no valid pixels"));

    let ok = &series.records[1];
    assert_eq!(ok.processing_status, ProcessingStatus::Processed);
    assert_eq!(series.failed_count(), 1);
}

#[tokio::test]
async fn test_missing_tile_is_a_record_failure() {
    let dir = tempfile::tempdir().unwrap();
    let granules = nyc_granules(dir.path(), 3);
    write_tile(dir.path(), &granules[1].granule_id, &[celsius_to_raw(30.0); 16]);

    let series = tiff_processor(dir.path()).process_region("NYC001", &granules).await;
    let statuses: Vec<ProcessingStatus> =
        series.records.iter().map(|r| r.processing_status).collect();
    assert_eq!(
        statuses,
        vec![
            ProcessingStatus::Failed,
            ProcessingStatus::Processed,
            ProcessingStatus::Failed
        ]
    );
    assert!(series.records[0]
        .failure_reason
        .as_deref()
        .unwrap()
        .contains("cannot open tile"));
}
