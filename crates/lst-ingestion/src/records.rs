//! Bronze and silver row types.

use chrono::{DateTime, NaiveDate, Utc};
use climate_metrics::{degree_days, uhi_index};
use lst_common::BoundingBox;
use serde::{Deserialize, Serialize};

use crate::config::MetricConfig;
use crate::extract::{ExtractionFailure, LstStats};

/// A link attached to a granule by the search API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadLink {
    pub href: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rel: Option<String>,
}

/// One normalized granule of one region (bronze row).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GranuleRecord {
    pub region_id: String,
    pub granule_id: String,
    pub title: Option<String>,
    pub time_start: DateTime<Utc>,
    pub time_end: DateTime<Utc>,
    /// Percent, clamped to 0-100
    pub cloud_cover: f64,
    pub product: Option<String>,
    pub bbox: Option<BoundingBox>,
    pub links: Vec<DownloadLink>,
    /// Calendar date of `time_start` (UTC)
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    Pending,
    Processed,
    Failed,
}

/// Which extraction path produced a record's temperatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceMode {
    Raster,
    Mock,
}

impl std::fmt::Display for SourceMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceMode::Raster => write!(f, "raster"),
            SourceMode::Mock => write!(f, "mock"),
        }
    }
}

/// Daily LST metrics for one region-day (silver row).
///
/// Null LST fields mean extraction failed; `failure_reason` says why.
/// `heatwave_flag` and `anomaly_zscore` are filled by the series pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyMetricRecord {
    pub region_id: String,
    pub date: NaiveDate,
    pub granule_id: String,
    pub title: Option<String>,
    pub product: Option<String>,
    pub time_start: DateTime<Utc>,
    pub time_end: DateTime<Utc>,
    pub cloud_cover: f64,

    pub lst_mean_c: Option<f64>,
    pub lst_min_c: Option<f64>,
    pub lst_max_c: Option<f64>,
    pub lst_std_c: Option<f64>,
    pub lst_mean_k: Option<f64>,
    pub valid_pixel_count: Option<u64>,
    pub total_pixel_count: Option<u64>,

    pub cdd: Option<f64>,
    pub hdd: Option<f64>,
    pub uhi_index: Option<f64>,
    pub heatwave_flag: bool,
    pub anomaly_zscore: Option<f64>,

    pub data_quality_flag: bool,
    pub processing_status: ProcessingStatus,
    pub source_mode: SourceMode,
    pub failure_reason: Option<String>,
}

impl DailyMetricRecord {
    /// A pending record carrying the granule's reference fields.
    pub fn pending(granule: &GranuleRecord, mode: SourceMode, metrics: &MetricConfig) -> Self {
        Self {
            region_id: granule.region_id.clone(),
            date: granule.date,
            granule_id: granule.granule_id.clone(),
            title: granule.title.clone(),
            product: granule.product.clone(),
            time_start: granule.time_start,
            time_end: granule.time_end,
            cloud_cover: granule.cloud_cover,
            lst_mean_c: None,
            lst_min_c: None,
            lst_max_c: None,
            lst_std_c: None,
            lst_mean_k: None,
            valid_pixel_count: None,
            total_pixel_count: None,
            cdd: None,
            hdd: None,
            uhi_index: None,
            heatwave_flag: false,
            anomaly_zscore: None,
            data_quality_flag: granule.cloud_cover < metrics.cloud_cover_threshold,
            processing_status: ProcessingStatus::Pending,
            source_mode: mode,
            failure_reason: None,
        }
    }

    /// Fill LST fields and the per-record metrics, marking the record processed.
    pub fn apply_stats(&mut self, stats: &LstStats, metrics: &MetricConfig) {
        self.lst_mean_c = Some(stats.mean_c);
        self.lst_min_c = Some(stats.min_c);
        self.lst_max_c = Some(stats.max_c);
        self.lst_std_c = Some(stats.std_c);
        self.lst_mean_k = Some(stats.mean_k);
        self.valid_pixel_count = Some(stats.valid_pixel_count);
        self.total_pixel_count = Some(stats.total_pixel_count);

        let dd = degree_days(stats.mean_c, metrics.base_temp_c);
        self.cdd = Some(dd.cdd);
        self.hdd = Some(dd.hdd);
        self.uhi_index = Some(uhi_index(stats.mean_c, metrics.rural_baseline_c));

        self.processing_status = ProcessingStatus::Processed;
        self.failure_reason = None;
    }

    /// Null every derived field and record why extraction failed.
    pub fn mark_failed(&mut self, failure: &ExtractionFailure) {
        self.lst_mean_c = None;
        self.lst_min_c = None;
        self.lst_max_c = None;
        self.lst_std_c = None;
        self.lst_mean_k = None;
        self.valid_pixel_count = None;
        self.total_pixel_count = None;
        self.cdd = None;
        self.hdd = None;
        self.uhi_index = None;
        self.anomaly_zscore = None;
        self.heatwave_flag = false;
        self.processing_status = ProcessingStatus::Failed;
        self.failure_reason = Some(failure.to_string());
    }

    pub fn is_processed(&self) -> bool {
        self.processing_status == ProcessingStatus::Processed
    }

    /// Mean LST for the series passes, NaN when missing.
    pub fn mean_or_nan(&self) -> f64 {
        self.lst_mean_c.unwrap_or(f64::NAN)
    }
}
