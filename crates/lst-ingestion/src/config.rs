//! Explicit configuration structs passed into the pipeline stages.
//!
//! Nothing in this crate reads environment variables; the service builds
//! these from its YAML/env configuration and hands them down.

use std::path::PathBuf;

use climate_metrics::{
    HeatwaveParams, DEFAULT_ANOMALY_WINDOW, DEFAULT_BASE_TEMP_C, DEFAULT_RURAL_BASELINE_C,
};
use serde::{Deserialize, Serialize};

use crate::error::{IngestionError, Result};

/// Records with cloud cover strictly below this are flagged as good quality.
pub const DEFAULT_CLOUD_COVER_THRESHOLD: f64 = 50.0;

/// Host fragment identifying LP DAAC data links.
pub const DEFAULT_URL_HOST_MARKER: &str = "data.lpdaac";

// ============================================================================
// Metric parameters
// ============================================================================

/// Parameters of the per-record and per-series climate metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricConfig {
    /// Degree-day base temperature (°C)
    pub base_temp_c: f64,
    /// Rural reference temperature for the UHI index (°C)
    pub rural_baseline_c: f64,
    pub heatwave: HeatwaveParams,
    /// Trailing window of the anomaly z-score, in observations
    pub anomaly_window: usize,
    /// Cloud cover (%) below which a record is good quality
    pub cloud_cover_threshold: f64,
}

impl Default for MetricConfig {
    fn default() -> Self {
        Self {
            base_temp_c: DEFAULT_BASE_TEMP_C,
            rural_baseline_c: DEFAULT_RURAL_BASELINE_C,
            heatwave: HeatwaveParams::default(),
            anomaly_window: DEFAULT_ANOMALY_WINDOW,
            cloud_cover_threshold: DEFAULT_CLOUD_COVER_THRESHOLD,
        }
    }
}

impl MetricConfig {
    pub fn validate(&self) -> Result<()> {
        let temps = [
            ("base_temp_c", self.base_temp_c),
            ("rural_baseline_c", self.rural_baseline_c),
            ("heatwave.threshold_c", self.heatwave.threshold_c),
        ];
        for (name, value) in temps {
            if !value.is_finite() {
                return Err(IngestionError::InvalidConfig(format!(
                    "{} must be finite, got {}",
                    name, value
                )));
            }
        }
        if !(0.0..=100.0).contains(&self.cloud_cover_threshold) {
            return Err(IngestionError::InvalidConfig(format!(
                "cloud_cover_threshold must be within 0-100, got {}",
                self.cloud_cover_threshold
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Raster extraction
// ============================================================================

/// How raw subdataset counts map to temperatures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LstDecoding {
    pub subdataset: String,
    pub scale_factor: f64,
    /// Smallest valid raw count (inclusive)
    pub valid_min: u16,
    /// Largest valid raw count (inclusive)
    pub valid_max: u16,
    pub kelvin_offset: f64,
}

impl Default for LstDecoding {
    fn default() -> Self {
        // MOD11A1 daytime LST
        Self {
            subdataset: "LST_Day_1km".to_string(),
            scale_factor: 0.02,
            valid_min: 7500,
            valid_max: 65535,
            kelvin_offset: 273.15,
        }
    }
}

impl LstDecoding {
    pub fn is_valid(&self, raw: u16) -> bool {
        raw >= self.valid_min && raw <= self.valid_max
    }

    pub fn to_kelvin(&self, raw: u16) -> f64 {
        raw as f64 * self.scale_factor
    }
}

/// Which [`lst_raster::SubdatasetReader`] opens downloaded tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RasterBackend {
    /// GeoTIFF exports read with the `image` crate
    Tiff,
    /// HDF tiles read through `gdalinfo`/`gdal_translate`
    #[default]
    GdalCli,
}

/// Where tiles come from when raster access is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TileSource {
    /// Download over HTTPS into the download directory
    #[default]
    Http,
    /// Look tiles up under the download directory without network access
    Local,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Real raster extraction when true, mock temperatures otherwise
    pub enable_download: bool,
    pub download_dir: PathBuf,
    pub auth_token: Option<String>,
    pub tile_source: TileSource,
    pub backend: RasterBackend,
    pub decoding: LstDecoding,
    pub url_host_marker: String,
    pub request_timeout_secs: u64,
    /// Seed for mock mode; entropy when unset
    pub mock_seed: Option<u64>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            enable_download: false,
            download_dir: PathBuf::from("./data/raw/tiles"),
            auth_token: None,
            tile_source: TileSource::default(),
            backend: RasterBackend::default(),
            decoding: LstDecoding::default(),
            url_host_marker: DEFAULT_URL_HOST_MARKER.to_string(),
            request_timeout_secs: 300,
            mock_seed: None,
        }
    }
}

impl ExtractionConfig {
    pub fn validate(&self) -> Result<()> {
        let d = &self.decoding;
        if d.subdataset.is_empty() {
            return Err(IngestionError::InvalidConfig(
                "decoding.subdataset must not be empty".to_string(),
            ));
        }
        if !(d.scale_factor.is_finite() && d.scale_factor > 0.0) {
            return Err(IngestionError::InvalidConfig(format!(
                "decoding.scale_factor must be positive, got {}",
                d.scale_factor
            )));
        }
        if d.valid_min > d.valid_max {
            return Err(IngestionError::InvalidConfig(format!(
                "decoding valid range is inverted: {} > {}",
                d.valid_min, d.valid_max
            )));
        }
        Ok(())
    }
}
