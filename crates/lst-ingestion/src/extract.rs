//! Raster metric extraction and the mock temperature generator.

use std::path::Path;

use climate_metrics::round_to;
use lst_common::BoundingBox;
use lst_raster::{RasterError, RasterGrid, SubdatasetReader};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::LstDecoding;

/// Summary statistics of the valid pixels of one tile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LstStats {
    pub mean_c: f64,
    pub min_c: f64,
    pub max_c: f64,
    /// Population standard deviation
    pub std_c: f64,
    pub mean_k: f64,
    pub valid_pixel_count: u64,
    pub total_pixel_count: u64,
}

/// Why a single granule produced no temperatures.
///
/// Recorded on the silver row; never aborts the run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExtractionFailure {
    #[error("no download URL among granule links")]
    NoDownloadUrl,

    #[error("download failed: {0}")]
    DownloadFailed(String),

    #[error("cannot open tile: {0}")]
    TileUnavailable(String),

    #[error("subdataset '{0}' not found")]
    SubdatasetMissing(String),

    #[error("raster decode failed: {0}")]
    Decode(String),

    #[error("no valid pixels ({total} total)")]
    NoValidPixels { total: u64 },
}

impl From<RasterError> for ExtractionFailure {
    fn from(e: RasterError) -> Self {
        match e {
            RasterError::Io(e) => ExtractionFailure::TileUnavailable(e.to_string()),
            RasterError::TileUnavailable(tile) => ExtractionFailure::TileUnavailable(tile),
            RasterError::Command(msg) => ExtractionFailure::TileUnavailable(msg),
            RasterError::SubdatasetNotFound { name, .. } => {
                ExtractionFailure::SubdatasetMissing(name)
            }
            RasterError::Decode(msg) | RasterError::UnsupportedPixelFormat(msg) => {
                ExtractionFailure::Decode(msg)
            }
        }
    }
}

/// Mask invalid counts, convert to temperatures and summarize.
pub fn compute_stats(grid: &RasterGrid, decoding: &LstDecoding) -> Result<LstStats, ExtractionFailure> {
    let total = grid.len() as u64;
    let kelvin: Vec<f64> = grid
        .data
        .iter()
        .filter(|&&raw| decoding.is_valid(raw))
        .map(|&raw| decoding.to_kelvin(raw))
        .collect();

    if kelvin.is_empty() {
        return Err(ExtractionFailure::NoValidPixels { total });
    }

    let n = kelvin.len() as f64;
    let mean_k = kelvin.iter().sum::<f64>() / n;
    let variance = kelvin.iter().map(|k| (k - mean_k).powi(2)).sum::<f64>() / n;
    let (min_k, max_k) = kelvin
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &k| (lo.min(k), hi.max(k)));

    Ok(LstStats {
        mean_c: mean_k - decoding.kelvin_offset,
        min_c: min_k - decoding.kelvin_offset,
        max_c: max_k - decoding.kelvin_offset,
        std_c: variance.sqrt(),
        mean_k,
        valid_pixel_count: kelvin.len() as u64,
        total_pixel_count: total,
    })
}

/// Reads the LST subdataset of a tile and summarizes it.
pub struct RasterExtractor {
    reader: Box<dyn SubdatasetReader>,
    decoding: LstDecoding,
}

impl RasterExtractor {
    pub fn new(reader: Box<dyn SubdatasetReader>, decoding: LstDecoding) -> Self {
        Self { reader, decoding }
    }

    pub fn reader_name(&self) -> &'static str {
        self.reader.name()
    }

    /// Statistics over the whole tile.
    ///
    /// MODIS tiles are on a sinusoidal grid, so the region bbox is only
    /// logged; no geographic windowing is applied.
    pub fn extract(
        &self,
        tile: &Path,
        region_bbox: Option<&BoundingBox>,
    ) -> Result<LstStats, ExtractionFailure> {
        debug!(
            tile = %tile.display(),
            reader = self.reader.name(),
            bbox = ?region_bbox,
            "Extracting LST"
        );
        let grid = self.reader.read_subdataset(tile, &self.decoding.subdataset)?;
        compute_stats(&grid, &self.decoding)
    }
}

impl std::fmt::Debug for RasterExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterExtractor")
            .field("reader", &self.reader.name())
            .field("decoding", &self.decoding)
            .finish()
    }
}

// ============================================================================
// Mock mode
// ============================================================================

/// Plausible random temperatures for runs without raster access.
#[derive(Debug, Clone)]
pub struct MockLstGenerator {
    rng: StdRng,
}

impl MockLstGenerator {
    /// Deterministic with a seed, entropy-seeded otherwise.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }

    /// mean = 20 + U(-5, 10) °C, min/max = mean ∓ 3, rounded to 2 decimals.
    pub fn sample(&mut self) -> LstStats {
        let mean_c = round_to(20.0 + self.rng.gen_range(-5.0..10.0), 2);
        let min_c = round_to(mean_c - 3.0, 2);
        let max_c = round_to(mean_c + 3.0, 2);
        LstStats {
            mean_c,
            min_c,
            max_c,
            // std of a uniform spread over [min, max]
            std_c: round_to((max_c - min_c) / 12f64.sqrt(), 2),
            mean_k: round_to(mean_c + 273.15, 2),
            valid_pixel_count: 0,
            total_pixel_count: 0,
        }
    }
}
