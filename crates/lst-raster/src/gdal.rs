//! Subdataset reader backed by the GDAL command-line tools.

use std::path::Path;
use std::process::Command;

use tracing::{debug, warn};

use crate::tiff::decode_tiff;
use crate::{RasterError, RasterGrid, RasterResult, SubdatasetReader};

/// Extracts subdatasets from HDF containers with `gdalinfo` and `gdal_translate`.
#[derive(Debug, Clone)]
pub struct GdalCliReader {
    gdalinfo: String,
    gdal_translate: String,
}

impl Default for GdalCliReader {
    fn default() -> Self {
        Self {
            gdalinfo: "gdalinfo".to_string(),
            gdal_translate: "gdal_translate".to_string(),
        }
    }
}

impl GdalCliReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use explicit tool binaries instead of the ones on `PATH`.
    pub fn with_binaries(gdalinfo: impl Into<String>, gdal_translate: impl Into<String>) -> Self {
        Self {
            gdalinfo: gdalinfo.into(),
            gdal_translate: gdal_translate.into(),
        }
    }

    fn list_subdatasets(&self, tile: &Path) -> RasterResult<String> {
        let output = Command::new(&self.gdalinfo)
            .arg(tile)
            .output()
            .map_err(|e| RasterError::Command(format!("Failed to run {}: {}", self.gdalinfo, e)))?;

        if !output.status.success() {
            warn!(
                tile = %tile.display(),
                stderr = %String::from_utf8_lossy(&output.stderr),
                "gdalinfo could not open tile"
            );
            return Err(RasterError::TileUnavailable(tile.display().to_string()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl SubdatasetReader for GdalCliReader {
    fn name(&self) -> &'static str {
        "gdal-cli"
    }

    fn read_subdataset(&self, tile: &Path, subdataset: &str) -> RasterResult<RasterGrid> {
        if !tile.is_file() {
            return Err(RasterError::TileUnavailable(tile.display().to_string()));
        }

        let info = self.list_subdatasets(tile)?;
        let source = find_subdataset(&info, subdataset).ok_or_else(|| {
            RasterError::SubdatasetNotFound {
                name: subdataset.to_string(),
                tile: tile.display().to_string(),
            }
        })?;

        debug!(source = %source, "Translating subdataset to GeoTIFF");

        let tmp = tempfile::Builder::new().suffix(".tif").tempfile()?;
        let output = Command::new(&self.gdal_translate)
            .args(["-of", "GTiff"])
            .arg(&source)
            .arg(tmp.path())
            .output()
            .map_err(|e| {
                RasterError::Command(format!("Failed to run {}: {}", self.gdal_translate, e))
            })?;

        if !output.status.success() {
            return Err(RasterError::Command(format!(
                "gdal_translate failed: {}",
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        decode_tiff(tmp.path())
    }
}

/// Find the GDAL subdataset path whose last component is `name`.
///
/// Scans `SUBDATASET_<n>_NAME=` lines of `gdalinfo` output, e.g.
/// `SUBDATASET_1_NAME=HDF4_EOS:EOS_GRID:"f.hdf":MODIS_Grid_Daily_1km_LST:LST_Day_1km`.
pub fn find_subdataset(gdalinfo_output: &str, name: &str) -> Option<String> {
    gdalinfo_output
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with("SUBDATASET_"))
        .filter_map(|line| line.split_once('='))
        .filter(|(key, _)| key.ends_with("_NAME"))
        .map(|(_, value)| value.trim())
        .find(|value| value.rsplit(':').next() == Some(name))
        .map(str::to_string)
}
