//! Raster subdataset access for satellite LST tiles.
//!
//! A downloaded granule (for MODIS, an HDF4-EOS file) holds several gridded
//! subdatasets. The pipeline only needs one of them, as a grid of raw
//! unsigned 16-bit counts, so this crate exposes a single seam:
//! [`SubdatasetReader::read_subdataset`].
//!
//! # Implementation Notes
//!
//! Two readers are provided:
//!
//! - [`TiffReader`] decodes single-band GeoTIFF exports with the `image`
//!   crate. The tile reference is either a directory containing
//!   `<subdataset>.tif` or a TIFF file named after the subdataset.
//! - [`GdalCliReader`] shells out to `gdalinfo` / `gdal_translate` to pull a
//!   subdataset out of an HDF container into a temporary GeoTIFF, then
//!   decodes it like [`TiffReader`]. It requires the GDAL command-line tools
//!   with the HDF4 driver on `PATH`.

mod gdal;
mod tiff;

use std::path::Path;
use thiserror::Error;

pub use gdal::{find_subdataset, GdalCliReader};
pub use tiff::{decode_tiff, TiffReader};

/// Result type for raster operations.
pub type RasterResult<T> = Result<T, RasterError>;

/// Error types for raster access.
#[derive(Error, Debug)]
pub enum RasterError {
    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The tile reference does not point at anything readable
    #[error("Cannot open tile {0}")]
    TileUnavailable(String),

    /// The tile exists but does not carry the requested subdataset
    #[error("Subdataset '{name}' not found in {tile}")]
    SubdatasetNotFound { name: String, tile: String },

    /// Raster bytes could not be decoded
    #[error("Failed to decode raster: {0}")]
    Decode(String),

    /// Pixel layout other than a single 8/16-bit band
    #[error("Unsupported pixel format: {0}")]
    UnsupportedPixelFormat(String),

    /// External tool failure
    #[error("Command execution failed: {0}")]
    Command(String),
}

/// A single band of raw raster counts in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterGrid {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u16>,
}

impl RasterGrid {
    /// Build a grid, checking that the buffer matches the dimensions.
    pub fn new(width: usize, height: usize, data: Vec<u16>) -> RasterResult<Self> {
        if width * height != data.len() {
            return Err(RasterError::Decode(format!(
                "buffer of {} values does not match {}x{} grid",
                data.len(),
                width,
                height
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Total number of pixels.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Reads a named subdataset out of a downloaded tile.
pub trait SubdatasetReader: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Read subdataset `subdataset` from the tile at `tile`.
    fn read_subdataset(&self, tile: &Path, subdataset: &str) -> RasterResult<RasterGrid>;
}
