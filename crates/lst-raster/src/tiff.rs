//! GeoTIFF subdataset reader.

use std::path::{Path, PathBuf};

use image::DynamicImage;
use tracing::debug;

use crate::{RasterError, RasterGrid, RasterResult, SubdatasetReader};

const TIFF_EXTENSIONS: [&str; 2] = ["tif", "tiff"];

/// Reads subdatasets that were exported as single-band GeoTIFF files.
#[derive(Debug, Clone, Copy, Default)]
pub struct TiffReader;

impl TiffReader {
    pub fn new() -> Self {
        Self
    }

    /// Resolve the file holding `subdataset` for the given tile reference.
    fn locate(&self, tile: &Path, subdataset: &str) -> RasterResult<PathBuf> {
        if tile.is_dir() {
            return TIFF_EXTENSIONS
                .iter()
                .map(|ext| tile.join(format!("{}.{}", subdataset, ext)))
                .find(|candidate| candidate.is_file())
                .ok_or_else(|| RasterError::SubdatasetNotFound {
                    name: subdataset.to_string(),
                    tile: tile.display().to_string(),
                });
        }

        if !tile.is_file() {
            return Err(RasterError::TileUnavailable(tile.display().to_string()));
        }

        let is_tiff = tile
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| TIFF_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        let names_subdataset = tile
            .file_stem()
            .and_then(|s| s.to_str())
            .map(|s| s.contains(subdataset))
            .unwrap_or(false);

        if is_tiff && names_subdataset {
            Ok(tile.to_path_buf())
        } else {
            Err(RasterError::SubdatasetNotFound {
                name: subdataset.to_string(),
                tile: tile.display().to_string(),
            })
        }
    }
}

impl SubdatasetReader for TiffReader {
    fn name(&self) -> &'static str {
        "tiff"
    }

    fn read_subdataset(&self, tile: &Path, subdataset: &str) -> RasterResult<RasterGrid> {
        let path = self.locate(tile, subdataset)?;
        debug!(path = %path.display(), subdataset = %subdataset, "Reading TIFF subdataset");
        decode_tiff(&path)
    }
}

/// Decode a single-band 8 or 16-bit TIFF into raw counts.
pub fn decode_tiff(path: &Path) -> RasterResult<RasterGrid> {
    let img = image::io::Reader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(|e| RasterError::Decode(format!("{}: {}", path.display(), e)))?;

    match img {
        DynamicImage::ImageLuma16(buf) => {
            let (w, h) = buf.dimensions();
            RasterGrid::new(w as usize, h as usize, buf.into_raw())
        }
        DynamicImage::ImageLuma8(buf) => {
            let (w, h) = buf.dimensions();
            let data = buf.into_raw().into_iter().map(u16::from).collect();
            RasterGrid::new(w as usize, h as usize, data)
        }
        other => Err(RasterError::UnsupportedPixelFormat(format!(
            "{:?}",
            other.color()
        ))),
    }
}
