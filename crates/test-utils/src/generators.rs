//! Test data generators for synthetic LST rasters.
//!
//! Values are raw MODIS LST counts: Kelvin divided by the 0.02 scale factor.

use std::path::Path;

use image::{ImageBuffer, Luma};

/// Raw count whose decoded temperature is `celsius`.
pub fn celsius_to_raw(celsius: f64) -> u16 {
    ((celsius + 273.15) / 0.02).round() as u16
}

/// Creates a grid whose decoded values ramp linearly from `min_c` to `max_c`
/// in row-major order.
pub fn create_lst_grid(width: usize, height: usize, min_c: f64, max_c: f64) -> Vec<u16> {
    let n = width * height;
    (0..n)
        .map(|i| {
            let t = if n > 1 { i as f64 / (n - 1) as f64 } else { 0.0 };
            celsius_to_raw(min_c + t * (max_c - min_c))
        })
        .collect()
}

/// Writes a single-band 16-bit TIFF.
///
/// # Panics
///
/// Panics when `data` does not hold `width * height` values or the file
/// cannot be written; both indicate a broken test.
pub fn write_lst_tiff(path: &Path, width: u32, height: u32, data: &[u16]) {
    let buf: ImageBuffer<Luma<u16>, Vec<u16>> =
        ImageBuffer::from_raw(width, height, data.to_vec()).expect("buffer matches dimensions");
    buf.save(path).expect("Failed to write test TIFF");
}
