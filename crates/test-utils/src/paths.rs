//! Path utilities for locating test data files.
//!
//! Real MODIS granules are large, so tests that need one look them up here
//! and skip when they are absent (see `require_test_file!`).

use std::path::PathBuf;

/// Returns the workspace root directory.
pub fn workspace_root() -> PathBuf {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    PathBuf::from(manifest_dir)
        .parent() // crates/
        .and_then(|p| p.parent()) // workspace root
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from(manifest_dir))
}

/// Returns `crates/{crate_name}/testdata/`.
pub fn crate_testdata_dir(crate_name: &str) -> PathBuf {
    workspace_root()
        .join("crates")
        .join(crate_name)
        .join("testdata")
}

/// Searches for a test file in multiple locations.
///
/// Checks, in order:
/// 1. Environment variable `TEST_DATA_DIR` (if set)
/// 2. `crates/lst-raster/testdata/`
/// 3. workspace-level `testdata/`
pub fn find_test_file(name: &str) -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(test_data_dir) = std::env::var("TEST_DATA_DIR") {
        candidates.push(PathBuf::from(test_data_dir).join(name));
    }

    candidates.extend([
        crate_testdata_dir("lst-raster").join(name),
        workspace_root().join("testdata").join(name),
    ]);

    candidates.into_iter().find(|path| path.exists())
}
