//! GdalCliReader end to end, with stand-in tool scripts and, when present,
//! a real MOD11A1 granule.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Command;

use lst_raster::{GdalCliReader, RasterError, SubdatasetReader};
use test_utils::{celsius_to_raw, create_lst_grid, require_test_file, write_lst_tiff};

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// A `gdalinfo` that lists the LST subdatasets of whatever file it is given.
fn fake_gdalinfo(dir: &Path) -> PathBuf {
    write_script(
        dir,
        "gdalinfo",
        r#"echo "Driver: HDF4/Hierarchical Data Format Release 4"
echo "Subdatasets:"
echo "  SUBDATASET_1_NAME=HDF4_EOS:EOS_GRID:\"$1\":MODIS_Grid_Daily_1km_LST:LST_Day_1km"
echo "  SUBDATASET_1_DESC=[4x3] LST_Day_1km (16-bit unsigned integer)"
echo "  SUBDATASET_2_NAME=HDF4_EOS:EOS_GRID:\"$1\":MODIS_Grid_Daily_1km_LST:QC_Day""#,
    )
}

fn fake_tile(dir: &Path) -> PathBuf {
    let tile = dir.join("MOD11A1.A2024183.h12v04.061.hdf");
    fs::write(&tile, b"HDF").unwrap();
    tile
}

#[test]
fn test_translates_and_decodes_subdataset() {
    let dir = tempfile::tempdir().unwrap();
    let exported = dir.path().join("exported.tif");
    let data = create_lst_grid(4, 3, 20.0, 31.0);
    write_lst_tiff(&exported, 4, 3, &data);

    // gdal_translate -of GTiff <source> <output>
    let translate = write_script(
        dir.path(),
        "gdal_translate",
        &format!(
            r#"case "$3" in *:LST_Day_1km) ;; *) echo "wrong subdataset $3" >&2; exit 2 ;; esac
cp "{}" "$4""#,
            exported.display()
        ),
    );
    let reader = GdalCliReader::with_binaries(
        fake_gdalinfo(dir.path()).display().to_string(),
        translate.display().to_string(),
    );

    let grid = reader
        .read_subdataset(&fake_tile(dir.path()), "LST_Day_1km")
        .unwrap();
    assert_eq!((grid.width, grid.height), (4, 3));
    assert_eq!(grid.data, data);
    assert_eq!(grid.data[11], celsius_to_raw(31.0));
}

#[test]
fn test_unknown_subdataset() {
    let dir = tempfile::tempdir().unwrap();
    let translate = write_script(dir.path(), "gdal_translate", "exit 0");
    let reader = GdalCliReader::with_binaries(
        fake_gdalinfo(dir.path()).display().to_string(),
        translate.display().to_string(),
    );

    let err = reader
        .read_subdataset(&fake_tile(dir.path()), "LST_Night_1km")
        .unwrap_err();
    assert!(matches!(err, RasterError::SubdatasetNotFound { ref name, .. } if name == "LST_Night_1km"));
}

#[test]
fn test_translate_failure_is_command_error() {
    let dir = tempfile::tempdir().unwrap();
    let translate = write_script(
        dir.path(),
        "gdal_translate",
        r#"echo "ERROR 4: HDF4 driver not available" >&2
exit 1"#,
    );
    let reader = GdalCliReader::with_binaries(
        fake_gdalinfo(dir.path()).display().to_string(),
        translate.display().to_string(),
    );

    let err = reader
        .read_subdataset(&fake_tile(dir.path()), "LST_Day_1km")
        .unwrap_err();
    match err {
        RasterError::Command(msg) => assert!(msg.contains("HDF4 driver not available"), "{}", msg),
        other => panic!("expected command error, got {:?}", other),
    }
}

#[test]
fn test_gdalinfo_failure_is_unavailable_tile() {
    let dir = tempfile::tempdir().unwrap();
    let info = write_script(dir.path(), "gdalinfo", "echo 'not recognized' >&2\nexit 1");
    let reader = GdalCliReader::with_binaries(info.display().to_string(), "gdal_translate");

    let err = reader
        .read_subdataset(&fake_tile(dir.path()), "LST_Day_1km")
        .unwrap_err();
    assert!(matches!(err, RasterError::TileUnavailable(_)));
}

#[test]
fn test_real_mod11a1_granule() {
    let path = require_test_file!("MOD11A1_sample.hdf");
    if Command::new("gdalinfo").arg("--version").output().is_err() {
        eprintln!("SKIPPED: gdalinfo not installed");
        return;
    }

    let grid = GdalCliReader::new()
        .read_subdataset(&path, "LST_Day_1km")
        .unwrap();
    // MOD11A1 1 km tiles are 1200 x 1200
    assert_eq!((grid.width, grid.height), (1200, 1200));
    assert!(grid.data.iter().any(|&v| v >= 7500));
}
