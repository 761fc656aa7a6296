//! Tests for BoundingBox operations on region extents.

use lst_common::bbox::{BboxError, BoundingBox};
use lst_common::builtin_regions;

// ============================================================================
// Constructor tests
// ============================================================================

#[test]
fn test_bbox_new() {
    let bbox = BoundingBox::new(-180.0, -90.0, 180.0, 90.0);
    assert_eq!(bbox.west, -180.0);
    assert_eq!(bbox.south, -90.0);
    assert_eq!(bbox.east, 180.0);
    assert_eq!(bbox.north, 90.0);
    assert!(bbox.validate().is_ok());
}

#[test]
fn test_bbox_from_array() {
    let bbox = BoundingBox::from([-87.9402, 41.6446, -87.5241, 42.0230]);
    let back: [f64; 4] = bbox.into();
    assert_eq!(back, [-87.9402, 41.6446, -87.5241, 42.0230]);
}

// ============================================================================
// Serde tests
// ============================================================================

#[test]
fn test_deserialize_wrong_length_fails() {
    let result: Result<BoundingBox, _> = serde_json::from_str("[1.0, 2.0, 3.0]");
    assert!(result.is_err());
}

#[test]
fn test_deserialize_object_fails() {
    let result: Result<BoundingBox, _> =
        serde_json::from_str(r#"{"west": 0, "south": 0, "east": 1, "north": 1}"#);
    assert!(result.is_err());
}

// ============================================================================
// Geometry tests
// ============================================================================

#[test]
fn test_center() {
    let bbox = BoundingBox::new(-10.0, 20.0, 30.0, 60.0);
    assert_eq!(bbox.center(), (10.0, 40.0));
}

#[test]
fn test_degenerate_point_box_is_valid() {
    let bbox = BoundingBox::new(5.0, 5.0, 5.0, 5.0);
    assert!(bbox.validate().is_ok());
    assert_eq!(bbox.center(), (5.0, 5.0));
}

#[test]
fn test_edges_outside_wgs84() {
    assert!(matches!(
        BoundingBox::new(-181.0, 0.0, 0.0, 1.0).validate(),
        Err(BboxError::OutOfRange(_))
    ));
    assert!(matches!(
        BoundingBox::new(0.0, 0.0, f64::INFINITY, 1.0).validate(),
        Err(BboxError::NonFinite)
    ));
}

#[test]
fn test_builtin_regions_are_valid() {
    for region in builtin_regions() {
        assert!(region.bbox.validate().is_ok(), "{} has an invalid bbox", region.id);
    }
}
