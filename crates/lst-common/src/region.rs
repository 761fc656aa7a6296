//! Region reference data.

use serde::{Deserialize, Serialize};

use crate::bbox::BoundingBox;

/// A monitored region. Immutable reference data created at configuration time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub id: String,
    pub name: String,
    pub bbox: BoundingBox,
}

impl Region {
    pub fn new(id: impl Into<String>, name: impl Into<String>, bbox: BoundingBox) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            bbox,
        }
    }

    /// Center of the region bbox as `[lon, lat]`.
    pub fn center(&self) -> [f64; 2] {
        let (lon, lat) = self.bbox.center();
        [lon, lat]
    }
}

/// Regions shipped with the pipeline when no catalog is configured.
pub fn builtin_regions() -> Vec<Region> {
    vec![
        Region::new(
            "NYC001",
            "New York City",
            BoundingBox::new(-74.2589, 40.4774, -73.7004, 40.9176),
        ),
        Region::new(
            "LAX001",
            "Los Angeles",
            BoundingBox::new(-118.6682, 33.7037, -118.1553, 34.3373),
        ),
        Region::new(
            "CHI001",
            "Chicago",
            BoundingBox::new(-87.9402, 41.6446, -87.5241, 42.0230),
        ),
        Region::new(
            "MIA001",
            "Miami",
            BoundingBox::new(-80.3198, 25.7095, -80.1398, 25.8557),
        ),
    ]
}

/// Look up a region by id.
pub fn find_region<'a>(regions: &'a [Region], id: &str) -> Option<&'a Region> {
    regions.iter().find(|r| r.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_regions_are_valid() {
        let regions = builtin_regions();
        assert_eq!(regions.len(), 4);
        for region in &regions {
            region.bbox.validate().unwrap();
        }
    }

    #[test]
    fn test_find_region() {
        let regions = builtin_regions();
        assert_eq!(find_region(&regions, "CHI001").unwrap().name, "Chicago");
        assert!(find_region(&regions, "XXX999").is_none());
    }

    #[test]
    fn test_center() {
        let region = Region::new("T", "Test", BoundingBox::new(-10.0, 0.0, 10.0, 20.0));
        assert_eq!(region.center(), [0.0, 10.0]);
    }
}
