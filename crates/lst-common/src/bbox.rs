//! Bounding box types and operations.

use serde::{Deserialize, Serialize};

/// A geographic bounding box in WGS84 degrees.
///
/// Serialized as `[west, south, east, north]`, which is both the shape of the
/// catalog search payloads and of the gold API output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct BoundingBox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl BoundingBox {
    /// Create a new bounding box from its edges.
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// Check that the edges are finite, ordered and inside WGS84 limits.
    pub fn validate(&self) -> Result<(), BboxError> {
        let edges = [self.west, self.south, self.east, self.north];
        if edges.iter().any(|v| !v.is_finite()) {
            return Err(BboxError::NonFinite);
        }
        if self.west > self.east || self.south > self.north {
            return Err(BboxError::Inverted(*self));
        }
        if self.west < -180.0 || self.east > 180.0 || self.south < -90.0 || self.north > 90.0 {
            return Err(BboxError::OutOfRange(*self));
        }
        Ok(())
    }

    /// Center point as `(lon, lat)`.
    pub fn center(&self) -> (f64, f64) {
        (
            (self.west + self.east) / 2.0,
            (self.south + self.north) / 2.0,
        )
    }
}

impl From<[f64; 4]> for BoundingBox {
    fn from(v: [f64; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

impl From<BoundingBox> for [f64; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.west, b.south, b.east, b.north]
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BboxError {
    #[error("Bounding box contains non-finite values")]
    NonFinite,

    #[error("Bounding box edges are inverted: {0:?}")]
    Inverted(BoundingBox),

    #[error("Bounding box outside WGS84 limits: {0:?}")]
    OutOfRange(BoundingBox),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_array_shape() {
        let bbox = BoundingBox::new(-80.3198, 25.7095, -80.1398, 25.8557);
        let json = serde_json::to_string(&bbox).unwrap();
        assert_eq!(json, "[-80.3198,25.7095,-80.1398,25.8557]");

        let back: BoundingBox = serde_json::from_str(&json).unwrap();
        assert_eq!(back, bbox);
    }

    #[test]
    fn test_validate() {
        assert!(BoundingBox::new(-1.0, -1.0, 1.0, 1.0).validate().is_ok());
        assert!(matches!(
            BoundingBox::new(1.0, 0.0, -1.0, 1.0).validate(),
            Err(BboxError::Inverted(_))
        ));
        assert!(matches!(
            BoundingBox::new(0.0, 0.0, 1.0, 95.0).validate(),
            Err(BboxError::OutOfRange(_))
        ));
        assert!(matches!(
            BoundingBox::new(f64::NAN, 0.0, 1.0, 1.0).validate(),
            Err(BboxError::NonFinite)
        ));
    }
}
