//! Common test fixtures for LST pipeline tests.
//!
//! Builders here produce JSON shaped like the catalog search payloads the
//! discovery stage saves per region.

use chrono::{Duration, NaiveDate};
use serde_json::{json, Value};

/// Region bounding boxes as `[west, south, east, north]`.
pub mod bbox {
    pub const NYC: [f64; 4] = [-74.2589, 40.4774, -73.7004, 40.9176];
    pub const MIA: [f64; 4] = [-80.3198, 25.7095, -80.1398, 25.8557];
}

/// Common time values for testing.
pub mod time {
    /// First day of the fixture series.
    pub const START_DATE: &str = "2024-07-01";

    /// Overpass time used for generated granules.
    pub const OVERPASS: &str = "T15:30:00.000Z";
}

/// Product short name used in fixtures.
pub const PRODUCT: &str = "MOD11A1";

/// Relation type CMR uses for data links.
pub const DATA_REL: &str = "http://esipfed.org/ns/fedsearch/1.1/data#";

/// An LP DAAC style HDF download URL for a granule id.
pub fn lpdaac_href(granule_id: &str) -> String {
    format!(
        "https://data.lpdaac.earthdatacloud.nasa.gov/lp-prod-protected/MOD11A1.061/{}.hdf",
        granule_id
    )
}

/// A single raw granule entry.
pub fn granule_json(id: &str, time_start: &str, cloud_cover: f64) -> Value {
    json!({
        "id": id,
        "title": format!("{}.{}", PRODUCT, id),
        "time_start": time_start,
        "time_end": time_start,
        "cloud_cover": cloud_cover,
        "links": [
            { "href": lpdaac_href(id), "rel": DATA_REL },
            { "href": "https://example.com/browse.jpg", "rel": "browse" }
        ]
    })
}

/// One granule per day for `days` days starting at [`time::START_DATE`].
pub fn daily_granules(region_id: &str, days: usize, cloud_cover: f64) -> Vec<Value> {
    let start = NaiveDate::parse_from_str(time::START_DATE, "%Y-%m-%d")
        .expect("fixture start date is valid");
    (0..days)
        .map(|i| {
            let date = start + Duration::days(i as i64);
            let id = format!("G-{}-{}", region_id, date.format("%Y%m%d"));
            granule_json(&id, &format!("{}{}", date, time::OVERPASS), cloud_cover)
        })
        .collect()
}

/// A full per-region search payload.
pub fn search_payload(bbox: [f64; 4], granules: Vec<Value>) -> Value {
    json!({
        "region": bbox,
        "product": PRODUCT,
        "granules": granules,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_daily_granules_are_consecutive() {
        let granules = daily_granules("NYC001", 3, 10.0);
        assert_eq!(granules.len(), 3);
        assert_eq!(granules[0]["time_start"], "2024-07-01T15:30:00.000Z");
        assert_eq!(granules[2]["time_start"], "2024-07-03T15:30:00.000Z");
        assert_eq!(granules[1]["id"], "G-NYC001-20240702");
    }

    #[test]
    fn test_search_payload_shape() {
        let payload = search_payload(bbox::NYC, daily_granules("NYC001", 1, 0.0));
        assert_eq!(payload["product"], PRODUCT);
        assert_eq!(payload["region"][0], -74.2589);
        assert!(payload["granules"][0]["links"][0]["href"]
            .as_str()
            .unwrap()
            .ends_with(".hdf"));
    }
}
