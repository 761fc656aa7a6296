//! Raw search payload → validated [`GranuleRecord`]s.

use std::collections::HashSet;

use lst_common::parse_timestamp;
use tracing::debug;

use crate::discovery::{RawGranule, RawSearchPayload};
use crate::records::{DownloadLink, GranuleRecord};

/// Normalized granules of one region plus what was left out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedRegion {
    /// Sorted by date, then granule id
    pub records: Vec<GranuleRecord>,
    /// Entries missing or breaking required fields
    pub dropped: usize,
    /// Repeats of an already seen granule id
    pub duplicates: usize,
}

/// Normalize every granule of a region's search payload.
///
/// Never fails: unusable entries are dropped and counted.
pub fn normalize(region_id: &str, payload: &RawSearchPayload) -> NormalizedRegion {
    let mut out = NormalizedRegion::default();
    let mut seen = HashSet::new();

    for (index, raw) in payload.granules.iter().enumerate() {
        let record = match to_record(region_id, payload, raw) {
            Ok(record) => record,
            Err(reason) => {
                debug!(region = %region_id, index, reason, "Dropping granule");
                out.dropped += 1;
                continue;
            }
        };

        if !seen.insert(record.granule_id.clone()) {
            debug!(region = %region_id, granule = %record.granule_id, "Duplicate granule id");
            out.duplicates += 1;
            continue;
        }
        out.records.push(record);
    }

    out.records
        .sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.granule_id.cmp(&b.granule_id)));
    out
}

fn to_record(
    region_id: &str,
    payload: &RawSearchPayload,
    raw: &RawGranule,
) -> Result<GranuleRecord, &'static str> {
    let granule_id = raw
        .id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or("missing id")?;

    let time_start = raw
        .time_start
        .as_deref()
        .ok_or("missing time_start")
        .and_then(|s| parse_timestamp(s).map_err(|_| "unparseable time_start"))?;

    let time_end = match raw.time_end.as_deref() {
        Some(s) => parse_timestamp(s).map_err(|_| "unparseable time_end")?,
        None => time_start,
    };
    if time_end < time_start {
        return Err("time_end precedes time_start");
    }

    let cloud_cover = raw
        .cloud_cover_pct()
        .filter(|c| c.is_finite())
        .unwrap_or(0.0)
        .clamp(0.0, 100.0);

    let links = raw
        .effective_links()
        .iter()
        .filter_map(|link| {
            link.href.as_ref().map(|href| DownloadLink {
                href: href.clone(),
                rel: link.rel.clone(),
            })
        })
        .collect();

    Ok(GranuleRecord {
        region_id: region_id.to_string(),
        granule_id: granule_id.to_string(),
        title: raw.title.clone(),
        time_start,
        time_end,
        cloud_cover,
        product: payload.product.clone(),
        bbox: payload.region,
        links,
        date: time_start.date_naive(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(granules: serde_json::Value) -> RawSearchPayload {
        serde_json::from_value(json!({
            "region": [-74.3, 40.5, -73.7, 40.9],
            "product": "MOD11A1",
            "granules": granules
        }))
        .unwrap()
    }

    #[test]
    fn test_normalizes_valid_entry() {
        let p = payload(json!([{
            "id": "G1",
            "title": "MOD11A1.A2024183",
            "time_start": "2024-07-01T15:30:00.000Z",
            "time_end": "2024-07-01T15:35:00.000Z",
            "cloud_cover": 12.0,
            "links": [{"href": "https://data.lpdaac.earthdatacloud.nasa.gov/x.hdf", "rel": "data"}, {"rel": "orphan"}]
        }]));
        let out = normalize("NYC001", &p);

        assert_eq!(out.records.len(), 1);
        let r = &out.records[0];
        assert_eq!(r.region_id, "NYC001");
        assert_eq!(r.date.to_string(), "2024-07-01");
        assert_eq!(r.links.len(), 1);
        assert_eq!(r.product.as_deref(), Some("MOD11A1"));
        assert_eq!(r.bbox.unwrap().west, -74.3);
    }

    #[test]
    fn test_drops_invalid_entries() {
        let p = payload(json!([
            {"time_start": "2024-07-01T00:00:00Z"},
            {"id": "G2"},
            {"id": "G3", "time_start": "yesterday"},
            {"id": "G4", "time_start": "2024-07-02T00:00:00Z", "time_end": "2024-07-01T00:00:00Z"},
            {"id": "G5", "time_start": "2024-07-03T00:00:00Z"}
        ]));
        let out = normalize("NYC001", &p);
        assert_eq!(out.dropped, 4);
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].time_end, out.records[0].time_start);
    }

    #[test]
    fn test_cloud_cover_default_and_clamp() {
        let p = payload(json!([
            {"id": "A", "time_start": "2024-07-01T00:00:00Z"},
            {"id": "B", "time_start": "2024-07-01T00:00:00Z", "cloud_cover": 140},
            {"id": "C", "time_start": "2024-07-01T00:00:00Z", "cloud_cover": -3}
        ]));
        let clouds: Vec<f64> = normalize("X", &p).records.iter().map(|r| r.cloud_cover).collect();
        assert_eq!(clouds, vec![0.0, 100.0, 0.0]);
    }

    #[test]
    fn test_duplicates_keep_first_and_sort() {
        let p = payload(json!([
            {"id": "G9", "time_start": "2024-07-03T00:00:00Z"},
            {"id": "G1", "time_start": "2024-07-01T00:00:00Z", "cloud_cover": 5},
            {"id": "G1", "time_start": "2024-07-02T00:00:00Z", "cloud_cover": 90}
        ]));
        let out = normalize("X", &p);
        assert_eq!(out.duplicates, 1);
        let ids: Vec<&str> = out.records.iter().map(|r| r.granule_id.as_str()).collect();
        assert_eq!(ids, vec!["G1", "G9"]);
        assert_eq!(out.records[0].cloud_cover, 5.0);
    }

    #[test]
    fn test_bad_entry_does_not_cost_the_region() {
        let p = payload(json!([
            {"id": "G1", "time_start": "2024-07-01T15:30:00Z", "title": "MOD11A1.A2024183"},
            {"id": "G2", "time_start": "2024-07-02T15:30:00Z", "title": 42},
            {"id": 7, "time_start": 20240703},
            ["not", "an", "object"]
        ]));
        let out = normalize("NYC001", &p);

        let ids: Vec<&str> = out.records.iter().map(|r| r.granule_id.as_str()).collect();
        assert_eq!(ids, vec!["G1", "G2"]);
        assert!(out.records[1].title.is_none());
        assert_eq!(out.dropped, 2);
    }
}
