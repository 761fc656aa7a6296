//! Upstream inputs: discovery results and raw granule search payloads.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use lst_common::{BoundingBox, DateRange, Region};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscoveryStatus {
    Success,
    Error,
}

impl std::fmt::Display for DiscoveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiscoveryStatus::Success => write!(f, "success"),
            DiscoveryStatus::Error => write!(f, "error"),
        }
    }
}

/// Outcome of the granule search for one region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionDiscoveryResult {
    pub status: DiscoveryStatus,
    /// Saved search payload; relative paths resolve against the results file
    #[serde(default)]
    pub file_path: Option<PathBuf>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub region: Option<Region>,
    #[serde(default)]
    pub date_range: Option<DateRange>,
}

/// Discovery results keyed by region id.
pub type DiscoveryResults = BTreeMap<String, RegionDiscoveryResult>;

/// Read `discovery_results.json`. Failure here is fatal for the run.
pub fn load_discovery_results(path: &Path) -> Result<DiscoveryResults> {
    let bytes = std::fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

// ============================================================================
// Raw search payload
// ============================================================================

/// A saved granule search for one region, as written by discovery.
///
/// Parsing is lenient below the top level: a wrongly typed field reads as
/// absent, and a granule entry that is not an object reads as an empty
/// granule, so one bad entry is dropped during normalization instead of
/// failing the whole payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSearchPayload {
    #[serde(default, deserialize_with = "lenient::bbox")]
    pub region: Option<BoundingBox>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub product: Option<String>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub granules: Vec<RawGranule>,
}

/// One search hit before validation. Every field is optional here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawGranule {
    #[serde(default, deserialize_with = "lenient::string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub time_start: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub time_end: Option<String>,
    /// Number or numeric string depending on the upstream API
    #[serde(default)]
    pub cloud_cover: Option<Value>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub links: Vec<RawLink>,
    #[serde(default, deserialize_with = "lenient::optional_list")]
    pub all_links: Option<Vec<RawLink>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawLink {
    #[serde(default, deserialize_with = "lenient::string")]
    pub href: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub rel: Option<String>,
}

mod lenient {
    use lst_common::BoundingBox;
    use serde::de::DeserializeOwned;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    /// Strings as-is, numbers in their JSON text form, anything else absent.
    pub fn string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    }

    pub fn bbox<'de, D: Deserializer<'de>>(d: D) -> Result<Option<BoundingBox>, D::Error> {
        Ok(serde_json::from_value(Value::deserialize(d)?).ok())
    }

    /// Array elements that fail to parse become `T::default()`.
    pub fn list<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned + Default,
    {
        Ok(items(Value::deserialize(d)?).unwrap_or_default())
    }

    pub fn optional_list<'de, D, T>(d: D) -> Result<Option<Vec<T>>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned + Default,
    {
        Ok(items(Value::deserialize(d)?))
    }

    fn items<T: DeserializeOwned + Default>(value: Value) -> Option<Vec<T>> {
        match value {
            Value::Array(values) => Some(
                values
                    .into_iter()
                    .map(|v| serde_json::from_value(v).unwrap_or_default())
                    .collect(),
            ),
            _ => None,
        }
    }
}

impl RawGranule {
    /// Cloud cover in percent, if present and numeric.
    pub fn cloud_cover_pct(&self) -> Option<f64> {
        match self.cloud_cover.as_ref()? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// `all_links` when the payload carries it, `links` otherwise.
    pub fn effective_links(&self) -> &[RawLink] {
        self.all_links.as_deref().unwrap_or(&self.links)
    }
}

pub fn load_payload(path: &Path) -> Result<RawSearchPayload> {
    let bytes = std::fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}
