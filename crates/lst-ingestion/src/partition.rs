//! Region-keyed partitions that may be loaded eagerly or on demand.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::records::{DailyMetricRecord, GranuleRecord};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PartitionError {
    #[error("failed to load partition: {0}")]
    Load(String),

    #[error("malformed partition: {0}")]
    Malformed(String),
}

/// Deferred partition loader; called at most once.
pub type PartitionLoader<T> = Box<dyn FnOnce() -> Result<T, PartitionError> + Send>;

/// A partition's table, either in memory or behind a loader.
pub enum Partition<T> {
    Loaded(T),
    Lazy(PartitionLoader<T>),
}

impl<T> Partition<T> {
    pub fn lazy<F>(loader: F) -> Self
    where
        F: FnOnce() -> Result<T, PartitionError> + Send + 'static,
    {
        Partition::Lazy(Box::new(loader))
    }

    pub fn is_lazy(&self) -> bool {
        matches!(self, Partition::Lazy(_))
    }

    /// Consume the partition, running its loader if it has one.
    pub fn resolve(self) -> Result<T, PartitionError> {
        match self {
            Partition::Loaded(table) => Ok(table),
            Partition::Lazy(loader) => loader(),
        }
    }
}

impl<T> From<T> for Partition<T> {
    fn from(table: T) -> Self {
        Partition::Loaded(table)
    }
}

impl<T: fmt::Debug> fmt::Debug for Partition<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Partition::Loaded(table) => f.debug_tuple("Loaded").field(table).finish(),
            Partition::Lazy(_) => f.write_str("Lazy(..)"),
        }
    }
}

// ============================================================================
// Rows and validation
// ============================================================================

/// Columns the consolidator needs from any partition row.
pub trait PartitionRow {
    fn region_id(&self) -> &str;
    fn date(&self) -> NaiveDate;
    fn granule_id(&self) -> &str;
    fn cloud_cover(&self) -> f64;
    fn product(&self) -> Option<&str>;
}

impl PartitionRow for GranuleRecord {
    fn region_id(&self) -> &str {
        &self.region_id
    }
    fn date(&self) -> NaiveDate {
        self.date
    }
    fn granule_id(&self) -> &str {
        &self.granule_id
    }
    fn cloud_cover(&self) -> f64 {
        self.cloud_cover
    }
    fn product(&self) -> Option<&str> {
        self.product.as_deref()
    }
}

impl PartitionRow for DailyMetricRecord {
    fn region_id(&self) -> &str {
        &self.region_id
    }
    fn date(&self) -> NaiveDate {
        self.date
    }
    fn granule_id(&self) -> &str {
        &self.granule_id
    }
    fn cloud_cover(&self) -> f64 {
        self.cloud_cover
    }
    fn product(&self) -> Option<&str> {
        self.product.as_deref()
    }
}

/// Why a partition was left out of a stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    ResolveFailed(String),
    Malformed(String),
    Empty,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::ResolveFailed(msg) => write!(f, "resolution failed: {}", msg),
            SkipReason::Malformed(msg) => write!(f, "malformed: {}", msg),
            SkipReason::Empty => write!(f, "empty partition"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedPartition {
    pub region_id: String,
    pub reason: SkipReason,
}

/// Resolve a partition and check it is usable for `region_id`.
pub fn resolve_rows<R: PartitionRow>(
    region_id: &str,
    partition: Partition<Vec<R>>,
) -> Result<Vec<R>, SkipReason> {
    let rows = partition.resolve().map_err(|e| match e {
        PartitionError::Load(msg) => SkipReason::ResolveFailed(msg),
        PartitionError::Malformed(msg) => SkipReason::Malformed(msg),
    })?;

    if rows.is_empty() {
        return Err(SkipReason::Empty);
    }
    if let Some(row) = rows.iter().find(|r| r.region_id() != region_id) {
        return Err(SkipReason::Malformed(format!(
            "row for region '{}' in partition '{}'",
            row.region_id(),
            region_id
        )));
    }
    Ok(rows)
}
