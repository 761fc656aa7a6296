//! One JSON file per region under a root directory.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::{IngestionError, Result};
use crate::partition::{Partition, PartitionError};

const EXTENSION: &str = "json";

/// Directory of region partitions (`<root>/<region_id>.json`).
#[derive(Debug, Clone)]
pub struct PartitionStore {
    root: PathBuf,
}

impl PartitionStore {
    /// Open an existing partition directory.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.exists() {
            return Err(IngestionError::InvalidPartitions(format!(
                "{} does not exist",
                root.display()
            )));
        }
        if !root.is_dir() {
            return Err(IngestionError::InvalidPartitions(format!(
                "{} is not a directory",
                root.display()
            )));
        }
        Ok(Self { root })
    }

    /// Open a partition directory, creating it if needed.
    pub fn create(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Self::open(root)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn partition_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.{}", key, EXTENSION))
    }

    /// Write one partition, replacing any previous version.
    pub fn save<T: Serialize + ?Sized>(&self, key: &str, rows: &T) -> Result<()> {
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            return Err(IngestionError::InvalidPartitions(format!(
                "invalid partition key '{}'",
                key
            )));
        }
        let path = self.partition_path(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(rows)?)?;
        fs::rename(&tmp, &path)?;
        debug!(path = %path.display(), "Partition written");
        Ok(())
    }

    pub fn save_all<T: Serialize>(&self, partitions: &BTreeMap<String, T>) -> Result<()> {
        for (key, rows) in partitions {
            self.save(key, rows)?;
        }
        Ok(())
    }

    /// Partition keys present in the store, sorted.
    pub fn keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                keys.push(stem.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }

    /// Lazy partitions; each file is read only when resolved.
    pub fn load_lazy<R>(&self) -> Result<BTreeMap<String, Partition<Vec<R>>>>
    where
        R: DeserializeOwned + Send + 'static,
    {
        let mut partitions = BTreeMap::new();
        for key in self.keys()? {
            let path = self.partition_path(&key);
            partitions.insert(key, Partition::lazy(move || read_partition(&path)));
        }
        Ok(partitions)
    }

    /// Eagerly read every partition. Unreadable files are returned as errors
    /// in place so the caller can skip them.
    pub fn load<R: DeserializeOwned>(
        &self,
    ) -> Result<BTreeMap<String, std::result::Result<Vec<R>, PartitionError>>> {
        let mut partitions = BTreeMap::new();
        for key in self.keys()? {
            let rows = read_partition(&self.partition_path(&key));
            partitions.insert(key, rows);
        }
        Ok(partitions)
    }
}

fn read_partition<R: DeserializeOwned>(path: &Path) -> std::result::Result<Vec<R>, PartitionError> {
    let bytes = fs::read(path)
        .map_err(|e| PartitionError::Load(format!("{}: {}", path.display(), e)))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| PartitionError::Malformed(format!("{}: {}", path.display(), e)))
}
