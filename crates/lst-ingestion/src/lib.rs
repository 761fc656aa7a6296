//! Satellite LST ingestion library.
//!
//! Turns granule search results into per-region daily climate metrics in
//! three medallion stages:
//!
//! - **Bronze**: discovery results and raw search payloads are normalized
//!   into [`GranuleRecord`] partitions, one per region.
//! - **Silver**: each granule's LST tile is summarized (or mocked), degree
//!   days and UHI are attached, and the date-ordered series is scored for
//!   heatwaves and anomalies.
//! - **Gold**: each region's series is formatted into an API payload with
//!   a KPI summary.
//!
//! Region partitions live in a [`PartitionStore`] and are combined by
//! [`consolidate`] into a unified table plus a manifest.
//!
//! # Failure model
//!
//! A bad granule yields a `failed` record with a reason. A bad region or
//! partition is skipped with a logged reason and counted. Only unusable
//! top-level inputs surface as [`IngestionError`].

pub mod bronze;
pub mod config;
pub mod consolidate;
pub mod discovery;
pub mod download;
pub mod error;
pub mod extract;
pub mod gold;
pub mod normalize;
pub mod partition;
pub mod records;
pub mod silver;
pub mod store;

// Re-exports
pub use bronze::{bronze_metadata, prepare_bronze, BronzeBatch, BronzeMetadataRow, RegionStatus};
pub use config::{ExtractionConfig, LstDecoding, MetricConfig, RasterBackend, TileSource};
pub use consolidate::{
    consolidate, consolidate_store, manifest_entry, ConsolidationReport, ManifestEntry,
};
pub use discovery::{
    load_discovery_results, load_payload, DiscoveryResults, DiscoveryStatus, RawGranule,
    RawSearchPayload, RegionDiscoveryResult,
};
pub use download::{select_download_url, HttpTileFetcher, LocalTileDirectory, TileFetcher};
pub use error::{IngestionError, Result};
pub use extract::{compute_stats, ExtractionFailure, LstStats, MockLstGenerator, RasterExtractor};
pub use gold::{aggregate_gold, format_region, kpi_summary, GoldBatch, KpiSummary, RegionPayload};
pub use normalize::{normalize, NormalizedRegion};
pub use partition::{
    Partition, PartitionError, PartitionRow, SkipReason, SkippedPartition,
};
pub use records::{DailyMetricRecord, DownloadLink, GranuleRecord, ProcessingStatus, SourceMode};
pub use silver::{
    apply_series_metrics, collapse_to_daily, LstSource, RegionMetricSeries, SilverBatch,
    SilverProcessor,
};
pub use store::PartitionStore;
