//! Silver stage: granules → daily metric series per region.

use std::collections::BTreeMap;
use std::time::Duration;

use climate_metrics::{round_to, HeatwaveTracker, RollingZScore};
use lst_raster::{GdalCliReader, SubdatasetReader, TiffReader};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::config::{ExtractionConfig, MetricConfig, RasterBackend, TileSource};
use crate::download::{HttpTileFetcher, LocalTileDirectory, TileFetcher};
use crate::error::Result;
use crate::extract::{ExtractionFailure, LstStats, MockLstGenerator, RasterExtractor};
use crate::partition::{resolve_rows, Partition, SkippedPartition};
use crate::records::{DailyMetricRecord, GranuleRecord, SourceMode};

/// Where temperatures come from.
pub enum LstSource {
    Raster {
        fetcher: Box<dyn TileFetcher>,
        extractor: RasterExtractor,
    },
    Mock(MockLstGenerator),
}

impl LstSource {
    pub fn mode(&self) -> SourceMode {
        match self {
            LstSource::Raster { .. } => SourceMode::Raster,
            LstSource::Mock(_) => SourceMode::Mock,
        }
    }

    /// Build the source described by `config`.
    pub fn from_config(config: &ExtractionConfig) -> Result<Self> {
        if !config.enable_download {
            return Ok(LstSource::Mock(MockLstGenerator::new(config.mock_seed)));
        }

        let reader: Box<dyn SubdatasetReader> = match config.backend {
            RasterBackend::Tiff => Box::new(TiffReader::new()),
            RasterBackend::GdalCli => Box::new(GdalCliReader::new()),
        };
        let fetcher: Box<dyn TileFetcher> = match config.tile_source {
            TileSource::Http => Box::new(HttpTileFetcher::new(
                &config.download_dir,
                config.auth_token.clone(),
                config.url_host_marker.clone(),
                Duration::from_secs(config.request_timeout_secs),
            )?),
            TileSource::Local => Box::new(LocalTileDirectory::new(&config.download_dir)),
        };

        Ok(LstSource::Raster {
            fetcher,
            extractor: RasterExtractor::new(reader, config.decoding.clone()),
        })
    }
}

/// One region's date-ordered daily records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionMetricSeries {
    pub region_id: String,
    pub records: Vec<DailyMetricRecord>,
}

impl RegionMetricSeries {
    pub fn processed_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_processed()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.records.len() - self.processed_count()
    }
}

/// Silver output of a whole run.
#[derive(Debug, Clone, Default)]
pub struct SilverBatch {
    pub series: BTreeMap<String, RegionMetricSeries>,
    pub skipped: Vec<SkippedPartition>,
}

impl SilverBatch {
    pub fn processed_count(&self) -> usize {
        self.series.values().map(RegionMetricSeries::processed_count).sum()
    }

    pub fn failed_count(&self) -> usize {
        self.series.values().map(RegionMetricSeries::failed_count).sum()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    /// Records keyed by region, ready for a partition store.
    pub fn partitions(&self) -> BTreeMap<String, &[DailyMetricRecord]> {
        self.series
            .iter()
            .map(|(id, s)| (id.clone(), s.records.as_slice()))
            .collect()
    }
}

/// Turns bronze granules into silver metric series.
pub struct SilverProcessor {
    metrics: MetricConfig,
    source: LstSource,
}

impl SilverProcessor {
    pub fn new(metrics: MetricConfig, source: LstSource) -> Self {
        Self { metrics, source }
    }

    pub fn from_config(metrics: MetricConfig, extraction: &ExtractionConfig) -> Result<Self> {
        metrics.validate()?;
        extraction.validate()?;
        let source = LstSource::from_config(extraction)?;
        match &source {
            LstSource::Mock(_) => warn!(
                "Raster download disabled: LST values are MOCK data and flagged source_mode=mock"
            ),
            LstSource::Raster { fetcher, extractor } => info!(
                fetcher = fetcher.name(),
                reader = extractor.reader_name(),
                "Raster extraction enabled"
            ),
        }
        Ok(Self::new(metrics, source))
    }

    pub fn mode(&self) -> SourceMode {
        self.source.mode()
    }

    /// Extract and score every granule of one region.
    #[instrument(skip(self, granules), fields(region = %region_id, granules = granules.len()))]
    pub async fn process_region(
        &mut self,
        region_id: &str,
        granules: &[GranuleRecord],
    ) -> RegionMetricSeries {
        let mode = self.source.mode();
        let mut records = Vec::with_capacity(granules.len());

        for granule in granules {
            let mut record = DailyMetricRecord::pending(granule, mode, &self.metrics);
            match self.extract_one(granule).await {
                Ok(stats) => record.apply_stats(&stats, &self.metrics),
                Err(failure) => {
                    warn!(granule = %granule.granule_id, error = %failure, "Extraction failed");
                    metrics::counter!("lst_records_failed_total").increment(1);
                    record.mark_failed(&failure);
                }
            }
            records.push(record);
        }

        let mut records = collapse_to_daily(records);
        apply_series_metrics(&mut records, &self.metrics);

        let series = RegionMetricSeries {
            region_id: region_id.to_string(),
            records,
        };
        info!(
            days = series.records.len(),
            processed = series.processed_count(),
            failed = series.failed_count(),
            "Region processed"
        );
        series
    }

    async fn extract_one(
        &mut self,
        granule: &GranuleRecord,
    ) -> std::result::Result<LstStats, ExtractionFailure> {
        match &mut self.source {
            LstSource::Mock(generator) => Ok(generator.sample()),
            LstSource::Raster { fetcher, extractor } => {
                let tile = fetcher.fetch(granule).await?;
                extractor.extract(&tile, granule.bbox.as_ref())
            }
        }
    }

    /// Process every region independently, skipping unusable partitions.
    pub async fn process_partitions<I>(&mut self, partitions: I) -> SilverBatch
    where
        I: IntoIterator<Item = (String, Partition<Vec<GranuleRecord>>)>,
    {
        let mut batch = SilverBatch::default();

        for (region_id, partition) in partitions {
            match resolve_rows(&region_id, partition) {
                Ok(granules) => {
                    let series = self.process_region(&region_id, &granules).await;
                    batch.series.insert(region_id, series);
                }
                Err(reason) => {
                    warn!(region = %region_id, reason = %reason, "Skipping partition");
                    metrics::counter!("lst_partitions_skipped_total", "stage" => "silver")
                        .increment(1);
                    batch.skipped.push(SkippedPartition { region_id, reason });
                }
            }
        }

        batch
    }
}

// ============================================================================
// Series passes
// ============================================================================

/// Keep one record per date.
///
/// Preference: processed over failed, then lowest cloud cover, then the
/// smallest granule id. Output is sorted by date.
pub fn collapse_to_daily(mut records: Vec<DailyMetricRecord>) -> Vec<DailyMetricRecord> {
    records.sort_by(|a, b| {
        a.date
            .cmp(&b.date)
            .then_with(|| b.is_processed().cmp(&a.is_processed()))
            .then_with(|| a.cloud_cover.total_cmp(&b.cloud_cover))
            .then_with(|| a.granule_id.cmp(&b.granule_id))
    });
    let before = records.len();
    records.dedup_by_key(|r| r.date);
    if records.len() < before {
        debug!(collapsed = before - records.len(), "Collapsed same-day granules");
    }
    records
}

/// Sort by date and fill heatwave flags and anomaly z-scores.
pub fn apply_series_metrics(records: &mut [DailyMetricRecord], metrics: &MetricConfig) {
    records.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.granule_id.cmp(&b.granule_id)));

    let mut heatwave = HeatwaveTracker::new(metrics.heatwave);
    let mut anomaly = RollingZScore::new(metrics.anomaly_window);

    for record in records.iter_mut() {
        let mean = record.mean_or_nan();
        record.heatwave_flag = heatwave.push(mean);
        let z = anomaly.push(mean);
        record.anomaly_zscore = z.is_finite().then(|| round_to(z, 2));
    }
}
