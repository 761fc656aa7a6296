//! Gold stage: API-ready payloads per region.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use lst_common::{find_region, BoundingBox, Region};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::partition::{resolve_rows, Partition, SkippedPartition};
use crate::records::DailyMetricRecord;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiDateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionMeta {
    pub region_id: String,
    pub region_name: String,
    pub product: Option<String>,
    pub bbox: Option<BoundingBox>,
    /// `[lon, lat]`
    pub center: Option<[f64; 2]>,
    pub date_range: ApiDateRange,
    pub record_count: usize,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiMetric {
    pub date: NaiveDate,
    pub lst_mean_c: Option<f64>,
    pub cdd: Option<f64>,
    pub hdd: Option<f64>,
    /// 0 or 1
    pub heatwave_flag: u8,
    pub uhi_index: Option<f64>,
    pub anomaly_zscore: Option<f64>,
}

impl From<&DailyMetricRecord> for ApiMetric {
    fn from(r: &DailyMetricRecord) -> Self {
        Self {
            date: r.date,
            lst_mean_c: r.lst_mean_c,
            cdd: r.cdd,
            hdd: r.hdd,
            heatwave_flag: u8::from(r.heatwave_flag),
            uhi_index: r.uhi_index,
            anomaly_zscore: r.anomaly_zscore,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YtdKpis {
    pub avg_lst_c: Option<f64>,
    pub heatwave_days: usize,
    pub max_uhi_index: Option<f64>,
    pub max_anomaly_zscore: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodayKpis {
    pub date: NaiveDate,
    pub lst_mean_c: Option<f64>,
    pub cdd: Option<f64>,
    pub hdd: Option<f64>,
    pub anomaly_zscore: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiSummary {
    pub ytd: YtdKpis,
    pub today: TodayKpis,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionPayload {
    pub meta: RegionMeta,
    pub metrics: Vec<ApiMetric>,
    pub kpi_summary: KpiSummary,
}

/// Gold output of a whole run.
#[derive(Debug, Clone, Default)]
pub struct GoldBatch {
    pub payloads: BTreeMap<String, RegionPayload>,
    pub skipped: Vec<SkippedPartition>,
}

fn max_of(values: impl Iterator<Item = f64>) -> Option<f64> {
    values.fold(None, |acc, v| Some(acc.map_or(v, |m: f64| m.max(v))))
}

/// KPIs over a date-ordered series. `None` for an empty series.
pub fn kpi_summary(records: &[DailyMetricRecord]) -> Option<KpiSummary> {
    let latest = records.last()?;

    let means: Vec<f64> = records.iter().filter_map(|r| r.lst_mean_c).collect();
    let avg_lst_c = (!means.is_empty()).then(|| means.iter().sum::<f64>() / means.len() as f64);

    Some(KpiSummary {
        ytd: YtdKpis {
            avg_lst_c,
            heatwave_days: records.iter().filter(|r| r.heatwave_flag).count(),
            max_uhi_index: max_of(records.iter().filter_map(|r| r.uhi_index)),
            max_anomaly_zscore: max_of(records.iter().filter_map(|r| r.anomaly_zscore))
                .unwrap_or(0.0),
        },
        today: TodayKpis {
            date: latest.date,
            lst_mean_c: latest.lst_mean_c,
            cdd: latest.cdd,
            hdd: latest.hdd,
            anomaly_zscore: latest.anomaly_zscore.unwrap_or(0.0),
        },
    })
}

/// Format one region's silver series for the API.
///
/// Name, bbox and center come from `regions` when the region is listed there.
pub fn format_region(
    region_id: &str,
    records: &[DailyMetricRecord],
    regions: &[Region],
    now: DateTime<Utc>,
) -> Option<RegionPayload> {
    let mut ordered = records.to_vec();
    ordered.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.granule_id.cmp(&b.granule_id)));

    let kpi_summary = kpi_summary(&ordered)?;
    let first = ordered.first()?;
    let last = ordered.last()?;
    let region = find_region(regions, region_id);

    let meta = RegionMeta {
        region_id: region_id.to_string(),
        region_name: region
            .map(|r| r.name.clone())
            .unwrap_or_else(|| region_id.to_string()),
        product: ordered.iter().find_map(|r| r.product.clone()),
        bbox: region.map(|r| r.bbox),
        center: region.map(Region::center),
        date_range: ApiDateRange {
            start: first.date,
            end: last.date,
        },
        record_count: ordered.len(),
        last_updated: now,
    };

    Some(RegionPayload {
        meta,
        metrics: ordered.iter().map(ApiMetric::from).collect(),
        kpi_summary,
    })
}

/// Format every silver partition, skipping empty or unusable ones.
pub fn aggregate_gold<I>(partitions: I, regions: &[Region], now: DateTime<Utc>) -> GoldBatch
where
    I: IntoIterator<Item = (String, Partition<Vec<DailyMetricRecord>>)>,
{
    let mut batch = GoldBatch::default();

    for (region_id, partition) in partitions {
        let payload = resolve_rows(&region_id, partition)
            .map(|rows| format_region(&region_id, &rows, regions, now));
        match payload {
            Ok(Some(payload)) => {
                info!(region = %region_id, records = payload.meta.record_count, "Gold payload ready");
                batch.payloads.insert(region_id, payload);
            }
            Ok(None) => {}
            Err(reason) => {
                warn!(region = %region_id, reason = %reason, "Skipping partition");
                metrics::counter!("lst_partitions_skipped_total", "stage" => "gold").increment(1);
                batch.skipped.push(SkippedPartition { region_id, reason });
            }
        }
    }

    batch
}
