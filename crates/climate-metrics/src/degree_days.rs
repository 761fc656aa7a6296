//! Cooling/heating degree days and urban heat island index.

use serde::{Deserialize, Serialize};

/// Default comfort base temperature for degree days (°C).
pub const DEFAULT_BASE_TEMP_C: f64 = 18.0;

/// Default rural reference temperature for the UHI index (°C).
pub const DEFAULT_RURAL_BASELINE_C: f64 = 20.0;

/// Cooling and heating degree days for a single day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DegreeDays {
    pub cdd: f64,
    pub hdd: f64,
}

/// Degree days of `mean_c` against `base_c`.
///
/// At most one of the two values is nonzero, and `cdd - hdd == mean_c - base_c`.
/// A NaN input yields NaN for both values.
pub fn degree_days(mean_c: f64, base_c: f64) -> DegreeDays {
    // f64::max would swallow NaN and report 0.0
    if mean_c.is_nan() || base_c.is_nan() {
        return DegreeDays {
            cdd: f64::NAN,
            hdd: f64::NAN,
        };
    }

    let diff = mean_c - base_c;
    DegreeDays {
        cdd: if diff > 0.0 { diff } else { 0.0 },
        hdd: if diff < 0.0 { -diff } else { 0.0 },
    }
}

/// Urban heat island index: urban mean minus the rural baseline. Unclamped.
pub fn uhi_index(urban_mean_c: f64, rural_baseline_c: f64) -> f64 {
    urban_mean_c - rural_baseline_c
}
