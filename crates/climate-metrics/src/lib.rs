//! Climate-risk metrics derived from daily land surface temperature.
//!
//! Everything in this crate is a pure function or a small explicit state
//! machine over `f64` values; nothing reads configuration from the process.
//!
//! - [`degree_days`] / [`uhi_index`]: per-day values from one mean LST.
//! - [`flag_sequence`] / [`HeatwaveTracker`]: streak-based heatwave flags.
//! - [`zscore_sequence`] / [`RollingZScore`]: trailing-window anomaly scores.
//!
//! Series functions expect values sorted by date and treat `NaN` as a
//! missing observation.

pub mod anomaly;
pub mod degree_days;
pub mod heatwave;

pub use anomaly::{zscore_sequence, RollingZScore, DEFAULT_ANOMALY_WINDOW};
pub use degree_days::{
    degree_days, uhi_index, DegreeDays, DEFAULT_BASE_TEMP_C, DEFAULT_RURAL_BASELINE_C,
};
pub use heatwave::{flag_sequence, HeatwaveParams, HeatwaveTracker};

/// Round to `digits` decimal places, leaving non-finite values untouched.
pub fn round_to(value: f64, digits: i32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let factor = 10f64.powi(digits);
    (value * factor).round() / factor
}
