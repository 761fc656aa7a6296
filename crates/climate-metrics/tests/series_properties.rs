//! Property checks for the daily metric functions.

use climate_metrics::{
    degree_days, flag_sequence, uhi_index, zscore_sequence, HeatwaveParams, DEFAULT_BASE_TEMP_C,
    DEFAULT_RURAL_BASELINE_C,
};
use test_utils::assert_approx_eq;

fn sample_series() -> Vec<f64> {
    vec![
        28.0, 33.0, 34.5, 32.0, 36.1, 29.9, 32.5, 33.0, 35.0, 31.0, 40.0, 40.0, 40.0, 12.0,
    ]
}

// ============================================================================
// Degree days
// ============================================================================

#[test]
fn test_degree_day_exclusivity_and_sign_identity() {
    let mut mean = -30.0;
    while mean <= 50.0 {
        let dd = degree_days(mean, DEFAULT_BASE_TEMP_C);
        assert!(dd.cdd >= 0.0 && dd.hdd >= 0.0);
        assert!(dd.cdd == 0.0 || dd.hdd == 0.0, "both nonzero at {}", mean);
        assert_approx_eq!(dd.cdd - dd.hdd, mean - DEFAULT_BASE_TEMP_C, 1e-9);
        mean += 0.37;
    }
}

#[test]
fn test_single_day_round_trip() {
    let dd = degree_days(23.4, 18.0);
    assert_approx_eq!(dd.cdd, 5.4, 1e-9);
    assert_eq!(dd.hdd, 0.0);
    assert_approx_eq!(uhi_index(23.4, DEFAULT_RURAL_BASELINE_C), 3.4, 1e-9);
}

// ============================================================================
// Heatwave flags
// ============================================================================

#[test]
fn test_heatwave_is_causal() {
    let params = HeatwaveParams::default();
    let base = sample_series();
    let base_flags = flag_sequence(&base, params);

    for j in 0..base.len() {
        for replacement in [0.0, 50.0, f64::NAN] {
            let mut changed = base.clone();
            changed[j] = replacement;
            let flags = flag_sequence(&changed, params);
            assert_eq!(flags[..j], base_flags[..j], "prefix changed when editing {}", j);
        }
    }
}

#[test]
fn test_heatwave_constant_run_is_monotonic() {
    for min_days in 1..6u32 {
        let params = HeatwaveParams {
            threshold_c: 32.0,
            min_consecutive_days: min_days,
        };
        let flags = flag_sequence(&[35.0; 8], params);
        let first = flags.iter().position(|&f| f).unwrap();
        assert_eq!(first, (min_days - 1) as usize);
        assert!(flags[first..].iter().all(|&f| f));
    }
}

#[test]
fn test_heatwave_is_idempotent() {
    let params = HeatwaveParams::default();
    let series = sample_series();
    assert_eq!(flag_sequence(&series, params), flag_sequence(&series, params));
}

// ============================================================================
// Anomaly z-scores
// ============================================================================

#[test]
fn test_zscore_is_causal_and_aligned() {
    let base = sample_series();
    let base_z = zscore_sequence(&base, 5);
    assert_eq!(base_z.len(), base.len());

    let mut changed = base.clone();
    let last = changed.len() - 1;
    changed[last] = 99.0;
    let z = zscore_sequence(&changed, 5);
    assert_eq!(z[..last], base_z[..last]);
}

#[test]
fn test_zscore_constant_series() {
    for window in [1, 2, 7, 30] {
        let z = zscore_sequence(&[23.7; 45], window);
        assert!(z.iter().all(|&v| v == 0.0));
    }
}
