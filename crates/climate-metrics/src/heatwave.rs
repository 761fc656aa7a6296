//! Heatwave detection over a date-ordered daily series.
//!
//! A day is hot when its mean LST is at or above the threshold. The flag for a
//! day is raised once the current run of hot days reaches the minimum length,
//! and stays raised until the run breaks. The machine is causal: the flag at
//! position `i` depends only on positions `0..=i`.
//!
//! A NaN mean (no observation for that day) never compares as hot, so it
//! resets the streak, so a gap in the record breaks a heatwave.

use serde::{Deserialize, Serialize};

/// Heatwave thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeatwaveParams {
    /// Minimum mean LST (°C) for a day to count as hot
    pub threshold_c: f64,
    /// Consecutive hot days needed before the flag is raised
    pub min_consecutive_days: u32,
}

impl Default for HeatwaveParams {
    fn default() -> Self {
        Self {
            threshold_c: 32.0,
            min_consecutive_days: 3,
        }
    }
}

/// Online streak counter.
#[derive(Debug, Clone)]
pub struct HeatwaveTracker {
    params: HeatwaveParams,
    streak: u32,
}

impl HeatwaveTracker {
    pub fn new(params: HeatwaveParams) -> Self {
        Self { params, streak: 0 }
    }

    /// Feed the next day's mean and return its flag.
    pub fn push(&mut self, mean_c: f64) -> bool {
        if mean_c >= self.params.threshold_c {
            self.streak = self.streak.saturating_add(1);
        } else {
            self.streak = 0;
        }
        self.streak >= self.params.min_consecutive_days.max(1)
    }

    /// Length of the current hot-day run.
    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn reset(&mut self) {
        self.streak = 0;
    }
}

/// Flags for every position of a date-ordered series of daily means.
pub fn flag_sequence(ordered_means: &[f64], params: HeatwaveParams) -> Vec<bool> {
    let mut tracker = HeatwaveTracker::new(params);
    ordered_means.iter().map(|&m| tracker.push(m)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn as_ints(flags: &[bool]) -> Vec<u8> {
        flags.iter().map(|&f| u8::from(f)).collect()
    }

    #[test]
    fn test_nyc_scenario() {
        let flags = flag_sequence(&[33.0, 33.5, 33.0, 20.0], HeatwaveParams::default());
        assert_eq!(as_ints(&flags), vec![0, 0, 1, 0]);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let params = HeatwaveParams {
            threshold_c: 32.0,
            min_consecutive_days: 1,
        };
        assert_eq!(as_ints(&flag_sequence(&[32.0, 31.99], params)), vec![1, 0]);
    }

    #[test]
    fn test_nan_resets_streak() {
        let flags = flag_sequence(
            &[35.0, 35.0, f64::NAN, 35.0, 35.0, 35.0],
            HeatwaveParams::default(),
        );
        assert_eq!(as_ints(&flags), vec![0, 0, 0, 0, 0, 1]);
    }

    #[test]
    fn test_zero_min_days_behaves_like_one() {
        let params = HeatwaveParams {
            threshold_c: 30.0,
            min_consecutive_days: 0,
        };
        assert_eq!(as_ints(&flag_sequence(&[10.0, 31.0], params)), vec![0, 1]);
    }

    #[test]
    fn test_tracker_reset() {
        let mut tracker = HeatwaveTracker::new(HeatwaveParams::default());
        tracker.push(40.0);
        tracker.push(40.0);
        assert_eq!(tracker.streak(), 2);
        tracker.reset();
        assert_eq!(tracker.streak(), 0);
        assert!(!tracker.push(40.0));
    }

    #[test]
    fn test_empty_input() {
        assert!(flag_sequence(&[], HeatwaveParams::default()).is_empty());
    }
}
