//! Rolling anomaly z-scores.
//!
//! For position `i` the baseline is the trailing window of up to `window`
//! positions ending at `i` (inclusive). Mean and sample standard deviation are
//! taken over the finite values in that window, so the first positions use a
//! shorter history (minimum one observation). A zero or undefined deviation is
//! replaced by 1.0, which makes the score the plain deviation from the mean.

use std::collections::VecDeque;

/// Default trailing window length, in observations.
pub const DEFAULT_ANOMALY_WINDOW: usize = 30;

/// Online trailing-window z-score.
#[derive(Debug, Clone)]
pub struct RollingZScore {
    window: usize,
    values: VecDeque<f64>,
}

impl RollingZScore {
    /// A `window` of zero is treated as one.
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            window,
            values: VecDeque::with_capacity(window),
        }
    }

    /// Feed the next value and return its z-score.
    ///
    /// A non-finite value still occupies a window slot but yields NaN and is
    /// skipped by the statistics.
    pub fn push(&mut self, value: f64) -> f64 {
        if self.values.len() == self.window {
            self.values.pop_front();
        }
        self.values.push_back(value);

        if !value.is_finite() {
            return f64::NAN;
        }

        // Deviations from the current value keep a constant window exactly zero.
        let deltas: Vec<f64> = self
            .values
            .iter()
            .filter(|v| v.is_finite())
            .map(|v| v - value)
            .collect();
        let n = deltas.len() as f64;
        let mean_delta = deltas.iter().sum::<f64>() / n;

        let std = if deltas.len() > 1 {
            let ss: f64 = deltas.iter().map(|d| (d - mean_delta).powi(2)).sum();
            (ss / (n - 1.0)).sqrt()
        } else {
            f64::NAN
        };
        let std = if std == 0.0 || !std.is_finite() { 1.0 } else { std };

        let z = -mean_delta / std;
        if z == 0.0 {
            0.0
        } else {
            z
        }
    }
}

/// Z-scores for every position of a date-ordered series.
pub fn zscore_sequence(ordered_means: &[f64], window: usize) -> Vec<f64> {
    let mut scorer = RollingZScore::new(window);
    ordered_means.iter().map(|&v| scorer.push(v)).collect()
}
