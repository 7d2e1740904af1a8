use serde::{Deserialize, Serialize};

use super::error::StatsError;

/// Population summary of a series (seconds for timing series).
///
/// All fields are zero for an empty series; callers that need to tell
/// "no data" from "zero" get that from the `Result` of the producing
/// statistic, not from this value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesSummary {
    pub mean: f64,
    pub std: f64,
    pub max: f64,
    pub min: f64,
}

impl SeriesSummary {
    /// Coefficient of variation in percent (`std / mean * 100`).
    ///
    /// Returns `None` when the mean is not positive.
    pub fn variation_percent(&self) -> Option<f64> {
        if self.mean > 0.0 {
            Some(self.std / self.mean * 100.0)
        } else {
            None
        }
    }
}

/// Summary plus the raw series it was computed from.
///
/// # Examples
/// ```
/// use pingshark_core::stats::StatBundle;
///
/// let bundle = StatBundle::from_samples(vec![0.01, 0.03]);
/// assert!((bundle.summary.mean - 0.02).abs() < 1e-12);
/// assert_eq!(bundle.samples.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatBundle {
    #[serde(flatten)]
    pub summary: SeriesSummary,
    /// Derived `std / mean * 100`, absent when the mean is not positive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variation_pct: Option<f64>,
    /// Raw samples in computation order (kept for plotting).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub samples: Vec<f64>,
}

impl StatBundle {
    pub fn from_samples(samples: Vec<f64>) -> Self {
        let summary = describe(&samples);
        Self {
            summary,
            variation_pct: summary.variation_percent(),
            samples,
        }
    }

    /// Drop the raw samples, keeping the summary.
    pub fn without_samples(mut self) -> Self {
        self.samples = Vec::new();
        self
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Population mean, standard deviation (divide by N), max and min.
///
/// # Examples
/// ```
/// use pingshark_core::stats::describe;
///
/// let summary = describe(&[1.0, 3.0]);
/// assert_eq!(summary.mean, 2.0);
/// assert_eq!(summary.std, 1.0);
/// assert_eq!(describe(&[]).max, 0.0);
/// ```
pub fn describe(series: &[f64]) -> SeriesSummary {
    if series.is_empty() {
        return SeriesSummary::default();
    }
    let n = series.len() as f64;
    let mean = series.iter().sum::<f64>() / n;
    let variance = series.iter().map(|value| (value - mean).powi(2)).sum::<f64>() / n;
    let max = series.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = series.iter().copied().fold(f64::INFINITY, f64::min);
    SeriesSummary {
        mean,
        std: variance.sqrt(),
        max,
        min,
    }
}

/// Successive differences `t[i] - t[i-1]`; empty for fewer than two values.
///
/// Order is preserved, so out-of-order timestamps yield negative intervals.
pub fn interval_series(timestamps: &[f64]) -> Vec<f64> {
    timestamps
        .windows(2)
        .map(|pair| pair[1] - pair[0])
        .collect()
}

/// Absolute successive differences of a timing series.
pub fn jitter_series(base: &[f64]) -> Vec<f64> {
    base.windows(2).map(|pair| (pair[1] - pair[0]).abs()).collect()
}

/// Jitter bundle over `base`; needs at least two base values.
pub fn jitter_stats(statistic: &'static str, base: &[f64]) -> Result<StatBundle, StatsError> {
    StatsError::require(statistic, 2, base.len())?;
    Ok(StatBundle::from_samples(jitter_series(base)))
}
