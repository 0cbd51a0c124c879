//! Descriptive statistics over trip durations.

use serde::Serialize;
use std::fmt;

use crate::trip::TripSummary;

/// Duration statistics (minutes) for a set of trips. The duration fields are
/// `None` when there are no trips.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct UsageStats {
    pub count: usize,
    pub mean: Option<f64>,
    pub stddev: Option<f64>,
    pub min: Option<f64>,
    pub q1: Option<f64>,
    pub median: Option<f64>,
    pub q3: Option<f64>,
    pub max: Option<f64>,
}

impl UsageStats {
    pub fn from_trips<'a>(trips: impl IntoIterator<Item = &'a TripSummary>) -> Self {
        let mut durations: Vec<f64> = trips.into_iter().map(|t| t.duration).collect();
        if durations.is_empty() {
            return Self::default();
        }
        durations.sort_by(f64::total_cmp);

        let avg = mean(&durations);
        UsageStats {
            count: durations.len(),
            mean: Some(avg),
            stddev: Some(stddev(&durations, avg)),
            min: durations.first().copied(),
            q1: Some(percentile(&durations, 0.25)),
            median: Some(percentile(&durations, 0.5)),
            q3: Some(percentile(&durations, 0.75)),
            max: durations.last().copied(),
        }
    }
}

/// Computes the arithmetic mean of a slice of values. Returns 0.0 for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Computes the population standard deviation given a pre-computed mean.
/// Returns 0.0 for empty input.
pub fn stddev(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;

    variance.sqrt()
}

/// Percentile `p` (0.0–1.0) of already sorted values, interpolating linearly
/// between the two closest ranks. Returns 0.0 for empty input.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = p.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
}

impl fmt::Display for UsageStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "There are {} data points in the dataset.", self.count)?;
        let (Some(mean), Some(median), Some(q1), Some(q3)) = (self.mean, self.median, self.q1, self.q3)
        else {
            return Ok(());
        };
        writeln!(f, "The average duration of trips is {:.2} minutes.", mean)?;
        writeln!(f, "The median trip duration is {:.2} minutes.", median)?;
        writeln!(
            f,
            "25% of trips are shorter than {:.2} minutes.\n25% of trips are longer than {:.2} minutes.",
            q1, q3
        )
    }
}
