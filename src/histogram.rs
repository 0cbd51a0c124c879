//! Bin counting behind `plot`: numeric columns are split into equal-width
//! bins, text columns are counted per distinct value.

use anyhow::Result;
use std::collections::HashMap;
use std::fmt;

use crate::error::SummaryError;
use crate::trip::{FieldValue, TripSummary};

const BAR_WIDTH: usize = 40;
const MAX_BINS: usize = 10_000;

/// How numeric bins are sized. A bin count and a bin width cannot both be
/// given.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinSpec {
    Count(usize),
    Width(f64),
}

impl Default for BinSpec {
    fn default() -> Self {
        BinSpec::Count(10)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Histogram {
    /// Bins are `[lower, upper)`, except the last which also includes `upper`.
    Numeric(Vec<Bin>),
    /// Distinct values in order of first appearance.
    Categorical(Vec<(String, usize)>),
}

impl Histogram {
    pub fn total(&self) -> usize {
        match self {
            Histogram::Numeric(bins) => bins.iter().map(|b| b.count).sum(),
            Histogram::Categorical(counts) => counts.iter().map(|(_, c)| c).sum(),
        }
    }
}

/// Counts `field` over `rows`.
///
/// `boundary`, when set, is placed on a bin edge; the remaining edges sit at
/// multiples of the bin width around it, which can add a bin at either end.
pub fn histogram(
    rows: &[&TripSummary],
    field: &str,
    bins: BinSpec,
    boundary: Option<f64>,
) -> Result<Histogram> {
    match bins {
        BinSpec::Count(0) => {
            return Err(SummaryError::InvalidBins("bin count must be positive".into()).into());
        }
        BinSpec::Count(n) if n > MAX_BINS => {
            return Err(SummaryError::InvalidBins(format!("bin count {} exceeds {}", n, MAX_BINS)).into());
        }
        BinSpec::Width(w) if !(w.is_finite() && w > 0.0) => {
            return Err(SummaryError::InvalidBins(format!("bin width {} must be positive", w)).into());
        }
        _ => {}
    }

    let mut numbers = Vec::new();
    let mut texts = Vec::new();
    for row in rows {
        match row.field(field) {
            Some(FieldValue::Number(v)) => numbers.push(v),
            Some(FieldValue::Text(t)) => texts.push(t),
            None => {
                return Err(SummaryError::UnknownField {
                    field: field.to_string(),
                }
                .into());
            }
        }
    }

    if !texts.is_empty() {
        return Ok(Histogram::Categorical(count_values(&texts)));
    }
    Ok(Histogram::Numeric(numeric_bins(&numbers, bins, boundary)?))
}

fn count_values(values: &[&str]) -> Vec<(String, usize)> {
    let mut order: Vec<(String, usize)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for value in values {
        match index.get(value) {
            Some(&i) => order[i].1 += 1,
            None => {
                index.insert(*value, order.len());
                order.push((value.to_string(), 1));
            }
        }
    }
    order
}

fn numeric_bins(values: &[f64], spec: BinSpec, boundary: Option<f64>) -> Result<Vec<Bin>> {
    if values.is_empty() {
        return Ok(Vec::new());
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    if min == max && boundary.is_none() {
        return Ok(vec![Bin {
            lower: min,
            upper: max,
            count: values.len(),
        }]);
    }

    let width = match spec {
        BinSpec::Count(n) if max > min => (max - min) / n as f64,
        BinSpec::Count(_) => 1.0,
        BinSpec::Width(w) => w,
    };

    let start = match boundary {
        Some(b) => b + ((min - b) / width).floor() * width,
        None => min,
    };

    let n_bins = match (spec, boundary) {
        (BinSpec::Count(n), None) => n,
        _ => {
            let n = ((max - start) / width).ceil();
            if !n.is_finite() || n > MAX_BINS as f64 {
                return Err(SummaryError::InvalidBins(format!(
                    "bin width {} over {}..{} needs more than {} bins",
                    width, min, max, MAX_BINS
                ))
                .into());
            }
            (n as usize).max(1)
        }
    };

    let mut bins: Vec<Bin> = (0..n_bins)
        .map(|i| Bin {
            lower: start + i as f64 * width,
            upper: start + (i + 1) as f64 * width,
            count: 0,
        })
        .collect();

    // The last bin is closed, so `max` lands in it rather than past it.
    let last = n_bins - 1;
    for &v in values {
        let idx = (((v - start) / width).floor().max(0.0) as usize).min(last);
        bins[idx].count += 1;
    }
    Ok(bins)
}

impl fmt::Display for Histogram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows: Vec<(String, usize)> = match self {
            Histogram::Numeric(bins) => bins
                .iter()
                .map(|b| (format!("{:>10.2} - {:<10.2}", b.lower, b.upper), b.count))
                .collect(),
            Histogram::Categorical(counts) => counts.clone(),
        };

        let peak = rows.iter().map(|(_, c)| *c).max().unwrap_or(0).max(1);
        let label_width = rows.iter().map(|(l, _)| l.len()).max().unwrap_or(0);

        for (label, count) in rows {
            let bar = "#".repeat(count * BAR_WIDTH / peak);
            writeln!(f, "{:<label_width$} | {:>8} {}", label, count, bar)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trip(duration: f64, subscription: &str) -> TripSummary {
        TripSummary {
            duration,
            start_date: "2013-08-29".to_string(),
            start_year: 2013,
            start_month: 8,
            start_hour: 14,
            weekday: 3,
            start_city: "San Francisco".to_string(),
            end_city: "San Francisco".to_string(),
            subscription_type: subscription.to_string(),
        }
    }

    fn trips(durations: &[f64]) -> Vec<TripSummary> {
        durations.iter().map(|&d| trip(d, "Subscriber")).collect()
    }

    #[test]
    fn test_categorical_counts_in_first_seen_order() {
        let rows = vec![
            trip(1.0, "Subscriber"),
            trip(2.0, "Customer"),
            trip(3.0, "Subscriber"),
        ];
        let refs: Vec<_> = rows.iter().collect();

        let hist = histogram(&refs, "subscription_type", BinSpec::default(), None).unwrap();
        assert_eq!(
            hist,
            Histogram::Categorical(vec![
                ("Subscriber".to_string(), 2),
                ("Customer".to_string(), 1)
            ])
        );
    }

    #[test]
    fn test_bin_count_spans_min_to_max() {
        let rows = trips(&[0.0, 1.0, 2.0, 3.0, 4.0, 10.0]);
        let refs: Vec<_> = rows.iter().collect();

        let Histogram::Numeric(bins) = histogram(&refs, "duration", BinSpec::Count(5), None).unwrap()
        else {
            panic!("expected numeric histogram");
        };

        assert_eq!(bins.len(), 5);
        assert_eq!(bins[0].lower, 0.0);
        assert_eq!(bins[4].upper, 10.0);
        let counts: Vec<_> = bins.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![2, 2, 1, 0, 1]);
    }

    #[test]
    fn test_width_with_boundary() {
        let rows = trips(&[1.5, 4.0, 5.0, 12.0, 59.0]);
        let refs: Vec<_> = rows.iter().collect();

        let Histogram::Numeric(bins) =
            histogram(&refs, "duration", BinSpec::Width(5.0), Some(0.0)).unwrap()
        else {
            panic!("expected numeric histogram");
        };

        assert_eq!(bins.len(), 12);
        assert_eq!(bins[0].lower, 0.0);
        assert_eq!(bins[0].count, 2);
        assert_eq!(bins[1].count, 1);
        assert_eq!(bins[2].count, 1);
        assert_eq!(bins[11].count, 1);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 5);
    }

    #[test]
    fn test_boundary_below_min_extends_left() {
        let rows = trips(&[7.0, 9.0]);
        let refs: Vec<_> = rows.iter().collect();

        let Histogram::Numeric(bins) =
            histogram(&refs, "duration", BinSpec::Width(2.0), Some(0.0)).unwrap()
        else {
            panic!("expected numeric histogram");
        };

        assert_eq!(bins[0].lower, 6.0);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 2);
    }

    #[test]
    fn test_single_value() {
        let rows = trips(&[3.0, 3.0]);
        let refs: Vec<_> = rows.iter().collect();

        let hist = histogram(&refs, "duration", BinSpec::Count(10), None).unwrap();
        assert_eq!(
            hist,
            Histogram::Numeric(vec![Bin {
                lower: 3.0,
                upper: 3.0,
                count: 2
            }])
        );
    }

    #[test]
    fn test_empty_input() {
        let hist = histogram(&[], "duration", BinSpec::Count(10), None).unwrap();
        assert_eq!(hist, Histogram::Numeric(vec![]));
        assert_eq!(hist.total(), 0);
    }

    #[test]
    fn test_invalid_bins() {
        let rows = trips(&[1.0]);
        let refs: Vec<_> = rows.iter().collect();

        for spec in [BinSpec::Count(0), BinSpec::Width(0.0), BinSpec::Width(-5.0)] {
            let err = histogram(&refs, "duration", spec, None).unwrap_err();
            assert!(matches!(
                err.downcast_ref::<SummaryError>(),
                Some(SummaryError::InvalidBins(_))
            ));
        }
    }

    #[test]
    fn test_too_many_bins() {
        let rows = trips(&[0.0, 60.0]);
        let refs: Vec<_> = rows.iter().collect();

        let cases = [
            (BinSpec::Count(usize::MAX), None),
            (BinSpec::Count(MAX_BINS + 1), None),
            (BinSpec::Width(f64::MIN_POSITIVE), None),
            (BinSpec::Width(0.001), Some(0.0)),
        ];
        for (spec, boundary) in cases {
            let err = histogram(&refs, "duration", spec, boundary).unwrap_err();
            assert!(matches!(
                err.downcast_ref::<SummaryError>(),
                Some(SummaryError::InvalidBins(_))
            ));
        }
    }

    #[test]
    fn test_bin_count_with_boundary_adds_bar() {
        let rows = trips(&[1.0, 9.0]);
        let refs: Vec<_> = rows.iter().collect();

        let Histogram::Numeric(bins) =
            histogram(&refs, "duration", BinSpec::Count(4), Some(0.0)).unwrap()
        else {
            panic!("expected numeric histogram");
        };

        let edges: Vec<_> = bins.iter().map(|b| b.lower).collect();
        assert_eq!(edges, vec![0.0, 2.0, 4.0, 6.0, 8.0]);
        assert_eq!(bins[4].upper, 10.0);
        assert_eq!(bins[0].count, 1);
        assert_eq!(bins[4].count, 1);
    }

    #[test]
    fn test_wide_range_within_limit() {
        let rows = trips(&[0.0, 60.0]);
        let refs: Vec<_> = rows.iter().collect();

        let hist = histogram(&refs, "duration", BinSpec::Width(0.5), Some(0.0)).unwrap();
        let Histogram::Numeric(bins) = &hist else {
            panic!("expected numeric histogram");
        };
        assert_eq!(bins.len(), 120);
        assert_eq!(hist.total(), 2);

        let hist = histogram(&refs, "duration", BinSpec::Count(MAX_BINS), None).unwrap();
        assert_eq!(hist.total(), 2);
    }

    #[test]
    fn test_unknown_field() {
        let rows = trips(&[1.0]);
        let refs: Vec<_> = rows.iter().collect();
        assert!(histogram(&refs, "bike_id", BinSpec::default(), None).is_err());
    }

    #[test]
    fn test_display_has_one_line_per_bin() {
        let rows = trips(&[1.0, 2.0, 3.0]);
        let refs: Vec<_> = rows.iter().collect();
        let hist = histogram(&refs, "duration", BinSpec::Count(3), None).unwrap();

        assert_eq!(hist.to_string().lines().count(), 3);
    }
}
