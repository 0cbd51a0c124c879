//! Sanity check of the derived time features in a summary table.

use anyhow::{Result, bail};
use std::collections::BTreeMap;
use std::ops::RangeInclusive;
use tracing::debug;

use crate::trip::TripSummary;

/// Trip counts per derived time feature.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TimeFeatureCounts {
    pub rows: usize,
    pub by_year: BTreeMap<i32, usize>,
    pub by_month: BTreeMap<u32, usize>,
    pub by_hour: BTreeMap<u32, usize>,
    pub by_weekday: BTreeMap<u32, usize>,
}

impl TimeFeatureCounts {
    pub fn from_trips<'a>(trips: impl IntoIterator<Item = &'a TripSummary>) -> Self {
        let mut counts = Self::default();
        for trip in trips {
            counts.rows += 1;
            *counts.by_year.entry(trip.start_year).or_default() += 1;
            *counts.by_month.entry(trip.start_month).or_default() += 1;
            *counts.by_hour.entry(trip.start_hour).or_default() += 1;
            *counts.by_weekday.entry(trip.weekday).or_default() += 1;
        }
        counts
    }

    /// Checks every month, hour and weekday is in range and that each
    /// feature accounts for every row.
    pub fn validate(&self) -> Result<()> {
        check_range("start_month", &self.by_month, 1..=12)?;
        check_range("start_hour", &self.by_hour, 0..=23)?;
        check_range("weekday", &self.by_weekday, 0..=6)?;

        for (name, total) in [
            ("start_year", self.by_year.values().sum::<usize>()),
            ("start_month", self.by_month.values().sum()),
            ("start_hour", self.by_hour.values().sum()),
            ("weekday", self.by_weekday.values().sum()),
        ] {
            if total != self.rows {
                bail!("{} counts cover {} of {} rows", name, total, self.rows);
            }
        }

        debug!(rows = self.rows, years = self.by_year.len(), "Time features validated");
        Ok(())
    }
}

fn check_range(name: &str, counts: &BTreeMap<u32, usize>, range: RangeInclusive<u32>) -> Result<()> {
    if let Some(bad) = counts.keys().find(|k| !range.contains(*k)) {
        bail!("{} value {} outside {:?}", name, bad, range);
    }
    Ok(())
}
