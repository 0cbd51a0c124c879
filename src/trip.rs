//! Raw trip rows and the condensed per-trip summary derived from them.

use anyhow::Result;
use chrono::{Datelike, NaiveDateTime, Timelike};
use csv::StringRecord;
use serde::{Deserialize, Serialize};

use crate::error::SummaryError;
use crate::stations::StationMap;
use crate::table::{column_index, first_column};

pub const DURATION: &str = "Duration";
pub const START_DATE: &str = "Start Date";
pub const START_TERMINAL: &str = "Start Terminal";
pub const END_TERMINAL: &str = "End Terminal";

/// Column names carrying the subscription type, in order of preference.
/// Older exports say `Subscription Type`, newer ones `Subscriber Type`.
pub const SUBSCRIPTION_COLUMNS: [&str; 2] = ["Subscription Type", "Subscriber Type"];

/// Timestamp layout of `Start Date`, e.g. `8/29/2013 14:13`.
pub const START_DATE_FORMAT: &str = "%m/%d/%Y %H:%M";

/// Header of the summary file, in output order.
pub const SUMMARY_HEADER: [&str; 9] = [
    "duration",
    "start_date",
    "start_year",
    "start_month",
    "start_hour",
    "weekday",
    "start_city",
    "end_city",
    "subscription_type",
];

/// One condensed, analysis-ready trip. Field order matches [`SUMMARY_HEADER`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripSummary {
    /// Minutes, unrounded.
    pub duration: f64,
    pub start_date: String,
    pub start_year: i32,
    pub start_month: u32,
    pub start_hour: u32,
    /// 0 = Monday .. 6 = Sunday
    pub weekday: u32,
    pub start_city: String,
    pub end_city: String,
    pub subscription_type: String,
}

/// Positions of the trip columns the summarizer reads, resolved once per file.
#[derive(Debug, Clone, Copy)]
pub struct TripColumns {
    duration: usize,
    start_date: usize,
    start_terminal: usize,
    end_terminal: usize,
    subscription: Option<usize>,
}

impl TripColumns {
    pub fn resolve(headers: &StringRecord, source_name: &str) -> Result<Self> {
        Ok(Self {
            duration: column_index(headers, DURATION, source_name)?,
            start_date: column_index(headers, START_DATE, source_name)?,
            start_terminal: column_index(headers, START_TERMINAL, source_name)?,
            end_terminal: column_index(headers, END_TERMINAL, source_name)?,
            subscription: first_column(headers, &SUBSCRIPTION_COLUMNS),
        })
    }
}

pub fn parse_start_date(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, START_DATE_FORMAT).ok()
}

impl TripSummary {
    /// Derives the summary for one raw trip record.
    ///
    /// `line` is only used for error reporting.
    pub fn from_record(
        record: &StringRecord,
        columns: &TripColumns,
        stations: &StationMap,
        line: u64,
    ) -> Result<Self> {
        let field = move |idx: usize| record.get(idx).unwrap_or_default();

        let raw_duration = field(columns.duration);
        let seconds: f64 = raw_duration
            .parse()
            .map_err(|_| SummaryError::InvalidDuration {
                value: raw_duration.to_string(),
                line,
            })?;

        let raw_start = field(columns.start_date);
        let start = parse_start_date(raw_start).ok_or_else(|| SummaryError::InvalidStartDate {
            value: raw_start.to_string(),
            line,
        })?;

        let city = |idx: usize| -> Result<String> {
            let terminal = field(idx);
            stations
                .get(terminal)
                .map(str::to_string)
                .ok_or_else(|| {
                    SummaryError::MissingStation {
                        terminal: terminal.to_string(),
                        line,
                    }
                    .into()
                })
        };
        let start_city = city(columns.start_terminal)?;
        let end_city = city(columns.end_terminal)?;

        let subscription_type = columns
            .subscription
            .map(field)
            .ok_or(SummaryError::MissingSubscriptionType { line })?
            .to_string();

        Ok(TripSummary {
            duration: seconds / 60.0,
            start_date: start.format("%Y-%m-%d").to_string(),
            start_year: start.year(),
            start_month: start.month(),
            start_hour: start.hour(),
            weekday: start.weekday().num_days_from_monday(),
            start_city,
            end_city,
            subscription_type,
        })
    }
}

/// A single column value of a [`TripSummary`], looked up by column name.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Number(f64),
    Text(&'a str),
}

impl TripSummary {
    /// Returns the value of the summary column named `name`, if it exists.
    pub fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        let value = match name {
            "duration" => FieldValue::Number(self.duration),
            "start_date" => FieldValue::Text(&self.start_date),
            "start_year" => FieldValue::Number(self.start_year as f64),
            "start_month" => FieldValue::Number(self.start_month as f64),
            "start_hour" => FieldValue::Number(self.start_hour as f64),
            "weekday" => FieldValue::Number(self.weekday as f64),
            "start_city" => FieldValue::Text(&self.start_city),
            "end_city" => FieldValue::Text(&self.end_city),
            "subscription_type" => FieldValue::Text(&self.subscription_type),
            _ => return None,
        };
        Some(value)
    }
}
