//! Copies a raw trip file up to (but excluding) the first row that matches
//! a stop predicate.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use csv::{StringRecord, WriterBuilder};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tracing::info;

use crate::error::SummaryError;
use crate::table::{column_index, open_csv};
use crate::trip::{START_DATE, parse_start_date};

/// Copies the header and then each data row verbatim from `reader` to
/// `writer` until `stop` returns true. The stopping row and everything
/// after it are left out.
///
/// Returns the number of data rows copied.
///
/// # Errors
///
/// [`SummaryError::CutoffNotFound`] if the input ends before `stop` ever
/// matches. Rows copied so far have already been written.
pub fn copy_rows_until<R, W, P>(reader: R, writer: W, stop: P) -> Result<usize>
where
    R: Read,
    W: Write,
    P: FnMut(&StringRecord) -> bool,
{
    copy_csv_until(csv::Reader::from_reader(reader), writer, |_| Ok(stop))
}

/// Builds a stop predicate matching rows whose `Start Date` falls on `date`.
pub fn starts_on(
    headers: &StringRecord,
    date: NaiveDate,
    source_name: &str,
) -> Result<impl FnMut(&StringRecord) -> bool + use<>> {
    let idx = column_index(headers, START_DATE, source_name)?;
    Ok(move |record: &StringRecord| {
        record
            .get(idx)
            .and_then(parse_start_date)
            .is_some_and(|start| start.date() == date)
    })
}

/// Writes the rows of `input` that precede the first trip starting on
/// `cutoff` to `output`.
#[tracing::instrument(skip_all, fields(input = %input.as_ref().display(), cutoff = %cutoff))]
pub fn subset_trip_file(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    cutoff: NaiveDate,
) -> Result<usize> {
    let input = input.as_ref();
    let output = output.as_ref();
    let source_name = input.display().to_string();

    let rdr = open_csv(input)?;
    let out = File::create(output).with_context(|| format!("creating {}", output.display()))?;

    let rows = copy_csv_until(rdr, out, |headers| starts_on(headers, cutoff, &source_name))?;
    info!(rows, output = %output.display(), "Trip subset written");
    Ok(rows)
}

fn copy_csv_until<R, W, F, P>(mut rdr: csv::Reader<R>, writer: W, make_stop: F) -> Result<usize>
where
    R: Read,
    W: Write,
    F: FnOnce(&StringRecord) -> Result<P>,
    P: FnMut(&StringRecord) -> bool,
{
    let headers = rdr.headers()?.clone();
    let mut stop = make_stop(&headers)?;

    let mut out = WriterBuilder::new().has_headers(false).from_writer(writer);
    // An empty input has no header row to copy.
    if !headers.is_empty() {
        out.write_record(&headers)?;
    }

    let mut rows = 0;
    for result in rdr.records() {
        let record = result?;
        if stop(&record) {
            out.flush()?;
            return Ok(rows);
        }
        out.write_record(&record)?;
        rows += 1;
    }
    out.flush()?;

    Err(SummaryError::CutoffNotFound { rows_copied: rows }.into())
}
