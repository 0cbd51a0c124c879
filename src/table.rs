//! Shared CSV plumbing: opening header-bearing input files, resolving
//! columns by name, and loading a produced summary table back into memory.

use anyhow::{Context, Result};
use csv::StringRecord;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

use crate::error::SummaryError;
use crate::trip::TripSummary;

/// Opens `path` as a header-bearing CSV reader.
///
/// # Errors
///
/// Returns [`SummaryError::FileNotFound`] when the path does not exist.
pub fn open_csv(path: &Path) -> Result<csv::Reader<File>> {
    if !path.exists() {
        return Err(SummaryError::FileNotFound {
            path: path.to_path_buf(),
        }
        .into());
    }
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    Ok(csv::Reader::from_reader(file))
}

/// Returns the position of `column` in `headers`.
pub fn column_index(headers: &StringRecord, column: &str, source_name: &str) -> Result<usize> {
    find_column(headers, column).ok_or_else(|| {
        SummaryError::MissingColumn {
            source_name: source_name.to_string(),
            column: column.to_string(),
        }
        .into()
    })
}

/// Returns the position of the first of `candidates` present in `headers`.
pub fn first_column(headers: &StringRecord, candidates: &[&str]) -> Option<usize> {
    candidates.iter().find_map(|c| find_column(headers, c))
}

fn find_column(headers: &StringRecord, column: &str) -> Option<usize> {
    headers.iter().position(|h| h == column)
}

/// Loads a summary CSV previously written by the summarizer.
pub fn read_summary(path: impl AsRef<Path>) -> Result<Vec<TripSummary>> {
    let path = path.as_ref();
    let rdr = open_csv(path)?;
    let rows = collect_rows(rdr).with_context(|| format!("reading {}", path.display()))?;
    debug!(path = %path.display(), rows = rows.len(), "Summary table loaded");
    Ok(rows)
}

/// Loads summary rows from any reader, e.g. an in-memory buffer.
pub fn read_summary_from_reader<R: Read>(reader: R) -> Result<Vec<TripSummary>> {
    collect_rows(csv::Reader::from_reader(reader))
}

fn collect_rows<R: Read>(mut rdr: csv::Reader<R>) -> Result<Vec<TripSummary>> {
    let mut rows = Vec::new();
    for result in rdr.deserialize() {
        let record: TripSummary = result?;
        rows.push(record);
    }
    Ok(rows)
}
