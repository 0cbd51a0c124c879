//! Failure kinds raised by the summary pipeline.
//!
//! Every operation returns `anyhow::Result`; these variants are wrapped in
//! the `anyhow::Error` so callers can `downcast_ref::<SummaryError>()`.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("{source_name}: missing required column `{column}`")]
    MissingColumn { source_name: String, column: String },

    #[error("line {line}: terminal `{terminal}` is not in the station map")]
    MissingStation { terminal: String, line: u64 },

    #[error("line {line}: neither `Subscription Type` nor `Subscriber Type` is present")]
    MissingSubscriptionType { line: u64 },

    #[error("line {line}: invalid start date `{value}`")]
    InvalidStartDate { value: String, line: u64 },

    #[error("line {line}: invalid duration `{value}`")]
    InvalidDuration { value: String, line: u64 },

    #[error("reached end of input after {rows_copied} rows without hitting the cutoff")]
    CutoffNotFound { rows_copied: usize },

    #[error("invalid filter condition `{condition}`")]
    InvalidFilter { condition: String },

    #[error("unknown field `{field}`")]
    UnknownField { field: String },

    #[error("invalid bin configuration: {0}")]
    InvalidBins(String),
}
