//! Run configuration for the summarizer.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::SummaryError;

/// Input and output locations for one summarization run.
///
/// Stored as a plain JSON object on disk:
/// ```json
/// {
///   "trip_paths": ["201402_trip_data.csv", "201408_trip_data.csv"],
///   "station_paths": ["201402_station_data.csv", "201408_station_data.csv"],
///   "output_path": "babs_y1_y2_summary.csv"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryConfig {
    pub trip_paths: Vec<PathBuf>,
    pub station_paths: Vec<PathBuf>,
    pub output_path: PathBuf,
}

impl SummaryConfig {
    pub fn new(
        trip_paths: Vec<PathBuf>,
        station_paths: Vec<PathBuf>,
        output_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            trip_paths,
            station_paths,
            output_path: output_path.into(),
        }
    }

    /// Loads the config from a JSON file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SummaryError::FileNotFound {
                path: path.to_path_buf(),
            }
            .into());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: SummaryConfig = serde_json::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }
}
