//! Station id to city lookup built from one or more station files.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::io::Read;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::table::{column_index, open_csv};

const STATION_ID: &str = "station_id";
const LANDMARK: &str = "landmark";

/// Maps a terminal/station id to the city (landmark) it belongs to.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct StationMap {
    cities: HashMap<String, String>,
}

impl StationMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites the city for `station_id`.
    pub fn insert(&mut self, station_id: impl Into<String>, city: impl Into<String>) {
        self.cities.insert(station_id.into(), city.into());
    }

    pub fn get(&self, station_id: &str) -> Option<&str> {
        self.cities.get(station_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.cities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }

    /// Reads every row of a station CSV into the map. Later rows win.
    ///
    /// Returns the number of rows read.
    pub fn extend_from_reader<R: Read>(&mut self, reader: R, source_name: &str) -> Result<usize> {
        self.extend_from_csv(csv::Reader::from_reader(reader), source_name)
    }

    fn extend_from_csv<R: Read>(&mut self, mut rdr: csv::Reader<R>, source_name: &str) -> Result<usize> {
        let headers = rdr.headers()?.clone();
        let id_idx = column_index(&headers, STATION_ID, source_name)?;
        let city_idx = column_index(&headers, LANDMARK, source_name)?;

        let mut rows = 0;
        for result in rdr.records() {
            let record = result.with_context(|| format!("reading {}", source_name))?;
            let (Some(id), Some(city)) = (record.get(id_idx), record.get(city_idx)) else {
                continue;
            };
            self.insert(id, city);
            rows += 1;
        }
        Ok(rows)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for StationMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = StationMap::new();
        for (id, city) in iter {
            map.insert(id, city);
        }
        map
    }
}

/// Builds a [`StationMap`] by merging `station_paths` in order.
///
/// Later files overwrite earlier ones on id collision.
#[tracing::instrument(skip_all, fields(files = station_paths.len()))]
pub fn create_station_mapping(station_paths: &[PathBuf]) -> Result<StationMap> {
    let mut map = StationMap::new();

    for path in station_paths {
        let rdr = open_csv(path)?;
        let source_name = path.display().to_string();
        let rows = map.extend_from_csv(rdr, &source_name)?;
        debug!(path = %source_name, rows, "Station file loaded");
    }

    info!(stations = map.len(), "Station map built");
    Ok(map)
}
