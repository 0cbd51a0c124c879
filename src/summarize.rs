//! Streams raw trip files into a single summary CSV.

use anyhow::{Context, Result};
use csv::WriterBuilder;
use std::fs::File;
use std::io::{Read, Write};
use tracing::{info, trace};

use crate::config::SummaryConfig;
use crate::error::SummaryError;
use crate::stations::{StationMap, create_station_mapping};
use crate::table::open_csv;
use crate::trip::{SUMMARY_HEADER, TripColumns, TripSummary};

/// Builds the station map, then writes one summary row per trip row across
/// all of `config.trip_paths`, in order, to `config.output_path`.
///
/// Returns the number of data rows written. Any failure aborts the run and
/// leaves the output partially written.
#[tracing::instrument(skip_all, fields(output = %config.output_path.display()))]
pub fn summarise_data(config: &SummaryConfig) -> Result<usize> {
    let stations = create_station_mapping(&config.station_paths)?;

    // Fail before truncating the output if an input is missing.
    if let Some(missing) = config.trip_paths.iter().find(|p| !p.exists()) {
        return Err(SummaryError::FileNotFound {
            path: missing.clone(),
        }
        .into());
    }

    let out = File::create(&config.output_path)
        .with_context(|| format!("creating {}", config.output_path.display()))?;
    let mut writer = summary_writer(out)?;

    let mut total = 0;
    for path in &config.trip_paths {
        let source_name = path.display().to_string();
        let rdr = open_csv(path)?;
        let rows = summarise_csv(rdr, &source_name, &stations, &mut writer)?;
        info!(path = %source_name, rows, "Trip file summarised");
        total += rows;
    }
    writer.flush()?;

    info!(rows = total, "Summary written");
    Ok(total)
}

/// Summarises in-memory trip sources into `out`.
///
/// Each source is a `(name, reader)` pair; the name only shows up in errors.
/// The header row is always written, even when there are no trips.
pub fn summarise_readers<'a, R, W>(
    trips: impl IntoIterator<Item = (&'a str, R)>,
    stations: &StationMap,
    out: W,
) -> Result<usize>
where
    R: Read,
    W: Write,
{
    let mut writer = summary_writer(out)?;
    let mut total = 0;
    for (source_name, reader) in trips {
        total += summarise_csv(csv::Reader::from_reader(reader), source_name, stations, &mut writer)?;
    }
    writer.flush()?;
    Ok(total)
}

fn summary_writer<W: Write>(out: W) -> Result<csv::Writer<W>> {
    // Headers are written by hand so an empty run still gets them.
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(out);
    writer.write_record(SUMMARY_HEADER)?;
    Ok(writer)
}

fn summarise_csv<R: Read, W: Write>(
    mut rdr: csv::Reader<R>,
    source_name: &str,
    stations: &StationMap,
    writer: &mut csv::Writer<W>,
) -> Result<usize> {
    let headers = rdr
        .headers()
        .with_context(|| format!("reading header of {}", source_name))?
        .clone();
    let columns = TripColumns::resolve(&headers, source_name)?;

    let mut rows = 0;
    for result in rdr.records() {
        let record = result.with_context(|| format!("reading {}", source_name))?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();

        let summary = TripSummary::from_record(&record, &columns, stations, line)
            .with_context(|| format!("summarising {}", source_name))?;
        trace!(line, start_date = %summary.start_date, "Trip summarised");

        writer.serialize(&summary)?;
        rows += 1;
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::read_summary_from_reader;

    const HEADER_LINE: &str = "duration,start_date,start_year,start_month,start_hour,weekday,start_city,end_city,subscription_type";

    const TRIPS_2013: &str = "\
Trip ID,Duration,Start Date,Start Station,Start Terminal,End Date,End Station,End Terminal,Bike #,Subscription Type,Zip Code
4576,63,8/29/2013 14:13,South Van Ness at Market,66,8/29/2013 14:14,South Van Ness at Market,66,520,Subscriber,94127
4607,70,8/29/2013 14:42,San Jose City Hall,10,8/29/2013 14:43,San Jose City Hall,10,661,Subscriber,95138
4130,71,8/29/2013 10:16,Mountain View City Hall,27,8/29/2013 10:17,Mountain View City Hall,27,48,Customer,97214
";

    const TRIPS_2015: &str = "\
Trip ID,Duration,Start Date,Start Station,Start Terminal,End Date,End Station,End Terminal,Bike #,Subscriber Type,Zip Code
913460,765,8/31/2015 23:26,Harry Bridges Plaza (Ferry Building),50,8/31/2015 23:39,San Francisco Caltrain (Townsend at 4th),70,288,Subscriber,2139
";

    fn stations() -> StationMap {
        [
            ("10", "San Jose"),
            ("27", "Mountain View"),
            ("50", "San Francisco"),
            ("66", "San Francisco"),
            ("70", "San Francisco"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_one_row_per_trip_in_order() {
        let mut out = Vec::new();
        let rows = summarise_readers(
            [("2013.csv", TRIPS_2013.as_bytes()), ("2015.csv", TRIPS_2015.as_bytes())],
            &stations(),
            &mut out,
        )
        .unwrap();

        assert_eq!(rows, 4);
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], HEADER_LINE);
        assert_eq!(
            lines[1],
            "1.05,2013-08-29,2013,8,14,3,San Francisco,San Francisco,Subscriber"
        );
        assert_eq!(
            lines[4],
            "12.75,2015-08-31,2015,8,23,0,San Francisco,San Francisco,Subscriber"
        );

        let parsed = read_summary_from_reader(text.as_bytes()).unwrap();
        let cities: Vec<_> = parsed.iter().map(|r| r.start_city.as_str()).collect();
        assert_eq!(
            cities,
            ["San Francisco", "San Jose", "Mountain View", "San Francisco"]
        );
        assert_eq!(parsed[2].subscription_type, "Customer");
    }

    #[test]
    fn test_whole_minutes_keep_fraction() {
        let trips = "Duration,Start Date,Start Terminal,End Terminal,Subscriber Type\n600,8/29/2013 14:13,50,70,Subscriber\n";
        let mut out = Vec::new();
        summarise_readers([("t.csv", trips.as_bytes())], &stations(), &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.lines().nth(1).unwrap().starts_with("10.0,2013-08-29,"));
    }

    #[test]
    fn test_empty_input_writes_header_only() {
        let trips = "Duration,Start Date,Start Terminal,End Terminal,Subscriber Type\n";
        let mut out = Vec::new();
        let rows = summarise_readers([("t.csv", trips.as_bytes())], &stations(), &mut out).unwrap();

        assert_eq!(rows, 0);
        assert_eq!(String::from_utf8(out).unwrap(), format!("{}\n", HEADER_LINE));
    }

    #[test]
    fn test_unknown_terminal_aborts() {
        let trips = "Duration,Start Date,Start Terminal,End Terminal,Subscriber Type\n600,8/29/2013 14:13,50,999,Subscriber\n";
        let mut out = Vec::new();
        let err = summarise_readers([("t.csv", trips.as_bytes())], &stations(), &mut out).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<SummaryError>(),
            Some(SummaryError::MissingStation { terminal, line: 2 }) if terminal == "999"
        ));
    }

    #[test]
    fn test_summarise_data_files() {
        let dir = tempfile::tempdir().unwrap();
        let stations_path = dir.path().join("stations.csv");
        let trips_path = dir.path().join("trips.csv");
        let out_path = dir.path().join("summary.csv");
        std::fs::write(
            &stations_path,
            "station_id,landmark\n10,San Jose\n27,Mountain View\n66,San Francisco\n",
        )
        .unwrap();
        std::fs::write(&trips_path, TRIPS_2013).unwrap();

        let config = SummaryConfig::new(vec![trips_path], vec![stations_path], &out_path);
        let rows = summarise_data(&config).unwrap();

        assert_eq!(rows, 3);
        let content = std::fs::read_to_string(&out_path).unwrap();
        assert_eq!(content.lines().count(), 4);
    }

    #[test]
    fn test_summarise_data_missing_trip_file_keeps_output() {
        let dir = tempfile::tempdir().unwrap();
        let stations_path = dir.path().join("stations.csv");
        let out_path = dir.path().join("summary.csv");
        std::fs::write(&stations_path, "station_id,landmark\n10,San Jose\n").unwrap();
        std::fs::write(&out_path, "previous run\n").unwrap();

        let config = SummaryConfig::new(
            vec![dir.path().join("missing.csv")],
            vec![stations_path],
            &out_path,
        );
        let err = summarise_data(&config).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<SummaryError>(),
            Some(SummaryError::FileNotFound { .. })
        ));
        assert_eq!(std::fs::read_to_string(&out_path).unwrap(), "previous run\n");
    }

    #[test]
    fn test_summarise_data_files_in_order_with_later_missing() {
        let dir = tempfile::tempdir().unwrap();
        let stations_path = dir.path().join("stations.csv");
        let first = dir.path().join("2013.csv");
        let missing = dir.path().join("2015.csv");
        let out_path = dir.path().join("summary.csv");
        std::fs::write(
            &stations_path,
            "station_id,landmark\n10,San Jose\n27,Mountain View\n66,San Francisco\n",
        )
        .unwrap();
        std::fs::write(&first, TRIPS_2013).unwrap();
        std::fs::write(&out_path, "previous run\n").unwrap();

        let config = SummaryConfig::new(vec![first, missing.clone()], vec![stations_path], &out_path);
        let err = summarise_data(&config).unwrap_err();

        match err.downcast_ref::<SummaryError>() {
            Some(SummaryError::FileNotFound { path }) => assert_eq!(path, &missing),
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(std::fs::read_to_string(&out_path).unwrap(), "previous run\n");
    }
}
