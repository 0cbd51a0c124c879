//! CLI entry point for the Bay Area Bike Share trip summarizer.
//!
//! Provides subcommands for cutting a raw trip file down to a date range,
//! summarising trip files into a condensed table, and exploring that table
//! with descriptive statistics, filtered histograms and a time-feature check.

use anyhow::{Result, bail};
use babs_summary::{
    check::TimeFeatureCounts,
    config::SummaryConfig,
    filter::{apply_filters, parse_filters},
    histogram::{BinSpec, histogram},
    stats::UsageStats,
    subset::subset_trip_file,
    summarize::summarise_data,
    table::read_summary,
};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "babs_summary")]
#[command(about = "Summarise and explore Bay Area Bike Share trip data", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Condense trip files into one summary CSV
    Summarize {
        /// JSON run config with trip_paths, station_paths and output_path
        #[arg(short, long, conflicts_with_all = ["trips", "stations", "output"])]
        config: Option<PathBuf>,

        /// Trip CSV files, processed in the given order
        #[arg(short, long, num_args = 1.., required_unless_present = "config")]
        trips: Vec<PathBuf>,

        /// Station CSV files; later files win on duplicate station ids
        #[arg(short, long, num_args = 1.., required_unless_present = "config")]
        stations: Vec<PathBuf>,

        /// Summary CSV to create or overwrite
        #[arg(short, long, required_unless_present = "config")]
        output: Option<PathBuf>,
    },
    /// Copy a raw trip file up to the first trip starting on the cutoff date
    Subset {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,

        /// First excluded day, YYYY-MM-DD
        #[arg(short, long)]
        cutoff: NaiveDate,
    },
    /// Print trip duration statistics for a summary CSV
    Stats {
        #[arg(short, long)]
        input: PathBuf,

        /// Condition such as "duration < 60"; may be repeated
        #[arg(short, long)]
        filter: Vec<String>,

        /// Print as JSON instead of text
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Print a text histogram of one summary column
    Plot {
        #[arg(short, long)]
        input: PathBuf,

        /// Column to count, e.g. duration or subscription_type
        #[arg(long)]
        field: String,

        /// Condition such as "start_city == 'San Francisco'"; may be repeated
        #[arg(short, long)]
        filter: Vec<String>,

        /// Number of bins (default 10)
        #[arg(long, conflicts_with = "bin_width")]
        bins: Option<usize>,

        /// Width of each bin
        #[arg(long)]
        bin_width: Option<f64>,

        /// Value that one bin edge is placed on
        #[arg(long)]
        boundary: Option<f64>,
    },
    /// Count trips per derived time feature and check the values are sane
    Check {
        #[arg(short, long)]
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/babs_summary.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("babs_summary.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Summarize {
            config,
            trips,
            stations,
            output,
        } => {
            let config = match (config, output) {
                (Some(path), _) => SummaryConfig::load(path)?,
                (None, Some(output)) => SummaryConfig::new(trips, stations, output),
                (None, None) => bail!("either --config or --output is required"),
            };
            let rows = summarise_data(&config)?;
            info!(rows, output = %config.output_path.display(), "Done");
        }
        Commands::Subset {
            input,
            output,
            cutoff,
        } => {
            subset_trip_file(&input, &output, cutoff)?;
        }
        Commands::Stats {
            input,
            filter,
            json,
        } => {
            let rows = read_summary(&input)?;
            let conditions = parse_filters(&filter)?;
            let kept = apply_filters(&rows, &conditions);
            info!(total = rows.len(), kept = kept.len(), "Rows filtered");

            let stats = UsageStats::from_trips(kept);
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                print!("{}", stats);
            }
        }
        Commands::Plot {
            input,
            field,
            filter,
            bins,
            bin_width,
            boundary,
        } => {
            let rows = read_summary(&input)?;
            let conditions = parse_filters(&filter)?;
            let kept = apply_filters(&rows, &conditions);

            let spec = match (bins, bin_width) {
                (_, Some(width)) => BinSpec::Width(width),
                (Some(n), None) => BinSpec::Count(n),
                (None, None) => BinSpec::default(),
            };
            let hist = histogram(&kept, &field, spec, boundary)?;
            info!(field = %field, counted = hist.total(), "Histogram computed");
            print!("{}", hist);
        }
        Commands::Check { input } => {
            let rows = read_summary(&input)?;
            let counts = TimeFeatureCounts::from_trips(&rows);
            counts.validate()?;

            for (name, family) in [
                ("start_month", &counts.by_month),
                ("start_hour", &counts.by_hour),
                ("weekday", &counts.by_weekday),
            ] {
                for (value, count) in family {
                    println!("{:<12} {:>3} {:>8}", name, value, count);
                }
            }
            for (year, count) in &counts.by_year {
                println!("{:<12} {:>3} {:>8}", "start_year", year, count);
            }
            info!(rows = counts.rows, "Time features look sane");
        }
    }

    Ok(())
}
