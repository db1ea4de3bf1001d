//! Command-line timezone lookup.
//!
//! Resolves a single coordinate, or a CSV file of `lat,lon` rows in
//! parallel.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use csv::{ReaderBuilder, WriterBuilder};
use flate2::read::GzDecoder;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use tzmapper::{Config, CoordError, LookupResult, TimezoneService};

/// Rows resolved between progress bar updates
const CHUNK_SIZE: usize = 10_000;

#[derive(Parser, Debug)]
#[command(name = "lookup")]
#[command(about = "Resolve coordinates to IANA timezones")]
#[command(allow_negative_numbers = true)]
struct Args {
    /// Latitude in degrees
    #[arg(required_unless_present = "csv")]
    lat: Option<f64>,

    /// Longitude in degrees
    #[arg(required_unless_present = "csv")]
    lon: Option<f64>,

    /// CSV file of lat,lon rows (optionally gzipped)
    #[arg(long, conflicts_with_all = ["lat", "lon"])]
    csv: Option<PathBuf>,

    /// The CSV file starts with a header row
    #[arg(long)]
    headers: bool,

    /// Compiled boundary dataset (overrides the config file)
    #[arg(short, long)]
    dataset: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Logs go to stderr so stdout stays clean for results
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::default(),
    };
    if let Some(dataset) = args.dataset.clone() {
        config.dataset.path = Some(dataset);
    }

    let service =
        TimezoneService::initialize(&config).context("Failed to load timezone boundaries")?;

    run(service, &args)
}

/// Dispatch on the requested mode, then release the service.
fn run(service: TimezoneService, args: &Args) -> Result<()> {
    match (&args.csv, args.lat, args.lon) {
        (Some(path), _, _) => run_csv(&service, path, args.headers)?,
        (None, Some(lat), Some(lon)) => run_single(&service, lat, lon)?,
        _ => {}
    }

    service.shutdown();
    Ok(())
}

fn run_single(service: &TimezoneService, lat: f64, lon: f64) -> Result<()> {
    let result = service.resolve(lat, lon)?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", result.zone().unwrap_or("none"))?;
    if result.is_ambiguous() {
        writeln!(stdout, "candidates: {}", result.candidates().join(", "))?;
    }
    Ok(())
}

fn run_csv(service: &TimezoneService, path: &Path, has_headers: bool) -> Result<()> {
    info!("Reading coordinates from {}", path.display());

    let file = File::open(path).context("Failed to open CSV file")?;
    let reader: Box<dyn Read> = if path.extension().map_or(false, |e| e == "gz") {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };
    let points = read_points(reader, has_headers)?;
    info!("Resolving {} coordinates", points.len());

    let pb = ProgressBar::new(points.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})",
            )?
            .progress_chars("#>-"),
    );

    let mut writer = WriterBuilder::new().from_writer(io::stdout().lock());
    let mut matched = 0usize;

    for chunk in points.chunks(CHUNK_SIZE) {
        let results = service.resolve_batch(chunk);
        for (&(lat, lon), result) in chunk.iter().zip(&results) {
            if matches!(result, Ok(r) if r.is_match()) {
                matched += 1;
            }
            writer.write_record([lat.to_string(), lon.to_string(), zone_column(result)])?;
        }
        pb.inc(chunk.len() as u64);
    }

    writer.flush()?;
    pb.finish_with_message("done");
    info!("Resolved {} of {} coordinates", matched, points.len());
    Ok(())
}

/// Parse `lat,lon` rows; extra columns are ignored.
fn read_points<R: Read>(reader: R, has_headers: bool) -> Result<Vec<(f64, f64)>> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(has_headers)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut points = Vec::new();
    for (row, record) in csv_reader.records().enumerate() {
        let record = record?;
        let field = |i: usize, name: &str| -> Result<f64> {
            record
                .get(i)
                .with_context(|| format!("Row {}: missing {}", row + 1, name))?
                .parse::<f64>()
                .with_context(|| format!("Row {}: invalid {}", row + 1, name))
        };
        points.push((field(0, "latitude")?, field(1, "longitude")?));
    }

    Ok(points)
}

fn zone_column(result: &Result<LookupResult, CoordError>) -> String {
    match result {
        Ok(result) => result.zone().unwrap_or("none").to_string(),
        Err(_) => "invalid".to_string(),
    }
}
