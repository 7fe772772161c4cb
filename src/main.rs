//! CLI entry point for the subway arrivals console.
//!
//! Without a subcommand it runs the interactive stop lookup. `arrivals` and
//! `stops` answer a single question and exit.

use anyhow::{Result, anyhow};
use chrono::Utc;
use chrono_tz::Tz;
use clap::{Parser, Subcommand};
use mta_arrivals::{
    arrivals::extract_arrivals,
    fetch::{BasicClient, FeedSource, MtaFeeds, auth::ApiKey},
    output::{ArrivalReport, write_arrivals, write_banner, write_json, write_stop_list},
    parser::parse_feed,
    routes::{DEFAULT_FEED_BASE_URL, FeedTable},
    session::Session,
    stations::{StationFile, StopDirectory},
};
use std::ffi::OsStr;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "mta_arrivals")]
#[command(about = "Look up subway stops and their upcoming arrivals", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// XML station table to search
    #[arg(
        long,
        global = true,
        env = "MTA_STATIONS_FILE",
        default_value = "./mta_info.xml"
    )]
    stations: PathBuf,

    /// IANA time zone arrival times are shown in
    #[arg(
        long,
        global = true,
        env = "MTA_TIMEZONE",
        default_value = "America/New_York"
    )]
    timezone: String,

    /// Base URL the per-route-group feed paths are appended to
    #[arg(
        long,
        global = true,
        env = "MTA_FEED_BASE_URL",
        default_value = DEFAULT_FEED_BASE_URL
    )]
    feed_base_url: String,

    /// API key sent in the x-api-key header
    #[arg(long, global = true, env = "MTA_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print upcoming arrivals for a known stop ID
    Arrivals {
        /// Route ID, e.g. F
        #[arg(short, long)]
        route: String,

        /// Stop ID, e.g. F23 (or F23N with no --direction)
        #[arg(short, long)]
        stop: String,

        /// Direction suffix appended to the stop ID (N or S)
        #[arg(short, long, default_value = "")]
        direction: String,

        /// Print the report as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// List every stop name, or show the stop IDs of one stop
    Stops {
        /// Exact stop name to look up
        name: Option<String>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    let _log_guard = init_logging();

    let cli = Cli::parse();

    let tz: Tz = cli
        .timezone
        .parse()
        .map_err(|e| anyhow!("invalid time zone '{}': {e}", cli.timezone))?;
    let table = FeedTable::with_base_url(&cli.feed_base_url);

    match cli.api_key.as_deref() {
        Some(key) => {
            let client = ApiKey::mta(BasicClient::new(), key)?;
            run(&cli, tz, MtaFeeds::new(client, table)).await
        }
        None => run(&cli, tz, MtaFeeds::new(BasicClient::new(), table)).await,
    }
}

/// Colored stderr logs, plus a JSON rolling log file when `LOG_FILE_PATH` is set.
///
/// Stderr defaults to `warn` so diagnostics stay out of the way of the
/// prompts; `RUST_LOG` and `RUST_LOG_JSON` override the two filters.
fn init_logging() -> Option<WorkerGuard> {
    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")));

    let (json_layer, guard) = match std::env::var("LOG_FILE_PATH") {
        Ok(log_file_path) => {
            let path = Path::new(&log_file_path);
            let log_dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or(Path::new("logs"));
            let log_file_name = path
                .file_name()
                .unwrap_or(OsStr::new("mta_arrivals.log"));

            let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
            let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

            let layer = fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .with_writer(non_blocking_file)
                .with_filter(
                    EnvFilter::try_from_env("RUST_LOG_JSON")
                        .unwrap_or_else(|_| EnvFilter::new("debug")),
                );
            (Some(layer), Some(guard))
        }
        Err(_) => (None, None),
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    guard
}

async fn run<F: FeedSource>(cli: &Cli, tz: Tz, feeds: F) -> Result<()> {
    let stations = StationFile::new(&cli.stations);

    match &cli.command {
        None => interactive(&stations, &feeds, tz).await,
        Some(Commands::Arrivals {
            route,
            stop,
            direction,
            json,
        }) => arrivals(&feeds, tz, route, stop, direction, *json).await,
        Some(Commands::Stops { name }) => stops(&stations, name.as_deref()),
    }
}

/// Runs the interactive lookup on stdin/stdout.
///
/// The station table must be readable at startup; later lookup failures are
/// reported inside the session instead.
#[tracing::instrument(skip_all, fields(stations = %stations.path().display()))]
async fn interactive<F: FeedSource>(stations: &StationFile, feeds: &F, tz: Tz) -> Result<()> {
    let stop_names = stations.stop_names().inspect_err(|e| {
        error!(error = %e, "Station table unavailable");
    })?;

    if stop_names.is_empty() {
        println!("No stop names found in the XML file.");
        return Ok(());
    }
    info!(stops = stop_names.len(), "Station table loaded");

    let stdin = std::io::stdin();
    let mut session = Session::new(stations, feeds, stop_names, stdin.lock(), std::io::stdout())
        .with_timezone(tz);
    session.run().await?;

    info!("Session finished");
    Ok(())
}

/// One-shot arrivals report for a stop ID the caller already knows.
#[tracing::instrument(skip(feeds, tz))]
async fn arrivals<F: FeedSource>(
    feeds: &F,
    tz: Tz,
    route: &str,
    stop: &str,
    direction: &str,
    json: bool,
) -> Result<()> {
    let route_id = route.trim().to_uppercase();
    let stop_id = format!(
        "{}{}",
        stop.trim().to_uppercase(),
        direction.trim().to_uppercase()
    );

    let bytes = feeds.fetch_feed(&route_id).await?;
    let feed = parse_feed(&bytes)?;
    let now = Utc::now().with_timezone(&tz);
    let arrivals = extract_arrivals(&feed, &route_id, &stop_id, now);
    info!(count = arrivals.len(), "Arrivals extracted");

    let mut out = std::io::stdout().lock();
    if json {
        let report = ArrivalReport {
            route_id: &route_id,
            stop_id: &stop_id,
            generated_at: now,
            arrivals: &arrivals,
        };
        write_json(&mut out, &report)?;
    } else {
        write_banner(&mut out, &now)?;
        write_arrivals(&mut out, &route_id, &arrivals)?;
    }

    Ok(())
}

/// Lists every stop name, or the stop IDs and routes of `name`.
fn stops(stations: &StationFile, name: Option<&str>) -> Result<()> {
    let mut out = std::io::stdout().lock();

    let Some(name) = name else {
        let names = stations.stop_names()?;
        write_stop_list(&mut out, &names)?;
        return Ok(());
    };

    let records = stations.find_stop(name)?;
    if records.is_empty() {
        writeln!(out, "No GTFS Stop ID found for {name}")?;
        return Ok(());
    }

    writeln!(out, "GTFS Stop ID(s) and Daytime Routes for {name}:")?;
    for record in &records {
        for stop_id in &record.stop_ids {
            writeln!(
                out,
                "Stop ID: {stop_id}, Daytime Routes: {}",
                record.daytime_routes
            )?;
        }
    }

    Ok(())
}
