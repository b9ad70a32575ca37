//! Berlin transit CLI
//!
//! Command-line front end for stop search, departures, live vehicles and
//! region polling against the Berlin transit backends.

#![allow(clippy::print_stdout)]

mod render;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use application::ports::{StopsPort, VehiclesPort};
use application::{PollingConfig, PollingController};
use clap::{Args, Parser, Subcommand};
use domain::stop_code::normalize;
use domain::{CancellationToken, GeoLocation, MapRegion};
use infrastructure::{AppConfig, TransitAdapter, init_tracing};
use integration_transit::DEFAULT_DEPARTURES_WINDOW_SECS;
use integration_transit::planner::{
    DEFAULT_MAX_DEPARTURES, DEFAULT_MAX_DISTANCE_M, DEFAULT_MAX_NEARBY, DEFAULT_MAX_SUGGESTIONS,
};
use tracing::info;

/// Berlin transit CLI
#[derive(Parser)]
#[command(name = "transit-cli")]
#[command(author, version, about = "Berlin transit map CLI", long_about = None)]
struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Configuration file (defaults to ./transit-map.toml when present)
    #[arg(short, long, env = "TRANSITMAP_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Map position, defaulting to central Berlin
#[derive(Args, Debug, Clone)]
struct PositionArgs {
    /// Latitude in degrees
    #[arg(long, allow_hyphen_values = true)]
    lat: Option<f64>,

    /// Longitude in degrees
    #[arg(long, allow_hyphen_values = true)]
    lon: Option<f64>,
}

impl PositionArgs {
    fn location(&self) -> anyhow::Result<GeoLocation> {
        let berlin = GeoLocation::berlin();
        Ok(GeoLocation::new(
            self.lat.unwrap_or(berlin.latitude()),
            self.lon.unwrap_or(berlin.longitude()),
        )?)
    }
}

/// Visible map region
#[derive(Args, Debug, Clone)]
struct RegionArgs {
    #[command(flatten)]
    position: PositionArgs,

    /// Latitude span in degrees
    #[arg(long, default_value_t = 0.05)]
    lat_delta: f64,

    /// Longitude span in degrees
    #[arg(long, default_value_t = 0.05)]
    lon_delta: f64,
}

impl RegionArgs {
    fn region(&self) -> anyhow::Result<MapRegion> {
        Ok(MapRegion::new(
            self.position.location()?,
            self.lat_delta,
            self.lon_delta,
        )?)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List stops near a position (journey planner)
    Stops {
        #[command(flatten)]
        position: PositionArgs,

        /// Search radius in meters
        #[arg(short, long, default_value_t = DEFAULT_MAX_DISTANCE_M)]
        radius: u32,

        /// Maximum number of stops
        #[arg(short, long, default_value_t = DEFAULT_MAX_NEARBY)]
        max: u32,
    },

    /// Search stops by name (journey planner)
    Search {
        /// Free-text query
        query: String,

        /// Maximum number of results
        #[arg(short, long, default_value_t = DEFAULT_MAX_SUGGESTIONS)]
        max: u32,
    },

    /// Upcoming departures from the REST backend
    ///
    /// Accepts planner ids (A=1@...@L=900100003@), prefixed codes
    /// (de:11000:900100003) or plain station codes.
    Departures {
        /// Stop id or station code
        stop_id: String,

        /// Look-ahead window in seconds
        #[arg(short, long, default_value_t = DEFAULT_DEPARTURES_WINDOW_SECS)]
        window: u32,
    },

    /// Upcoming departures from the journey planner
    PlannerDepartures {
        /// Planner station id
        station_id: String,

        /// Maximum number of departures
        #[arg(short, long, default_value_t = DEFAULT_MAX_DEPARTURES)]
        max: u32,
    },

    /// Live vehicles inside a region
    Vehicles {
        #[command(flatten)]
        region: RegionArgs,

        /// Radar window in seconds (defaults to the polling configuration)
        #[arg(short, long)]
        window: Option<u32>,
    },

    /// Route geometry and stopovers of a trip
    Route {
        /// Trip id as reported with a vehicle or departure
        trip_id: String,
    },

    /// Print the REST station code for a stop id
    Normalize {
        /// Stop id in any supported form
        stop_id: String,
    },

    /// Poll a region and print every state change until interrupted
    Watch {
        #[command(flatten)]
        region: RegionArgs,

        /// Start with live vehicle tracking off
        #[arg(long)]
        no_live: bool,

        /// Stop after this many seconds
        #[arg(short, long)]
        duration: Option<u64>,
    },
}

/// Determine log filter level from verbosity count
const fn log_filter_from_verbosity(verbose: u8) -> Option<&'static str> {
    match verbose {
        0 => None,
        1 => Some("info"),
        2 => Some("debug"),
        _ => Some("trace"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Commands::Normalize { stop_id } = &cli.command {
        println!("{}", normalize(stop_id));
        return Ok(());
    }

    let mut config = AppConfig::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(filter) = log_filter_from_verbosity(cli.verbose) {
        config.logging.log_filter = filter.to_string();
    }
    init_tracing(&config.logging)?;

    let adapter = TransitAdapter::from_config(&config.transit)?;
    let cancel = CancellationToken::new();

    match cli.command {
        Commands::Stops {
            position,
            radius,
            max,
        } => {
            let stops = adapter
                .nearby_stops(position.location()?, radius, max, &cancel)
                .await?;
            println!("🚏 {} stop(s)", stops.len());
            for stop in &stops {
                println!("{}", render::stop_line(stop));
            }
        },

        Commands::Search { query, max } => {
            let stops = adapter.search_stops(&query, max, &cancel).await?;
            println!("🔎 {} match(es) for \"{}\"", stops.len(), query.trim());
            for stop in &stops {
                println!("{}", render::stop_line(stop));
            }
        },

        Commands::Departures { stop_id, window } => {
            let departures = adapter.departures(&stop_id, window, &cancel).await?;
            println!("🕐 {} departure(s) at {}", departures.len(), normalize(&stop_id));
            for departure in &departures {
                println!("{}", departure.format_summary());
            }
        },

        Commands::PlannerDepartures { station_id, max } => {
            let departures = adapter
                .planner_departures(&station_id, max, &cancel)
                .await?;
            println!("🕐 {} departure(s)", departures.len());
            for departure in &departures {
                println!("{}", departure.format_summary());
            }
        },

        Commands::Vehicles { region, window } => {
            let window = window.unwrap_or(config.polling.vehicle_window_secs);
            let vehicles = adapter
                .vehicles_in(region.region()?.bounding_box(), window, &cancel)
                .await?;
            println!("🚆 {} vehicle(s)", vehicles.len());
            for vehicle in &vehicles {
                println!("{}", render::vehicle_line(vehicle));
            }
        },

        Commands::Route { trip_id } => match adapter.trip_route(&trip_id, &cancel).await? {
            Some(route) => {
                for line in render::route_lines(&route) {
                    println!("{line}");
                }
            },
            None => println!("No route available for {trip_id}"),
        },

        Commands::Watch {
            region,
            no_live,
            duration,
        } => {
            let mut polling = config.polling.clone();
            if no_live {
                polling.live_on_start = false;
            }
            watch(adapter, region.region()?, polling, duration.map(Duration::from_secs)).await?;
        },

        Commands::Normalize { .. } => {},
    }

    Ok(())
}

/// Drive a polling controller until Ctrl-C or the optional deadline
async fn watch(
    adapter: TransitAdapter,
    region: MapRegion,
    config: PollingConfig,
    duration: Option<Duration>,
) -> anyhow::Result<()> {
    let adapter = Arc::new(adapter);
    let handle = PollingController::spawn(adapter.clone(), adapter, config)?;
    let mut snapshots = handle.subscribe();
    handle.region_changed(region).await?;
    info!(center = %region.center, "Watching region");

    let deadline = async {
        match duration {
            Some(duration) => tokio::time::sleep(duration).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            () = &mut deadline => break,
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                println!("{}", render::snapshot_line(&snapshot));
            },
        }
    }

    handle.shutdown().await?;
    Ok(())
}
