// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::error::Error;
use std::path::{Path, PathBuf};

use clap::{ArgAction, Args, Parser, Subcommand};
use log::LevelFilter;
use serde_json::{json, Value};

use floodroute::config::ConfigError;
use floodroute::polyline::{DEFAULT_PRECISION, MAX_PRECISION};
use floodroute::source::{self, FileFormat, SensorOptions, SourceError};
use floodroute::{Annotation, Config, EvaluatedRoute, FloodIndex, Preference};

#[derive(Debug, thiserror::Error)]
#[error("{0}: {1}")]
struct LoadError<E: Error + 'static>(PathBuf, #[source] E);

#[derive(Parser)]
#[command(version, about = "Flood-aware evaluation of candidate routes")]
struct Cli {
    /// TOML file overriding the built-in thresholds, vehicles and sensor nodes
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log more (may be repeated)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Log less (may be repeated)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    quiet: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Evaluate an OSRM route response against a sensor dump and print
    /// the viable routes as a GeoJSON FeatureCollection
    Route(RouteArgs),

    /// Print the severity and flood status of water levels
    Classify(ClassifyArgs),

    /// List the latest readings above a water level, deepest first
    Flooded(FloodedArgs),
}

#[derive(Args)]
struct RouteArgs {
    /// The path to the sensor store dump (JSON, optionally gzip or bzip2 compressed)
    sensors_file: PathBuf,

    /// The path to the OSRM route response (JSON, optionally gzip or bzip2 compressed)
    routes_file: PathBuf,

    /// Vehicle type, e.g. sedan, suv, pickup or 4x4
    #[arg(long, default_value = "sedan")]
    vehicle: String,

    /// Route ordering: shortest, safest or longest
    #[arg(long, default_value_t = Preference::Shortest)]
    preference: Preference,

    /// Precision of the encoded route geometries
    #[arg(
        long,
        default_value_t = DEFAULT_PRECISION,
        value_parser = clap::value_parser!(u32).range(..=i64::from(MAX_PRECISION)),
    )]
    precision: u32,
}

#[derive(Args)]
struct ClassifyArgs {
    /// Water levels, in centimeters
    #[arg(required = true, allow_negative_numbers = true)]
    water_levels: Vec<f64>,

    /// Externally supplied severity label, taking precedence over the water level
    #[arg(long)]
    label: Option<String>,
}

#[derive(Args)]
struct FloodedArgs {
    /// The path to the sensor store dump (JSON, optionally gzip or bzip2 compressed)
    sensors_file: PathBuf,

    /// Only list readings strictly above this level, in centimeters
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    min_level: f64,
}

pub fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    colog::default_builder()
        .filter_level(level_filter(cli.verbose, cli.quiet))
        .init();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => Config::default(),
    };

    match cli.command {
        Command::Route(args) => route(&config, &args),
        Command::Classify(args) => {
            classify(&config, &args);
            Ok(())
        }
        Command::Flooded(args) => flooded(&config, &args),
    }
}

fn route(config: &Config, args: &RouteArgs) -> Result<(), Box<dyn Error>> {
    let index = load_readings(config, &args.sensors_file)?;
    let candidates = source::available_routes_from_file(FileFormat::Unknown, &args.routes_file)
        .map_err(|e| LoadError(args.routes_file.clone(), e))?;

    let vehicle = config.vehicle(&args.vehicle);
    let options = floodroute::PlanOptions {
        preference: args.preference,
        proximity_km: config.proximity_km,
        precision: args.precision,
    };

    let plan = match floodroute::plan(&candidates, &vehicle, &index, &options) {
        Ok(plan) => plan,
        Err(e) => {
            let collection = json!({
                "type": "FeatureCollection",
                "vehicle": vehicle,
                "features": [],
                "rejected": [],
                "no_viable_route": {"reason": e.reason, "message": e.to_string()}
            });
            println!("{}", serde_json::to_string_pretty(&collection)?);
            return Ok(());
        }
    };

    let mut features = plan
        .ranked
        .iter()
        .map(|r| route_feature(&r.route, Some(r.rank), &r.annotation))
        .collect::<Vec<_>>();
    features.extend(
        plan.impassable
            .iter()
            .map(|r| route_feature(r, None, &Annotation::new(r, args.preference))),
    );

    let rejected = plan
        .rejected
        .iter()
        .map(|r| json!({"name": r.name, "error": r.error.to_string()}))
        .collect::<Vec<_>>();

    let collection = json!({
        "type": "FeatureCollection",
        "vehicle": vehicle,
        "features": features,
        "rejected": rejected
    });
    println!("{}", serde_json::to_string_pretty(&collection)?);

    Ok(())
}

fn route_feature(route: &EvaluatedRoute, rank: Option<usize>, annotation: &Annotation) -> Value {
    json!({
        "type": "Feature",
        "properties": {
            "rank": rank,
            "name": route.candidate.name,
            "distance_m": route.candidate.distance_m,
            "duration_s": route.candidate.duration_s,
            "leg_steps": route.candidate.leg_steps,
            "annotation": annotation,
            "flood": route.intersection.hit
        },
        "geometry": {
            "type": "LineString",
            "coordinates": route.path.iter().map(|c| [c.lon, c.lat]).collect::<Vec<_>>()
        }
    })
}

fn flooded(config: &Config, args: &FloodedArgs) -> Result<(), Box<dyn Error>> {
    let index = load_readings(config, &args.sensors_file)?;
    for r in index.flooded_above(args.min_level) {
        println!(
            "{}\t{}\t{}\t{}\t{}",
            r.node_id(),
            index.node_name(r.node_id()),
            r.water_level_cm(),
            r.severity(),
            r.severity().passability(),
        );
    }
    Ok(())
}

fn classify(config: &Config, args: &ClassifyArgs) {
    for &level in &args.water_levels {
        let c = config.severity.classify_with_label(level, args.label.as_deref());
        println!("{level}\t{}\t{}", c.severity, c.flood_status);
    }
}

fn load_readings(config: &Config, path: &Path) -> Result<FloodIndex, LoadError<SourceError>> {
    let mut index = config.flood_index();
    let options = SensorOptions::from_config(config, FileFormat::Unknown);
    match source::add_readings_from_file(&mut index, &options, path) {
        Ok(n) => {
            log::info!("loaded {n} sensor readings");
            Ok(index)
        }
        Err(e) => Err(LoadError(PathBuf::from(path), e)),
    }
}

fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, LoadError<ConfigError>> {
    match Config::load(path.as_ref()) {
        Ok(config) => Ok(config),
        Err(e) => Err(LoadError(PathBuf::from(path.as_ref()), e)),
    }
}

fn level_filter(verbose: u8, quiet: u8) -> LevelFilter {
    const LEVELS: [LevelFilter; 6] = [
        LevelFilter::Off,
        LevelFilter::Error,
        LevelFilter::Warn,
        LevelFilter::Info,
        LevelFilter::Debug,
        LevelFilter::Trace,
    ];
    let idx = (2 + i32::from(verbose) - i32::from(quiet)).clamp(0, 5);
    LEVELS[idx as usize]
}
