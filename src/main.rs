//! # Routedrift CLI
//!
//! Command-line interface for the routedrift library.
//! Analyzes a station's addresses for routing instability zones and exports
//! the flagged pairs as GeoJSON for the map client.

use clap::Parser;
use log::error;
use routedrift::core::address;
use routedrift::core::export::{write_geojson, zones_to_geojson};
use routedrift::{analyze, AnalysisOptions, ClassifierConfig, Error, Result, RoutingEngine};

mod cli;

/// Command-line interface for routedrift
#[derive(Parser)]
#[command(name = "routedrift")]
#[command(about = "Routing instability zone detector for station response areas")]
#[command(long_about = "Finds pairs of nearby addresses whose driving routes from the station
diverge dramatically - potential misrouting hazards for dispatch:
  routedrift addresses_station_05.geojson --station 05 --stations-file fire_stations.json
  routedrift addresses.geojson --origin \" -77.0762,39.0301\"
  routedrift addresses.geojson --origin \" -77.0762,39.0301\" --engine osrm --routing-url http://127.0.0.1:5000

The routing engine (GraphHopper or OSRM) must already be running; the run
aborts up front if the engine fails a test route.")]
#[command(version)]
struct Cli {
    /// GeoJSON feature collection of point addresses to analyze
    addresses: String,

    /// Station pattern for origin lookup and output naming (e.g. "05")
    #[arg(long)]
    station: Option<String>,

    /// Origin coordinate as "lng,lat" (overrides --stations-file lookup)
    #[arg(long)]
    origin: Option<String>,

    /// JSON array of station records with station_number/longitude/latitude
    #[arg(long)]
    stations_file: Option<String>,

    /// Polygon GeoJSON restricting analysis to a service area
    #[arg(long)]
    beat_file: Option<String>,

    /// Routing engine base URL
    #[arg(long, default_value = "http://127.0.0.1:8989")]
    routing_url: String,

    /// Routing engine: "graphhopper" or "osrm"
    #[arg(long, default_value = "graphhopper")]
    engine: String,

    /// Bearing difference (degrees) to flag as instability
    #[arg(long, default_value_t = 90.0)]
    bearing_threshold: f64,

    /// Route overlap below this is flagged (0-1)
    #[arg(long, default_value_t = 0.5)]
    overlap_threshold: f64,

    /// Max distance (meters) between addresses to compare
    #[arg(long, default_value_t = 50.0)]
    max_neighbor_distance: f64,

    /// Limit number of addresses to analyze (for testing)
    #[arg(long)]
    limit: Option<usize>,

    /// Concurrent route requests (default: capped by CPU count)
    #[arg(long)]
    concurrency: Option<usize>,

    /// Output file path (default: routing_instabilities_<area>.geojson)
    #[arg(long)]
    output: Option<String>,

    /// Load and filter addresses, report what would be analyzed, skip routing
    #[arg(long)]
    dry_run: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Resolve the output file path from CLI arguments
fn resolve_output(area: &str, output: Option<&str>) -> String {
    match output {
        Some(path) => path.to_string(),
        None => format!("routing_instabilities_{area}.geojson"),
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("❌ Error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging to stderr
    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Stderr)
        .init();

    if cli.verbose {
        eprintln!("🧭 Routedrift v{} starting...", env!("CARGO_PKG_VERSION"));
    }

    let engine: RoutingEngine = cli.engine.parse()?;
    let area = cli
        .station
        .as_deref()
        .map(address::normalize_station_pattern)
        .unwrap_or_else(|| "area".to_string());

    // Load addresses, optionally scoped to the service area polygon
    let mut addresses = address::load_addresses(std::path::Path::new(&cli.addresses))?;
    eprintln!("📍 Loaded {} addresses from {}", addresses.len(), cli.addresses);

    if let Some(beat_file) = &cli.beat_file {
        let ring = address::load_service_area(std::path::Path::new(beat_file))?;
        let before = addresses.len();
        addresses = address::filter_by_service_area(addresses, &ring);
        eprintln!("🗺️  Service area filter kept {}/{before} addresses", addresses.len());
        if addresses.is_empty() {
            return Err(Error::InvalidInput(format!(
                "No addresses inside the service area from {beat_file}"
            )));
        }
    }

    let analyzed_count = cli.limit.map_or(addresses.len(), |l| l.min(addresses.len()));
    if cli.limit.is_some() {
        eprintln!("🔬 Limited to {analyzed_count} addresses for testing");
    }

    // Resolve the station origin
    let origin = resolve_origin(&cli)?;
    eprintln!("🚒 Station origin: {}, {}", origin[0], origin[1]);

    if cli.dry_run {
        eprintln!(
            "🔍 [DRY RUN] Would route {analyzed_count} addresses via {} at {}",
            engine.as_str(),
            cli.routing_url
        );
        return Ok(());
    }

    eprintln!(
        "⚙️  Engine: {} at {} | bearing ≥ {}° | overlap < {} | neighbors ≤ {}m",
        engine.as_str(),
        cli.routing_url,
        cli.bearing_threshold,
        cli.overlap_threshold,
        cli.max_neighbor_distance
    );

    // Progress bar over the per-address routing phase
    let progress_manager = cli::ProgressManager::new(
        analyzed_count as u64,
        &format!("🌐 Routing {analyzed_count} addresses from the station..."),
    );

    let options = AnalysisOptions {
        engine,
        routing_url: cli.routing_url.clone(),
        classifier: ClassifierConfig {
            bearing_threshold: cli.bearing_threshold,
            overlap_threshold: cli.overlap_threshold,
            max_neighbor_distance: cli.max_neighbor_distance,
        },
        limit: cli.limit,
        concurrency: cli.concurrency.unwrap_or_else(routedrift::default_concurrency),
        progress: Some(std::sync::Arc::new({
            let pb = progress_manager.pb.clone();
            move |done, total| {
                pb.set_position(done);
                if done >= total {
                    pb.finish_with_message("✅ Routing complete");
                }
            }
        })),
        ..AnalysisOptions::default()
    };

    let report = analyze(&addresses, origin, &options).await?;

    print_summary(&report);

    let output_path = resolve_output(&area, cli.output.as_deref());
    let collection = zones_to_geojson(&report.zones, &area);
    write_geojson(std::path::Path::new(&output_path), &collection)?;
    eprintln!("\n📁 Results saved to {output_path}");

    Ok(())
}

/// Resolve the origin coordinate from --origin or the stations file
fn resolve_origin(cli: &Cli) -> Result<[f64; 2]> {
    if let Some(origin) = &cli.origin {
        return address::parse_origin(origin);
    }

    match (&cli.stations_file, &cli.station) {
        (Some(file), Some(station)) => {
            let pattern = address::normalize_station_pattern(station);
            address::lookup_station(std::path::Path::new(file), &pattern)
        }
        _ => Err(Error::InvalidInput(
            "No origin: pass --origin \"lng,lat\" or both --stations-file and --station".to_string(),
        )),
    }
}

/// Print run statistics and the top flagged zones
fn print_summary(report: &routedrift::AnalysisReport) {
    let stats = &report.stats;

    eprintln!(
        "\n📊 Routed {}/{} addresses ({} failed)",
        stats.succeeded, stats.attempted, stats.failed
    );
    eprintln!(
        "Found {} routing instability zones: {} critical, {} high, {} medium",
        report.zones.len(),
        stats.critical,
        stats.high,
        stats.medium
    );

    for zone in report.zones.iter().take(15) {
        eprintln!(
            "\n[{}] {:.0}m apart - {}",
            zone.severity.as_str().to_uppercase(),
            zone.distance_apart,
            zone.reason
        );
        for sig in [&zone.address1, &zone.address2] {
            let uturn = if sig.has_uturn { " [HAS U-TURN]" } else { "" };
            eprintln!(
                "  {}: ({:.0}m){} {}",
                sig.address,
                sig.total_distance,
                uturn,
                sig.route_roads
                    .iter()
                    .take(4)
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(" > ")
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_output_default() {
        assert_eq!(
            resolve_output("05", None),
            "routing_instabilities_05.geojson"
        );
    }

    #[test]
    fn test_resolve_output_custom() {
        assert_eq!(
            resolve_output("05", Some("custom.geojson")),
            "custom.geojson"
        );
    }
}
