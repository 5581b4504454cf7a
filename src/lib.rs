//! # routedrift
//!
//! Offline detector for routing instability zones: clusters of nearby
//! addresses whose driving routes from a common station diverge dramatically
//! despite physical proximity. Dispatch trainers use the flagged pairs to
//! find locations where automated turn-by-turn routing is unreliable.
//!
//! The pipeline is one-way: addresses and a station origin go in, one route
//! request per address produces a normalized [`RouteSignature`], a spatial
//! index pairs up neighbors, a rule cascade classifies each pair, and flagged
//! zones come out as a GeoJSON feature collection.
//!
//! ## Quick Start
//!
//! ```no_run
//! use routedrift::{analyze, AnalysisOptions};
//! use routedrift::core::address::load_addresses;
//! use routedrift::core::export::{write_geojson, zones_to_geojson};
//!
//! # async fn example() -> routedrift::Result<()> {
//! let addresses = load_addresses(std::path::Path::new("addresses_station_05.geojson"))?;
//! let origin = [-77.07621749, 39.03006067];
//!
//! let report = analyze(&addresses, origin, &AnalysisOptions::default()).await?;
//! println!("{} zones, {} critical", report.zones.len(), report.stats.critical);
//!
//! let collection = zones_to_geojson(&report.zones, "05");
//! write_geojson(std::path::Path::new("routing_instabilities_05.geojson"), &collection)?;
//! # Ok(())
//! # }
//! ```
//!
//! The routing backend (GraphHopper or OSRM) is an external collaborator; it
//! must be running and reachable before a run starts.

pub mod core;

// Re-export the public API surface
pub use crate::core::address::Address;
pub use crate::core::classifier::{ClassifierConfig, InstabilityZone, Severity};
pub use crate::core::error::{Error, Result};
pub use crate::core::pipeline::{
    analyze, default_concurrency, AnalysisOptions, AnalysisReport, ProgressCallback, RunStats,
};
pub use crate::core::routing::{RoutingClient, RoutingEngine};
pub use crate::core::signature::RouteSignature;
