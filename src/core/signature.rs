//! Route signature extraction
//!
//! Reduces a raw provider route to the normalized summary used for pairwise
//! comparison: initial bearing, ordered road names, geometry, distance,
//! duration and a U-turn flag.

use crate::core::address::Address;
use crate::core::geometry::bearing;
use crate::core::routing::RoutePath;

/// Normalized, comparable summary of one computed route
#[derive(Debug, Clone, PartialEq)]
pub struct RouteSignature {
    pub address_id: String,
    pub address: String,
    /// `[lng, lat]` of the destination address
    pub location: [f64; 2],
    /// Compass heading leaving the origin, degrees [0, 360)
    pub initial_bearing: f64,
    /// Name of the first road traveled
    pub first_road: String,
    /// Ordered road names with consecutive duplicates collapsed
    pub route_roads: Vec<String>,
    /// Ordered `[lng, lat]` route vertices
    pub route_geometry: Vec<[f64; 2]>,
    /// Meters
    pub total_distance: f64,
    /// Seconds
    pub total_duration: f64,
    /// Any instruction mentions a U-turn
    pub has_uturn: bool,
    pub success: bool,
    pub error: Option<String>,
}

impl RouteSignature {
    /// Build a signature from a successful route response
    pub fn from_route(address: &Address, path: RoutePath) -> Self {
        // Degenerate single-vertex geometries keep bearing 0 rather than
        // failing the address
        let initial_bearing = if path.geometry.len() >= 2 {
            bearing(path.geometry[0], path.geometry[1])
        } else {
            0.0
        };

        let mut route_roads: Vec<String> = Vec::new();
        let mut has_uturn = false;

        for step in &path.steps {
            if contains_uturn(&step.instruction) {
                has_uturn = true;
            }

            if !step.road_name.is_empty() && route_roads.last() != Some(&step.road_name) {
                route_roads.push(step.road_name.clone());
            }
        }

        let first_road = route_roads.first().cloned().unwrap_or_default();

        Self {
            address_id: address.id.clone(),
            address: address.label.clone(),
            location: address.location,
            initial_bearing,
            first_road,
            route_roads,
            route_geometry: path.geometry,
            total_distance: path.distance_m,
            total_duration: path.duration_s,
            has_uturn,
            success: true,
            error: None,
        }
    }

    /// Build a failed signature; excluded from pairing, still counted
    pub fn failed(address: &Address, error: String) -> Self {
        Self {
            address_id: address.id.clone(),
            address: address.label.clone(),
            location: address.location,
            initial_bearing: 0.0,
            first_road: String::new(),
            route_roads: Vec::new(),
            route_geometry: Vec::new(),
            total_distance: 0.0,
            total_duration: 0.0,
            has_uturn: false,
            success: false,
            error: Some(error),
        }
    }
}

/// Case-insensitive U-turn indicator check
///
/// GraphHopper spells it "U-turn" in instruction text; OSRM maneuvers use the
/// modifier "uturn". Both spellings count.
pub(crate) fn contains_uturn(instruction: &str) -> bool {
    let lower = instruction.to_lowercase();
    lower.contains("u-turn") || lower.contains("uturn")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::routing::RouteStep;

    fn test_address() -> Address {
        Address {
            id: "a1".to_string(),
            label: "100 Main St".to_string(),
            location: [-77.075, 39.031],
        }
    }

    fn step(road: &str, instruction: &str) -> RouteStep {
        RouteStep {
            road_name: road.to_string(),
            instruction: instruction.to_string(),
        }
    }

    #[test]
    fn test_from_route_collapses_consecutive_roads() {
        let path = RoutePath {
            geometry: vec![[-77.076, 39.030], [-77.076, 39.031]],
            distance_m: 1200.0,
            duration_s: 150.0,
            steps: vec![
                step("Connecticut Avenue", "Continue onto Connecticut Avenue"),
                step("Connecticut Avenue", "Keep left on Connecticut Avenue"),
                step("Plyers Mill Road", "Turn right onto Plyers Mill Road"),
                step("", "Arrive at destination"),
                step("Plyers Mill Road", "Continue"),
            ],
        };

        let sig = RouteSignature::from_route(&test_address(), path);
        assert!(sig.success);
        assert_eq!(sig.first_road, "Connecticut Avenue");
        // Non-consecutive repetition survives; only consecutive duplicates collapse
        assert_eq!(
            sig.route_roads,
            vec!["Connecticut Avenue", "Plyers Mill Road", "Plyers Mill Road"]
        );
        assert!(!sig.has_uturn);
    }

    #[test]
    fn test_from_route_initial_bearing_north() {
        let path = RoutePath {
            geometry: vec![[-77.076, 39.030], [-77.076, 39.031]],
            distance_m: 100.0,
            duration_s: 10.0,
            steps: vec![],
        };
        let sig = RouteSignature::from_route(&test_address(), path);
        assert!(sig.initial_bearing.abs() < 0.01);
    }

    #[test]
    fn test_from_route_degenerate_geometry_bearing_zero() {
        let path = RoutePath {
            geometry: vec![[-77.076, 39.030]],
            distance_m: 0.0,
            duration_s: 0.0,
            steps: vec![],
        };
        let sig = RouteSignature::from_route(&test_address(), path);
        assert_eq!(sig.initial_bearing, 0.0);
        assert!(sig.success);
    }

    #[test]
    fn test_from_route_detects_uturn() {
        let path = RoutePath {
            geometry: vec![[-77.076, 39.030], [-77.077, 39.030]],
            distance_m: 800.0,
            duration_s: 90.0,
            steps: vec![
                step("Connecticut Avenue", "Continue"),
                step("Connecticut Avenue", "Make a U-Turn onto Connecticut Avenue"),
            ],
        };
        let sig = RouteSignature::from_route(&test_address(), path);
        assert!(sig.has_uturn);
    }

    #[test]
    fn test_contains_uturn_both_spellings() {
        assert!(contains_uturn("Make a U-turn onto Main St"));
        assert!(contains_uturn("MAKE A U-TURN"));
        assert!(contains_uturn("turn uturn"));
        assert!(!contains_uturn("Turn right onto Main St"));
        assert!(!contains_uturn(""));
    }

    #[test]
    fn test_failed_signature() {
        let sig = RouteSignature::failed(&test_address(), "Failed to get route".to_string());
        assert!(!sig.success);
        assert_eq!(sig.error.as_deref(), Some("Failed to get route"));
        assert!(sig.route_geometry.is_empty());
        assert!(sig.route_roads.is_empty());
    }
}
