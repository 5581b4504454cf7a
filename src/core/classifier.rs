//! Instability classification
//!
//! Compares route signatures of spatially-neighboring addresses and flags
//! pairs whose routes diverge enough to mislead dispatch. The rule cascade is
//! first-match-wins and order-sensitive: later rules are only reachable when
//! earlier ones fail, so the order must not be rearranged.

use std::collections::HashSet;

use crate::core::geometry::{bearing_difference, haversine_distance};
use crate::core::signature::RouteSignature;
use crate::core::spatial::AddressIndex;

/// Vertex proximity threshold for the route overlap metric, in meters
const OVERLAP_PROXIMITY_M: f64 = 50.0;

/// Severity of a flagged pair, ordered for sorting (critical first)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Critical,
    High,
    Medium,
}

impl Severity {
    /// External vocabulary; map consumers filter and style by these strings
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
        }
    }
}

/// Thresholds for the classification cascade
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifierConfig {
    /// Bearing difference (degrees) that flags a pair outright
    pub bearing_threshold: f64,
    /// Route overlap below this is flagged when paired with a slight bearing
    /// difference
    pub overlap_threshold: f64,
    /// Max distance (meters) between addresses to compare
    pub max_neighbor_distance: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            bearing_threshold: 90.0,
            overlap_threshold: 0.5,
            max_neighbor_distance: 50.0,
        }
    }
}

/// A pair of nearby addresses with dramatically different routes
#[derive(Debug, Clone)]
pub struct InstabilityZone {
    pub address1: RouteSignature,
    pub address2: RouteSignature,
    /// Meters between the two addresses
    pub distance_apart: f64,
    /// Degrees, [0, 180]
    pub bearing_difference: f64,
    /// Fraction of the first route's vertices near the second route, 0-1
    pub route_overlap: f64,
    /// Longer route over shorter, >= 1
    pub route_distance_ratio: f64,
    pub severity: Severity,
    pub reason: String,
}

/// Fraction of `route_a` vertices within `threshold_m` of some `route_b` vertex
///
/// Asymmetric: overlap(A, B) need not equal overlap(B, A). Every vertex of A
/// is checked against every vertex of B; fine at hundreds of vertices per
/// route.
pub fn route_overlap(route_a: &[[f64; 2]], route_b: &[[f64; 2]], threshold_m: f64) -> f64 {
    if route_a.is_empty() || route_b.is_empty() {
        return 0.0;
    }

    let matches = route_a
        .iter()
        .filter(|p1| {
            route_b
                .iter()
                .any(|p2| haversine_distance(**p1, *p2) <= threshold_m)
        })
        .count();

    matches as f64 / route_a.len() as f64
}

/// First three road names differ as ordered prefixes
fn roads_differ(a: &[String], b: &[String]) -> bool {
    !a.iter().take(3).eq(b.iter().take(3))
}

/// Evaluate one pair of successful signatures against the cascade
///
/// `sig1` is the designated direction for the overlap metric. Returns None
/// when no rule matches.
pub fn classify_pair(
    sig1: &RouteSignature,
    sig2: &RouteSignature,
    config: &ClassifierConfig,
) -> Option<InstabilityZone> {
    let distance_apart = haversine_distance(sig1.location, sig2.location);
    let bearing_diff = bearing_difference(sig1.initial_bearing, sig2.initial_bearing);
    let overlap = route_overlap(&sig1.route_geometry, &sig2.route_geometry, OVERLAP_PROXIMITY_M);

    let longer = sig1.total_distance.max(sig2.total_distance);
    let shorter = sig1.total_distance.min(sig2.total_distance);
    // Floor the divisor so zero-length routes cannot blow up the ratio
    let distance_ratio = longer / shorter.max(1.0);

    let roads_differ = roads_differ(&sig1.route_roads, &sig2.route_roads);
    let uturn_mismatch = sig1.has_uturn != sig2.has_uturn;

    let (severity, reason) = if bearing_diff >= config.bearing_threshold {
        // Routes leave the station in opposing directions, the dangerous case
        let severity = if bearing_diff >= 150.0 {
            Severity::Critical
        } else {
            Severity::High
        };
        (severity, format!("Opposite initial direction ({bearing_diff:.0}° diff)"))
    } else if uturn_mismatch {
        let severity = if distance_ratio > 1.3 {
            Severity::Critical
        } else {
            Severity::High
        };
        (
            severity,
            format!("U-turn route mismatch (one has U-turn, {distance_ratio:.1}x longer)"),
        )
    } else if roads_differ && distance_ratio > 1.2 {
        let severity = if distance_ratio > 1.4 {
            Severity::High
        } else {
            Severity::Medium
        };
        (severity, format!("Different roads ({distance_ratio:.1}x distance diff)"))
    } else if bearing_diff >= 45.0 && overlap < 0.4 {
        (Severity::High, format!("Bearing diff {bearing_diff:.0}° + low overlap"))
    } else if bearing_diff >= 30.0 && overlap < config.overlap_threshold {
        (Severity::Medium, format!("Bearing diff {bearing_diff:.0}° + low overlap"))
    } else {
        return None;
    };

    Some(InstabilityZone {
        address1: sig1.clone(),
        address2: sig2.clone(),
        distance_apart,
        bearing_difference: bearing_diff,
        route_overlap: overlap,
        route_distance_ratio: distance_ratio,
        severity,
        reason,
    })
}

/// Find all instability zones among spatially-neighboring signatures
///
/// Every unordered pair of distinct, successfully-routed neighbors is
/// evaluated exactly once; failed signatures never participate. Neighbor
/// lists are index-sorted, so identical inputs always produce the identical
/// zone list.
pub fn find_instability_zones(
    signatures: &[RouteSignature],
    index: &AddressIndex,
    config: &ClassifierConfig,
) -> Vec<InstabilityZone> {
    let mut zones = Vec::new();
    let mut checked_pairs: HashSet<(usize, usize)> = HashSet::new();

    for (i, sig1) in signatures.iter().enumerate() {
        if !sig1.success {
            continue;
        }

        for j in index.neighbors_within(i, config.max_neighbor_distance) {
            if i >= j {
                continue;
            }

            if !checked_pairs.insert((i, j)) {
                continue;
            }

            let sig2 = &signatures[j];
            if !sig2.success {
                continue;
            }

            if let Some(zone) = classify_pair(sig1, sig2, config) {
                zones.push(zone);
            }
        }
    }

    zones
}
