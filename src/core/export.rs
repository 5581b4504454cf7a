//! GeoJSON export of classified zones
//!
//! Produces the feature collection consumed by the map client: one connecting
//! line per zone plus a tagged point per address. Property names and the
//! severity vocabulary are an external contract; renaming them breaks
//! downstream filtering and styling.

use std::path::Path;

use serde_json::{json, Value};

use crate::core::classifier::{InstabilityZone, Severity};
use crate::core::error::Result;
use crate::core::signature::RouteSignature;

/// Sort zones by severity rank (critical first), then by descending bearing
/// difference within a tier
pub fn sort_zones(zones: &mut [InstabilityZone]) {
    zones.sort_by(|a, b| {
        a.severity
            .cmp(&b.severity)
            .then_with(|| {
                b.bearing_difference
                    .partial_cmp(&a.bearing_difference)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
    });
}

/// Count zones with the given severity
pub fn severity_count(zones: &[InstabilityZone], severity: Severity) -> usize {
    zones.iter().filter(|z| z.severity == severity).count()
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Point feature for one address of a flagged pair
fn address_feature(zone: &InstabilityZone, sig: &RouteSignature, zone_id: usize, pair_index: usize) -> Value {
    json!({
        "type": "Feature",
        "geometry": {
            "type": "Point",
            "coordinates": sig.location
        },
        "properties": {
            "type": "instability_address",
            "zone_id": zone_id,
            "severity": zone.severity.as_str(),
            "reason": zone.reason,
            "address": sig.address,
            "initial_bearing": round1(sig.initial_bearing),
            "first_road": sig.first_road,
            "route_roads": sig.route_roads.iter().take(5).collect::<Vec<_>>(),
            "route_distance": sig.total_distance,
            "has_uturn": sig.has_uturn,
            "pair_index": pair_index
        }
    })
}

/// Build the exported feature collection
///
/// Collection-level properties carry the area identifier and per-severity
/// counts; each zone contributes one LineString and two Points.
pub fn zones_to_geojson(zones: &[InstabilityZone], station_pattern: &str) -> Value {
    let mut features = Vec::with_capacity(zones.len() * 3);

    for (idx, zone) in zones.iter().enumerate() {
        features.push(json!({
            "type": "Feature",
            "geometry": {
                "type": "LineString",
                "coordinates": [zone.address1.location, zone.address2.location]
            },
            "properties": {
                "type": "instability_zone",
                "id": idx,
                "severity": zone.severity.as_str(),
                "address1": zone.address1.address,
                "address2": zone.address2.address,
                "distance_apart_m": round1(zone.distance_apart),
                "bearing_difference": round1(zone.bearing_difference),
                "route_overlap": round2(zone.route_overlap),
                "initial_bearing_1": round1(zone.address1.initial_bearing),
                "initial_bearing_2": round1(zone.address2.initial_bearing),
                "first_road_1": zone.address1.first_road,
                "first_road_2": zone.address2.first_road,
                "route_roads_1": zone.address1.route_roads.iter().take(5).collect::<Vec<_>>(),
                "route_roads_2": zone.address2.route_roads.iter().take(5).collect::<Vec<_>>(),
                "route_distance_1": zone.address1.total_distance,
                "route_distance_2": zone.address2.total_distance,
                "route_distance_ratio": round2(zone.route_distance_ratio),
                "has_uturn_1": zone.address1.has_uturn,
                "has_uturn_2": zone.address2.has_uturn,
                "reason": zone.reason
            }
        }));

        features.push(address_feature(zone, &zone.address1, idx, 1));
        features.push(address_feature(zone, &zone.address2, idx, 2));
    }

    json!({
        "type": "FeatureCollection",
        "properties": {
            "station_pattern": station_pattern,
            "total_instabilities": zones.len(),
            "critical_count": severity_count(zones, Severity::Critical),
            "high_count": severity_count(zones, Severity::High),
            "medium_count": severity_count(zones, Severity::Medium)
        },
        "features": features
    })
}

/// Serialize the collection to a file, pretty-printed
pub fn write_geojson(path: &Path, collection: &Value) -> Result<()> {
    let rendered = serde_json::to_string_pretty(collection)?;
    std::fs::write(path, rendered)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::classifier::Severity;

    fn make_sig(id: &str, bearing: f64) -> RouteSignature {
        RouteSignature {
            address_id: id.to_string(),
            address: format!("{id} Test St"),
            location: [-77.0760, 39.0300],
            initial_bearing: bearing,
            first_road: "Main St".to_string(),
            route_roads: (0..7).map(|i| format!("Road {i}")).collect(),
            route_geometry: vec![[-77.0760, 39.0300]],
            total_distance: 1000.0,
            total_duration: 120.0,
            has_uturn: false,
            success: true,
            error: None,
        }
    }

    fn make_zone(severity: Severity, bearing_difference: f64) -> InstabilityZone {
        InstabilityZone {
            address1: make_sig("a", 10.0),
            address2: make_sig("b", 10.0 + bearing_difference),
            distance_apart: 31.4159,
            bearing_difference,
            route_overlap: 0.666,
            route_distance_ratio: 1.2345,
            severity,
            reason: "test".to_string(),
        }
    }

    #[test]
    fn test_sort_zones_by_severity_then_bearing() {
        let mut zones = vec![
            make_zone(Severity::Medium, 40.0),
            make_zone(Severity::Critical, 155.0),
            make_zone(Severity::High, 95.0),
            make_zone(Severity::Critical, 170.0),
            make_zone(Severity::High, 120.0),
        ];
        sort_zones(&mut zones);

        let order: Vec<(Severity, f64)> =
            zones.iter().map(|z| (z.severity, z.bearing_difference)).collect();
        assert_eq!(
            order,
            vec![
                (Severity::Critical, 170.0),
                (Severity::Critical, 155.0),
                (Severity::High, 120.0),
                (Severity::High, 95.0),
                (Severity::Medium, 40.0),
            ]
        );

        // No unsorted adjacent pair
        for pair in zones.windows(2) {
            let ordered = pair[0].severity < pair[1].severity
                || (pair[0].severity == pair[1].severity
                    && pair[0].bearing_difference >= pair[1].bearing_difference);
            assert!(ordered);
        }
    }

    #[test]
    fn test_geojson_collection_counts() {
        let zones = vec![
            make_zone(Severity::Critical, 160.0),
            make_zone(Severity::High, 100.0),
            make_zone(Severity::High, 95.0),
            make_zone(Severity::Medium, 35.0),
        ];
        let collection = zones_to_geojson(&zones, "05");

        assert_eq!(collection["type"], "FeatureCollection");
        let props = &collection["properties"];
        assert_eq!(props["station_pattern"], "05");
        assert_eq!(props["total_instabilities"], 4);
        assert_eq!(props["critical_count"], 1);
        assert_eq!(props["high_count"], 2);
        assert_eq!(props["medium_count"], 1);

        // One line plus two points per zone
        assert_eq!(collection["features"].as_array().unwrap().len(), 12);
    }

    #[test]
    fn test_geojson_zone_feature_fields() {
        let zones = vec![make_zone(Severity::Critical, 160.0)];
        let collection = zones_to_geojson(&zones, "05");
        let features = collection["features"].as_array().unwrap();

        let line = &features[0];
        assert_eq!(line["geometry"]["type"], "LineString");
        let props = &line["properties"];
        assert_eq!(props["type"], "instability_zone");
        assert_eq!(props["id"], 0);
        assert_eq!(props["severity"], "critical");
        assert_eq!(props["distance_apart_m"], 31.4);
        assert_eq!(props["route_overlap"], 0.67);
        assert_eq!(props["route_distance_ratio"], 1.23);
        // Road list truncated to the first five entries
        assert_eq!(props["route_roads_1"].as_array().unwrap().len(), 5);

        let point = &features[1];
        assert_eq!(point["geometry"]["type"], "Point");
        let props = &point["properties"];
        assert_eq!(props["type"], "instability_address");
        assert_eq!(props["zone_id"], 0);
        assert_eq!(props["pair_index"], 1);
        assert_eq!(props["first_road"], "Main St");

        assert_eq!(features[2]["properties"]["pair_index"], 2);
    }

    #[test]
    fn test_geojson_empty_run() {
        let collection = zones_to_geojson(&[], "11");
        assert_eq!(collection["properties"]["total_instabilities"], 0);
        assert_eq!(collection["features"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn test_write_geojson_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zones.geojson");

        let zones = vec![make_zone(Severity::High, 100.0)];
        let collection = zones_to_geojson(&zones, "05");
        write_geojson(&path, &collection).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let parsed: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed["properties"]["high_count"], 1);
    }
}
