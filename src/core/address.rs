//! Address input handling
//!
//! Loads point addresses from a GeoJSON feature collection, optionally scopes
//! them to a service-area polygon, and resolves the station origin coordinate
//! from explicit configuration or a stations lookup file.

use std::path::Path;

use serde_json::Value;

use crate::core::error::{Error, Result};
use crate::core::geometry::point_in_polygon;

/// A point address under analysis, sourced externally and never mutated
#[derive(Debug, Clone, PartialEq)]
pub struct Address {
    /// Stable identifier from the source data (feature index when absent)
    pub id: String,
    /// Display text, e.g. "10620 Connecticut Ave, Kensington"
    pub label: String,
    /// `[lng, lat]` in degrees
    pub location: [f64; 2],
}

/// Load point addresses from a GeoJSON feature collection file
///
/// Features without valid point geometry are skipped and logged; they do not
/// fail the run. An unreadable file or a collection with no usable addresses
/// is a startup error.
pub fn load_addresses(path: &Path) -> Result<Vec<Address>> {
    let raw = std::fs::read_to_string(path)?;
    let data: Value = serde_json::from_str(&raw)
        .map_err(|e| Error::InvalidInput(format!("{}: {e}", path.display())))?;

    let features = data["features"]
        .as_array()
        .ok_or_else(|| Error::InvalidInput(format!("{}: not a GeoJSON feature collection", path.display())))?;

    let mut addresses = Vec::with_capacity(features.len());

    for (i, feature) in features.iter().enumerate() {
        match parse_address_feature(feature, i) {
            Some(address) => addresses.push(address),
            None => {
                log::warn!("Skipping feature {i}: missing or non-point geometry");
            }
        }
    }

    if addresses.is_empty() {
        return Err(Error::InvalidInput(format!(
            "{}: no addresses with point geometry",
            path.display()
        )));
    }

    Ok(addresses)
}

/// Parse one GeoJSON feature into an address, or None if unusable
fn parse_address_feature(feature: &Value, index: usize) -> Option<Address> {
    let geometry = feature.get("geometry")?;
    if geometry["type"].as_str()? != "Point" {
        return None;
    }

    let coords = geometry["coordinates"].as_array()?;
    if coords.len() < 2 {
        return None;
    }
    let lng = coords[0].as_f64()?;
    let lat = coords[1].as_f64()?;

    let props = feature.get("properties").cloned().unwrap_or(Value::Null);

    // Source data varies in which property carries the street address
    let street = props["address"]
        .as_str()
        .or_else(|| props["FULL_ADDRESS"].as_str())
        .or_else(|| props["full_address"].as_str())
        .map(|s| s.to_string())
        .unwrap_or_else(|| format!("Address {index}"));

    let label = match props["city"].as_str() {
        Some(city) if !city.is_empty() => format!("{street}, {city}"),
        _ => street,
    };

    let id = props["id"]
        .as_str()
        .map(|s| s.to_string())
        .or_else(|| props["id"].as_u64().map(|n| n.to_string()))
        .unwrap_or_else(|| index.to_string());

    Some(Address {
        id,
        label,
        location: [lng, lat],
    })
}

/// Load the outer ring of the first polygon feature in a GeoJSON file
///
/// Used to scope addresses to a station's service area when the input
/// collection has not already been filtered.
pub fn load_service_area(path: &Path) -> Result<Vec<[f64; 2]>> {
    let raw = std::fs::read_to_string(path)?;
    let data: Value = serde_json::from_str(&raw)
        .map_err(|e| Error::InvalidInput(format!("{}: {e}", path.display())))?;

    // Accept either a FeatureCollection or a single Feature
    let feature = data["features"]
        .as_array()
        .and_then(|fs| fs.first())
        .unwrap_or(&data);

    let geometry = &feature["geometry"];
    let ring_value = match geometry["type"].as_str() {
        Some("Polygon") => &geometry["coordinates"][0],
        Some("MultiPolygon") => &geometry["coordinates"][0][0],
        _ => {
            return Err(Error::InvalidInput(format!(
                "{}: no polygon geometry found",
                path.display()
            )))
        }
    };

    let ring: Vec<[f64; 2]> = ring_value
        .as_array()
        .map(|coords| {
            coords
                .iter()
                .filter_map(|c| {
                    let c = c.as_array()?;
                    Some([c.first()?.as_f64()?, c.get(1)?.as_f64()?])
                })
                .collect()
        })
        .unwrap_or_default();

    if ring.len() < 3 {
        return Err(Error::InvalidInput(format!(
            "{}: polygon ring has fewer than 3 vertices",
            path.display()
        )));
    }

    Ok(ring)
}

/// Keep only addresses inside the service-area ring
pub fn filter_by_service_area(addresses: Vec<Address>, ring: &[[f64; 2]]) -> Vec<Address> {
    addresses
        .into_iter()
        .filter(|a| point_in_polygon(a.location, ring))
        .collect()
}

/// Zero-pad a numeric station pattern to two digits ("5" -> "05")
pub fn normalize_station_pattern(pattern: &str) -> String {
    if pattern.len() == 1 && pattern.chars().all(|c| c.is_ascii_digit()) {
        format!("0{pattern}")
    } else {
        pattern.to_string()
    }
}

/// Resolve the station origin coordinate from a stations lookup file
///
/// The file is a JSON array of station records carrying `station_number`,
/// `longitude` and `latitude`. Matching is by zero-padded station number.
pub fn lookup_station(path: &Path, pattern: &str) -> Result<[f64; 2]> {
    let raw = std::fs::read_to_string(path)?;
    let stations: Value = serde_json::from_str(&raw)
        .map_err(|e| Error::InvalidInput(format!("{}: {e}", path.display())))?;

    let stations = stations
        .as_array()
        .ok_or_else(|| Error::InvalidInput(format!("{}: expected a JSON array of stations", path.display())))?;

    for station in stations {
        let number = station["station_number"].as_str().unwrap_or("");
        if normalize_station_pattern(number) == pattern {
            let lng = station["longitude"].as_f64();
            let lat = station["latitude"].as_f64();
            if let (Some(lng), Some(lat)) = (lng, lat) {
                return Ok([lng, lat]);
            }
        }
    }

    Err(Error::InvalidInput(format!(
        "Station '{pattern}' not found in {}",
        path.display()
    )))
}

/// Parse an explicit "lng,lat" origin argument
pub fn parse_origin(value: &str) -> Result<[f64; 2]> {
    let parts: Vec<&str> = value.split(',').map(|p| p.trim()).collect();
    if parts.len() != 2 {
        return Err(Error::InvalidInput(format!(
            "Origin must be 'lng,lat', got '{value}'"
        )));
    }

    let lng = parts[0]
        .parse::<f64>()
        .map_err(|_| Error::InvalidInput(format!("Invalid origin longitude '{}'", parts[0])))?;
    let lat = parts[1]
        .parse::<f64>()
        .map_err(|_| Error::InvalidInput(format!("Invalid origin latitude '{}'", parts[1])))?;

    if !(-180.0..=180.0).contains(&lng) || !(-90.0..=90.0).contains(&lat) {
        return Err(Error::InvalidInput(format!(
            "Origin '{value}' is outside valid coordinate ranges"
        )));
    }

    Ok([lng, lat])
}
