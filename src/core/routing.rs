//! Routing provider adapter
//!
//! Unifies the two supported routing backends (GraphHopper and OSRM) behind a
//! single request/response contract. The backends disagree on request shape
//! and on which key carries the road name ("street_name" vs "name"); both are
//! normalized into [`RoutePath`] before any signature extraction happens.

use std::str::FromStr;
use std::time::Duration;

use once_cell::sync::Lazy;
use reqwest::{Client, ClientBuilder};
use serde_json::Value;

use crate::core::error::{Error, Result};

/// Default per-request timeout for route calls
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Global HTTP client shared across route requests
static GLOBAL_CLIENT: Lazy<Client> = Lazy::new(|| {
    ClientBuilder::new()
        .tcp_keepalive(Duration::from_secs(60))
        .pool_idle_timeout(Duration::from_secs(90))
        .pool_max_idle_per_host(20)
        .connect_timeout(Duration::from_secs(10))
        .user_agent(format!("routedrift/{}", env!("CARGO_PKG_VERSION")))
        .build()
        .expect("Failed to create HTTP client")
});

/// Supported routing backends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingEngine {
    /// GraphHopper: road names under "street_name", instruction under "text"
    GraphHopper,
    /// OSRM: road names under "name", maneuver object instead of text
    Osrm,
}

impl RoutingEngine {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoutingEngine::GraphHopper => "graphhopper",
            RoutingEngine::Osrm => "osrm",
        }
    }
}

impl FromStr for RoutingEngine {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "graphhopper" => Ok(RoutingEngine::GraphHopper),
            "osrm" => Ok(RoutingEngine::Osrm),
            other => Err(Error::InvalidInput(format!(
                "Unknown routing engine '{other}' (expected 'graphhopper' or 'osrm')"
            ))),
        }
    }
}

/// One maneuver step of a computed route
#[derive(Debug, Clone, PartialEq)]
pub struct RouteStep {
    /// Road name for this step; empty when the backend omits it
    pub road_name: String,
    /// Human-readable instruction text
    pub instruction: String,
}

/// A computed route in the unified provider contract
#[derive(Debug, Clone, PartialEq)]
pub struct RoutePath {
    /// Ordered `[lng, lat]` vertices
    pub geometry: Vec<[f64; 2]>,
    /// Total driving distance in meters
    pub distance_m: f64,
    /// Total driving duration in seconds
    pub duration_s: f64,
    /// Ordered maneuver steps
    pub steps: Vec<RouteStep>,
}

/// Client for one routing backend instance
pub struct RoutingClient {
    engine: RoutingEngine,
    base_url: String,
    timeout: Duration,
}

impl RoutingClient {
    /// Create a client for the given backend and base URL
    pub fn new(engine: RoutingEngine, base_url: &str) -> Self {
        Self {
            engine,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Override the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn engine(&self) -> RoutingEngine {
        self.engine
    }

    /// Request one route from `origin` to `dest` (both `[lng, lat]`)
    pub async fn route(&self, origin: [f64; 2], dest: [f64; 2]) -> Result<RoutePath> {
        match self.engine {
            RoutingEngine::GraphHopper => self.route_graphhopper(origin, dest).await,
            RoutingEngine::Osrm => self.route_osrm(origin, dest).await,
        }
    }

    /// Upfront connectivity probe: one short route next to the origin
    ///
    /// A failed probe means the whole run should abort instead of failing
    /// every address one by one.
    pub async fn probe(&self, origin: [f64; 2]) -> Result<()> {
        let nearby = [origin[0] + 0.001, origin[1] + 0.001];
        self.route(origin, nearby).await.map_err(|e| {
            Error::RoutingUnavailable(format!(
                "{} at {} failed the test route: {e}",
                self.engine.as_str(),
                self.base_url
            ))
        })?;
        Ok(())
    }

    async fn route_graphhopper(&self, origin: [f64; 2], dest: [f64; 2]) -> Result<RoutePath> {
        let url = format!("{}/route", self.base_url);

        // GraphHopper expects lat,lng point pairs
        let response = GLOBAL_CLIENT
            .get(&url)
            .query(&[
                ("point", format!("{},{}", origin[1], origin[0])),
                ("point", format!("{},{}", dest[1], dest[0])),
                ("profile", "car".to_string()),
                ("points_encoded", "false".to_string()),
                ("instructions", "true".to_string()),
            ])
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(Error::HttpError(format!("Route request failed: {status}")));
        }

        let payload: Value = response.json().await?;
        parse_graphhopper(&payload)
    }

    async fn route_osrm(&self, origin: [f64; 2], dest: [f64; 2]) -> Result<RoutePath> {
        let url = format!(
            "{}/route/v1/driving/{},{};{},{}",
            self.base_url, origin[0], origin[1], dest[0], dest[1]
        );

        let response = GLOBAL_CLIENT
            .get(&url)
            .query(&[
                ("overview", "full"),
                ("geometries", "geojson"),
                ("steps", "true"),
            ])
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(Error::HttpError(format!("Route request failed: {status}")));
        }

        let payload: Value = response.json().await?;
        parse_osrm(&payload)
    }
}

/// Parse a GraphHopper /route payload into the unified contract
fn parse_graphhopper(payload: &Value) -> Result<RoutePath> {
    let path = payload["paths"]
        .as_array()
        .and_then(|paths| paths.first())
        .ok_or_else(|| Error::ParseError("GraphHopper response has no paths".to_string()))?;

    let geometry = parse_coordinates(&path["points"]["coordinates"]);
    let distance_m = path["distance"].as_f64().unwrap_or(0.0);
    // GraphHopper reports milliseconds
    let duration_s = path["time"].as_f64().unwrap_or(0.0) / 1000.0;

    let steps = path["instructions"]
        .as_array()
        .map(|instructions| {
            instructions
                .iter()
                .map(|step| RouteStep {
                    road_name: step["street_name"].as_str().unwrap_or("").to_string(),
                    instruction: step["text"].as_str().unwrap_or("").to_string(),
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(RoutePath {
        geometry,
        distance_m,
        duration_s,
        steps,
    })
}

/// Parse an OSRM /route/v1 payload into the unified contract
fn parse_osrm(payload: &Value) -> Result<RoutePath> {
    let code = payload["code"].as_str().unwrap_or("");
    if code != "Ok" {
        return Err(Error::HttpError(format!(
            "OSRM returned code '{code}'"
        )));
    }

    let route = payload["routes"]
        .as_array()
        .and_then(|routes| routes.first())
        .ok_or_else(|| Error::ParseError("OSRM response has no routes".to_string()))?;

    let geometry = parse_coordinates(&route["geometry"]["coordinates"]);
    let distance_m = route["distance"].as_f64().unwrap_or(0.0);
    let duration_s = route["duration"].as_f64().unwrap_or(0.0);

    let steps = route["legs"]
        .as_array()
        .and_then(|legs| legs.first())
        .and_then(|leg| leg["steps"].as_array())
        .map(|steps| {
            steps
                .iter()
                .map(|step| {
                    // OSRM carries no instruction text; synthesize one from the
                    // maneuver so U-turn detection sees the same vocabulary
                    let maneuver_type = step["maneuver"]["type"].as_str().unwrap_or("");
                    let modifier = step["maneuver"]["modifier"].as_str().unwrap_or("");
                    RouteStep {
                        road_name: step["name"].as_str().unwrap_or("").to_string(),
                        instruction: format!("{maneuver_type} {modifier}").trim().to_string(),
                    }
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(RoutePath {
        geometry,
        distance_m,
        duration_s,
        steps,
    })
}

/// Extract `[lng, lat]` vertices, tolerating trailing elevation values
fn parse_coordinates(value: &Value) -> Vec<[f64; 2]> {
    value
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
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_engine_from_str() {
        assert_eq!("graphhopper".parse::<RoutingEngine>().unwrap(), RoutingEngine::GraphHopper);
        assert_eq!("OSRM".parse::<RoutingEngine>().unwrap(), RoutingEngine::Osrm);
        assert!("valhalla".parse::<RoutingEngine>().is_err());
    }

    #[test]
    fn test_parse_graphhopper_payload() {
        let payload = json!({
            "paths": [{
                "points": {"coordinates": [[-77.076, 39.030], [-77.075, 39.031, 112.0]]},
                "distance": 1520.5,
                "time": 183000,
                "instructions": [
                    {"text": "Continue onto Connecticut Avenue", "street_name": "Connecticut Avenue"},
                    {"text": "Make a U-turn onto Plyers Mill Road", "street_name": "Plyers Mill Road"},
                    {"text": "Arrive at destination", "street_name": ""}
                ]
            }]
        });

        let path = parse_graphhopper(&payload).unwrap();
        assert_eq!(path.geometry.len(), 2);
        assert_eq!(path.geometry[1], [-77.075, 39.031]); // elevation dropped
        assert_eq!(path.distance_m, 1520.5);
        assert_eq!(path.duration_s, 183.0); // ms converted to seconds
        assert_eq!(path.steps.len(), 3);
        assert_eq!(path.steps[0].road_name, "Connecticut Avenue");
        assert!(path.steps[1].instruction.contains("U-turn"));
    }

    #[test]
    fn test_parse_graphhopper_no_paths() {
        let payload = json!({"paths": []});
        assert!(matches!(parse_graphhopper(&payload), Err(Error::ParseError(_))));

        let payload = json!({"message": "Point out of bounds"});
        assert!(parse_graphhopper(&payload).is_err());
    }

    #[test]
    fn test_parse_osrm_payload() {
        let payload = json!({
            "code": "Ok",
            "routes": [{
                "geometry": {"coordinates": [[-77.076, 39.030], [-77.077, 39.029]]},
                "distance": 980.0,
                "duration": 140.0,
                "legs": [{
                    "steps": [
                        {"name": "Connecticut Avenue", "maneuver": {"type": "depart", "modifier": ""}},
                        {"name": "Saul Road", "maneuver": {"type": "turn", "modifier": "uturn"}},
                        {"name": "", "maneuver": {"type": "arrive", "modifier": ""}}
                    ]
                }]
            }]
        });

        let path = parse_osrm(&payload).unwrap();
        assert_eq!(path.geometry.len(), 2);
        assert_eq!(path.distance_m, 980.0);
        assert_eq!(path.duration_s, 140.0);
        assert_eq!(path.steps[0].road_name, "Connecticut Avenue");
        assert_eq!(path.steps[1].instruction, "turn uturn");
    }

    #[test]
    fn test_parse_osrm_error_code() {
        let payload = json!({"code": "NoRoute", "routes": []});
        assert!(matches!(parse_osrm(&payload), Err(Error::HttpError(_))));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = RoutingClient::new(RoutingEngine::GraphHopper, "http://127.0.0.1:8989/");
        assert_eq!(client.base_url, "http://127.0.0.1:8989");
    }
}
