//! Run orchestration
//!
//! Wires the stages together: probe the routing engine, collect one signature
//! per address through a bounded worker pool, build the spatial index, run
//! the classifier and sort the zones. Each route request is independent and
//! idempotent, so requests fan out concurrently; results are re-ordered by
//! address index afterward, keeping the output identical to a sequential run.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;

use crate::core::address::Address;
use crate::core::classifier::{find_instability_zones, ClassifierConfig, InstabilityZone, Severity};
use crate::core::error::{Error, Result};
use crate::core::export::{severity_count, sort_zones};
use crate::core::routing::{RoutingClient, RoutingEngine, DEFAULT_REQUEST_TIMEOUT};
use crate::core::signature::RouteSignature;
use crate::core::spatial::{AddressIndex, PlanarScale};

/// Progress callback: (addresses completed, addresses total)
pub type ProgressCallback = Arc<dyn Fn(u64, u64) + Send + Sync>;

/// Worker pool size: enough to hide request latency without flooding a local
/// routing engine
pub fn default_concurrency() -> usize {
    std::cmp::min(8, num_cpus::get())
}

/// Options for one analysis run
pub struct AnalysisOptions {
    pub engine: RoutingEngine,
    pub routing_url: String,
    pub classifier: ClassifierConfig,
    /// Analyze only the first N addresses (test runs)
    pub limit: Option<usize>,
    /// Concurrent route requests
    pub concurrency: usize,
    pub request_timeout: Duration,
    /// Optional per-address progress callback
    pub progress: Option<ProgressCallback>,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            engine: RoutingEngine::GraphHopper,
            routing_url: "http://127.0.0.1:8989".to_string(),
            classifier: ClassifierConfig::default(),
            limit: None,
            concurrency: default_concurrency(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            progress: None,
        }
    }
}

/// End-of-run accounting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
}

/// Result of one analysis run: sorted zones plus run statistics
pub struct AnalysisReport {
    pub zones: Vec<InstabilityZone>,
    pub stats: RunStats,
}

/// Run the full analysis over the given addresses
///
/// Fatal startup failures (no addresses, unreachable routing engine) abort
/// before any per-address work; individual route failures mark the address
/// failed and the run continues.
pub async fn analyze(
    addresses: &[Address],
    origin: [f64; 2],
    options: &AnalysisOptions,
) -> Result<AnalysisReport> {
    if addresses.is_empty() {
        return Err(Error::InvalidInput("No addresses to analyze".to_string()));
    }

    let addresses = match options.limit {
        Some(limit) => &addresses[..limit.min(addresses.len())],
        None => addresses,
    };

    let client = RoutingClient::new(options.engine, &options.routing_url)
        .with_timeout(options.request_timeout);

    // Fail the whole run up front rather than every address one by one
    client.probe(origin).await?;

    let signatures = collect_signatures(addresses, origin, &client, options).await;

    let mut stats = RunStats {
        attempted: signatures.len(),
        succeeded: signatures.iter().filter(|s| s.success).count(),
        ..RunStats::default()
    };
    stats.failed = stats.attempted - stats.succeeded;

    let locations: Vec<[f64; 2]> = addresses.iter().map(|a| a.location).collect();
    let scale = PlanarScale::at_latitude(origin[1]);
    let index = AddressIndex::build(&locations, scale);

    let mut zones = find_instability_zones(&signatures, &index, &options.classifier);
    sort_zones(&mut zones);

    stats.critical = severity_count(&zones, Severity::Critical);
    stats.high = severity_count(&zones, Severity::High);
    stats.medium = severity_count(&zones, Severity::Medium);

    Ok(AnalysisReport { zones, stats })
}

/// One route request per address through a bounded worker pool
///
/// The only shared mutable state is the completion counter; results carry
/// their address index and are re-sorted so concurrency never changes the
/// output order.
async fn collect_signatures(
    addresses: &[Address],
    origin: [f64; 2],
    client: &RoutingClient,
    options: &AnalysisOptions,
) -> Vec<RouteSignature> {
    let total = addresses.len() as u64;
    let completed = Arc::new(AtomicU64::new(0));

    let mut results: Vec<(usize, RouteSignature)> = futures::stream::iter(
        addresses.iter().enumerate().map(|(idx, address)| {
            let completed = Arc::clone(&completed);
            let progress = options.progress.clone();
            async move {
                let signature = match client.route(origin, address.location).await {
                    Ok(path) => RouteSignature::from_route(address, path),
                    Err(e) => {
                        log::warn!("Route request failed for '{}': {e}", address.label);
                        RouteSignature::failed(address, e.to_string())
                    }
                };

                let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                if let Some(progress) = &progress {
                    progress(done, total);
                }

                (idx, signature)
            }
        }),
    )
    .buffer_unordered(options.concurrency.max(1))
    .collect()
    .await;

    results.sort_by_key(|(idx, _)| *idx);
    results.into_iter().map(|(_, signature)| signature).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_concurrency_bounded() {
        let n = default_concurrency();
        assert!(n >= 1);
        assert!(n <= 8);
    }

    #[test]
    fn test_analyze_empty_addresses_is_startup_error() {
        let options = AnalysisOptions::default();
        let result = tokio_test::block_on(analyze(&[], [-77.0762, 39.0301], &options));
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_analyze_unreachable_engine_is_startup_error() {
        let addresses = vec![Address {
            id: "a1".to_string(),
            label: "100 Main St".to_string(),
            location: [-77.075, 39.031],
        }];
        // Nothing listens on this port; the probe must abort the run
        let options = AnalysisOptions {
            routing_url: "http://127.0.0.1:1".to_string(),
            request_timeout: Duration::from_millis(500),
            ..AnalysisOptions::default()
        };
        let result = tokio_test::block_on(analyze(&addresses, [-77.0762, 39.0301], &options));
        assert!(matches!(result, Err(Error::RoutingUnavailable(_))));
    }
}
