//! Coordinator service binary
//!
//! Runs one collection over an in-process cluster and prints the report.

use std::sync::Arc;
use std::time::Duration;

use clusterstats_core::coordinator::{ClusterStatsRequest, CoordinatorConfig, StatsCoordinator};
use clusterstats_core::member::{LocalCluster, StatsRecorder};
use clusterstats_core::runtime::{RuntimeConfig, StatsRuntime};
use clusterstats_core::{HealthStatus, MemberId};
use tracing::{error, info};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    info!("Starting ClusterStats Coordinator");

    // Load configuration from environment
    let cluster_name = std::env::var("CLUSTER_NAME").unwrap_or_else(|_| "clusterstats".into());
    let member_timeout = std::env::var("MEMBER_TIMEOUT_MS")
        .ok()
        .and_then(|v| v.parse().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(clusterstats_core::DEFAULT_MEMBER_TIMEOUT_SECS));
    let member_count: usize = std::env::var("MEMBER_COUNT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3);

    let cluster = Arc::new(LocalCluster::new());
    for i in 0..member_count {
        let recorder = Arc::new(StatsRecorder::new());
        recorder.inc("invocations.total", (i + 1) as i64)?;
        let status = if i % 2 == 0 { HealthStatus::Green } else { HealthStatus::Yellow };
        recorder.record_status(status);
        if status == HealthStatus::Yellow {
            recorder.record_indicator(status, "shards_availability");
        }
        cluster.add_member(format!("node-{}", i), recorder);
    }

    // Show failure isolation: the last member stays listed but unreachable
    if member_count > 1 {
        cluster.detach(&MemberId::new(format!("node-{}", member_count - 1)));
    }

    let config = CoordinatorConfig {
        cluster_name,
        member_timeout,
    };
    let coordinator = StatsCoordinator::new(config, cluster.clone(), cluster);
    let runtime = StatsRuntime::new(RuntimeConfig::default())?;
    info!(
        "Collecting stats for cluster {} on {} worker threads",
        coordinator.config().cluster_name,
        runtime.config().worker_threads
    );

    match runtime.collect_cluster_stats(&coordinator, &ClusterStatsRequest::all()) {
        Ok(aggregate) => {
            println!("{}", aggregate.to_json_pretty()?);
            print!("{}", clusterstats_core::metrics::gather_system_metrics());
        }
        Err(e) => {
            error!("Collection failed: {}", e);
            return Err(e.into());
        }
    }

    runtime.shutdown(Duration::from_secs(5));
    Ok(())
}
