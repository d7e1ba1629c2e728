//! Tokio runtime for blocking callers
//!
//! Collection is asynchronous internally. Callers outside an async context
//! go through [`StatsRuntime`], which owns a multi-thread runtime and blocks
//! on the whole operation.

use std::time::Duration;

use tokio::runtime::{Builder, Runtime};

use crate::coordinator::{ClusterStatsRequest, StatsCoordinator};
use crate::error::{Result, StatsError};
use crate::stats::AggregateResult;

/// Configuration for the stats runtime
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Number of worker threads running member calls
    pub worker_threads: usize,
    /// Thread name prefix
    pub thread_name: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            worker_threads: num_cpus::get().max(2),
            thread_name: "clusterstats-io".into(),
        }
    }
}

/// Owned runtime driving collections for synchronous callers
pub struct StatsRuntime {
    runtime: Runtime,
    config: RuntimeConfig,
}

impl StatsRuntime {
    /// Create a new runtime with the given configuration
    pub fn new(config: RuntimeConfig) -> Result<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(config.worker_threads.max(1))
            .thread_name(config.thread_name.clone())
            .enable_all()
            .build()
            .map_err(|e| StatsError::DispatchFailed {
                reason: format!("Failed to create runtime: {}", e),
            })?;

        Ok(Self { runtime, config })
    }

    /// Configuration this runtime was built with
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Run a collection to completion, blocking the calling thread.
    ///
    /// Must not be called from within an async context.
    pub fn collect_cluster_stats(
        &self,
        coordinator: &StatsCoordinator,
        request: &ClusterStatsRequest,
    ) -> Result<AggregateResult> {
        self.runtime
            .block_on(coordinator.collect_cluster_stats(request))
    }

    /// Shut down, giving in-flight calls a grace period
    pub fn shutdown(self, grace: Duration) {
        self.runtime.shutdown_timeout(grace);
    }
}
