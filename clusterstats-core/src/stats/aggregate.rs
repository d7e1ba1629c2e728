//! Cluster-wide aggregation of partial results
//!
//! Folds every member's [`PartialResult`] into one [`AggregateResult`].
//! Counter trees merge by summation, status sets and label sets by union.

use std::collections::{BTreeSet, HashSet};

use serde::Serialize;
use tracing::debug;

use super::counters::CounterTree;
use super::partial::{FailureRecord, LabelMap, PartialResult};
use super::status::HealthStatus;
use crate::error::{Result, StatsError};

/// Node accounting for a collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NodesSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
}

/// Cluster-wide merged view
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateResult {
    #[serde(rename = "_nodes")]
    pub nodes: NodesSummary,
    pub cluster_name: String,
    /// Sum of every member's counter tree
    pub counters: CounterTree,
    pub statuses: BTreeSet<HealthStatus>,
    pub indicators: LabelMap,
    pub diagnoses: LabelMap,
    /// Failed members, in arrival order
    pub failures: Vec<FailureRecord>,
}

impl AggregateResult {
    /// Render as pretty-printed JSON
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| StatsError::Internal {
            message: format!("Failed to render aggregate: {}", e),
        })
    }
}

/// Merges partial results into an [`AggregateResult`]
#[derive(Debug, Clone)]
pub struct Aggregator {
    cluster_name: String,
}

impl Aggregator {
    pub fn new(cluster_name: impl Into<String>) -> Self {
        Self {
            cluster_name: cluster_name.into(),
        }
    }

    /// Aggregate results and failures.
    ///
    /// A member appearing more than once across `results` and `failures` is
    /// rejected with [`StatsError::DuplicateContribution`]. The merged data
    /// does not depend on the order of `results`.
    pub fn aggregate(
        &self,
        results: &[PartialResult],
        failures: Vec<FailureRecord>,
    ) -> Result<AggregateResult> {
        let mut seen = HashSet::with_capacity(results.len() + failures.len());
        let members = results
            .iter()
            .map(|r| &r.member_id)
            .chain(failures.iter().map(|f| &f.member_id));
        for member_id in members {
            if !seen.insert(member_id) {
                return Err(StatsError::DuplicateContribution {
                    member_id: member_id.to_string(),
                });
            }
        }

        let counters = CounterTree::merge_all(results.iter().filter_map(|r| r.counters.as_ref()));
        let statuses = results
            .iter()
            .flat_map(|r| r.statuses.iter().copied())
            .collect();
        let indicators = union_labels(results.iter().map(|r| &r.indicators));
        let diagnoses = union_labels(results.iter().map(|r| &r.diagnoses));

        let nodes = NodesSummary {
            total: results.len() + failures.len(),
            successful: results.len(),
            failed: failures.len(),
        };

        debug!(
            "Aggregated {} results and {} failures for cluster {}",
            nodes.successful, nodes.failed, self.cluster_name
        );

        Ok(AggregateResult {
            nodes,
            cluster_name: self.cluster_name.clone(),
            counters,
            statuses,
            indicators,
            diagnoses,
            failures,
        })
    }
}

/// Per-status union. Statuses absent from every input stay absent.
fn union_labels<'a>(maps: impl Iterator<Item = &'a LabelMap>) -> LabelMap {
    let mut merged = LabelMap::new();
    for map in maps {
        for (status, labels) in map {
            merged
                .entry(*status)
                .or_default()
                .extend(labels.iter().cloned());
        }
    }
    merged
}
