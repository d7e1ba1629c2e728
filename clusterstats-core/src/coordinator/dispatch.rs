//! Dispatch coordinator
//!
//! Broadcasts a stats request to every targeted member, runs each call as an
//! independent task under its own timeout, and aggregates once every call
//! has resolved to a result or a failure record.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use tokio::runtime::Handle;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::gather::{Arrival, GatherCollector};
use super::membership::MemberDirectory;
use crate::error::{MemberError, Result, StatsError};
use crate::metrics::standard;
use crate::protocol::codec::duration_millis;
use crate::protocol::{decode_response_from, encode_request, MemberTransport, NodeResponse, NodeStatsRequest};
use crate::stats::{AggregateResult, Aggregator, FailureRecord, MemberId, MemberOutcome};

/// Configuration for the coordinator
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Cluster name reported in aggregates
    pub cluster_name: String,
    /// Per-member timeout when the request does not set one
    pub member_timeout: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            cluster_name: "clusterstats".into(),
            member_timeout: Duration::from_secs(crate::DEFAULT_MEMBER_TIMEOUT_SECS),
        }
    }
}

/// Cluster stats request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterStatsRequest {
    /// Members to target. `None` targets the whole membership.
    pub node_ids: Option<Vec<MemberId>>,
    /// Per-member timeout override
    pub timeout: Option<Duration>,
}

impl ClusterStatsRequest {
    /// Target every member
    pub fn all() -> Self {
        Self::default()
    }

    /// Target only these members
    pub fn nodes<I, M>(ids: I) -> Self
    where
        I: IntoIterator<Item = M>,
        M: Into<MemberId>,
    {
        Self {
            node_ids: Some(ids.into_iter().map(Into::into).collect()),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Narrow a membership snapshot to the requested members
    fn resolve(&self, members: BTreeSet<MemberId>) -> BTreeSet<MemberId> {
        match &self.node_ids {
            None => members,
            Some(ids) => {
                let mut targets = BTreeSet::new();
                for id in ids {
                    if members.contains(id) {
                        targets.insert(id.clone());
                    } else {
                        debug!("Requested member {} is not in the cluster", id);
                    }
                }
                targets
            }
        }
    }
}

impl fmt::Display for ClusterStatsRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("health_api_stats")
    }
}

/// Per-operation state. Transitions run strictly forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum OperationPhase {
    /// Calls issued to every targeted member
    Dispatched,
    /// Waiting for outstanding calls
    Gathering,
    /// Aggregate built and handed to the caller
    Aggregated,
}

impl OperationPhase {
    /// Next phase, `None` once terminal
    pub fn next(self) -> Option<Self> {
        match self {
            OperationPhase::Dispatched => Some(OperationPhase::Gathering),
            OperationPhase::Gathering => Some(OperationPhase::Aggregated),
            OperationPhase::Aggregated => None,
        }
    }

    fn advance(&mut self, request_id: Uuid) -> Self {
        if let Some(next) = self.next() {
            debug!("Stats request {} {:?} -> {:?}", request_id, self, next);
            *self = next;
        }
        *self
    }
}

/// Notified as each collection enters a phase
pub trait PhaseObserver: Send + Sync {
    fn on_phase(&self, request_id: Uuid, phase: OperationPhase);
}

/// Coordinates cluster-wide stats collection
pub struct StatsCoordinator {
    config: CoordinatorConfig,
    directory: Arc<dyn MemberDirectory>,
    transport: Arc<dyn MemberTransport>,
    aggregator: Aggregator,
    observer: Option<Arc<dyn PhaseObserver>>,
}

impl StatsCoordinator {
    /// Create a new coordinator
    pub fn new(
        config: CoordinatorConfig,
        directory: Arc<dyn MemberDirectory>,
        transport: Arc<dyn MemberTransport>,
    ) -> Self {
        let aggregator = Aggregator::new(config.cluster_name.clone());
        Self {
            config,
            directory,
            transport,
            aggregator,
            observer: None,
        }
    }

    /// Report phase transitions of every collection to `observer`
    pub fn with_observer(mut self, observer: Arc<dyn PhaseObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Coordinator configuration
    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    fn enter(&self, request_id: Uuid, phase: OperationPhase) {
        if let Some(observer) = &self.observer {
            observer.on_phase(request_id, phase);
        }
    }

    /// Collect and aggregate stats from every targeted member.
    ///
    /// Member failures never fail the operation: they are reported in
    /// [`AggregateResult::failures`]. Only an inability to issue the calls,
    /// or broken gather bookkeeping, surfaces as an error.
    pub async fn collect_cluster_stats(&self, request: &ClusterStatsRequest) -> Result<AggregateResult> {
        let handle = Handle::try_current().map_err(|e| StatsError::DispatchFailed {
            reason: format!("no async runtime to issue member calls: {}", e),
        })?;

        let started = Instant::now();
        let request_id = Uuid::new_v4();
        let timeout = request.timeout.unwrap_or(self.config.member_timeout);
        let targets = request.resolve(self.directory.list_members().await);

        standard::STATS_REQUESTS.inc();
        standard::LAST_MEMBER_COUNT.set(targets.len() as i64);

        let collector = Arc::new(GatherCollector::new(targets.iter().cloned()));
        let envelope = encode_request(&NodeStatsRequest::new(request_id, timeout))?;

        let mut phase = OperationPhase::Dispatched;
        let mut calls = JoinSet::new();
        for member_id in &targets {
            let transport = self.transport.clone();
            let collector = collector.clone();
            let member_id = member_id.clone();
            let envelope = envelope.clone();

            calls.spawn_on(
                async move {
                    let outcome = call_member(transport.as_ref(), member_id, envelope, timeout).await;
                    let arrival = collector.record(outcome)?;
                    if arrival == Arrival::Complete {
                        debug!("Stats request {}: all members resolved", request_id);
                    }
                    Ok::<Arrival, StatsError>(arrival)
                },
                &handle,
            );
        }

        info!(
            "Dispatched {} {} to {} members (timeout {:?})",
            request,
            request_id,
            targets.len(),
            timeout
        );
        self.enter(request_id, phase);
        self.enter(request_id, phase.advance(request_id));

        let mut bookkeeping_error = None;
        while let Some(joined) = calls.join_next().await {
            match joined {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => {
                    error!("Stats request {}: {}", request_id, e);
                    bookkeeping_error.get_or_insert(e);
                }
                Err(e) => warn!("Stats request {}: member call task failed: {}", request_id, e),
            }
        }
        if let Some(e) = bookkeeping_error {
            return Err(e);
        }

        // Calls whose task died before recording still owe exactly one outcome.
        for member_id in collector.missing() {
            let failure = FailureRecord::new(
                member_id,
                MemberError::Panicked {
                    reason: "member call task terminated without an outcome".into(),
                },
            );
            collector.record(failure.into())?;
        }

        let gathered = collector.finish()?;
        for failure in &gathered.failures {
            warn!(
                "Stats request {}: member {} failed: {}",
                request_id, failure.member_id, failure.cause
            );
            standard::MEMBER_FAILURES.inc();
            if failure.cause.is_timeout() {
                standard::MEMBER_TIMEOUTS.inc();
            }
        }

        let aggregate = self.aggregator.aggregate(&gathered.results, gathered.failures)?;
        self.enter(request_id, phase.advance(request_id));

        let elapsed = started.elapsed();
        standard::GATHER_DURATION.observe(elapsed);
        info!(
            "Stats request {} {:?}: {} successful, {} failed in {:?}",
            request_id, phase, aggregate.nodes.successful, aggregate.nodes.failed, elapsed
        );

        Ok(aggregate)
    }
}

/// One member call, converted to exactly one outcome
async fn call_member(
    transport: &dyn MemberTransport,
    member_id: MemberId,
    envelope: Bytes,
    timeout: Duration,
) -> MemberOutcome {
    standard::MEMBER_CALLS.inc();
    let started = Instant::now();

    let result = tokio::time::timeout(timeout, transport.send(&member_id, envelope)).await;
    standard::MEMBER_CALL_DURATION.observe(started.elapsed());

    let cause = match result {
        Err(_) => MemberError::Timeout {
            timeout_ms: duration_millis(timeout),
        },
        Ok(Err(e)) => e.into(),
        Ok(Ok(bytes)) => match decode_response_from(&bytes, &member_id) {
            Ok(NodeResponse::Stats(result)) => return MemberOutcome::Result(result),
            Ok(NodeResponse::Failure { reason }) => MemberError::Remote { reason },
            Err(StatsError::Decode { reason }) => MemberError::Decode { reason },
            Err(e) => MemberError::Decode { reason: e.to_string() },
        },
    };

    MemberOutcome::Failure(FailureRecord::new(member_id, cause))
}
