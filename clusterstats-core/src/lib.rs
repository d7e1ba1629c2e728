//! ClusterStats Core - cluster-wide health stats collection
//!
//! This crate provides the coordination layer that:
//! - Broadcasts a stats request to every cluster member
//! - Gathers per-member results, isolating member failures and timeouts
//! - Merges counter trees, statuses, indicators and diagnoses into one view

pub mod coordinator;
pub mod error;
pub mod member;
pub mod metrics;
pub mod protocol;
pub mod runtime;
pub mod stats;

pub use coordinator::{ClusterStatsRequest, CoordinatorConfig, StatsCoordinator};
pub use error::{MemberError, StatsError};
pub use runtime::StatsRuntime;
pub use stats::{AggregateResult, CounterTree, HealthStatus, MemberId, PartialResult};

/// Default per-member timeout in seconds
pub const DEFAULT_MEMBER_TIMEOUT_SECS: u64 = 30;
