//! Coordinator for cluster-wide stats collection
//!
//! Handles membership snapshots, fan-out dispatch and gathering.

pub mod dispatch;
pub mod gather;
pub mod membership;

pub use dispatch::{
    ClusterStatsRequest, CoordinatorConfig, OperationPhase, PhaseObserver, StatsCoordinator,
};
pub use gather::{Arrival, GatherCollector, GatherOutcome};
pub use membership::{MemberDirectory, StaticMembership};
