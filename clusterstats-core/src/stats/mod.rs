//! Mergeable stats data model
//!
//! Counter trees, health statuses, per-member results and the aggregator.

pub mod aggregate;
pub mod counters;
pub mod partial;
pub mod status;

pub use aggregate::{AggregateResult, Aggregator, NodesSummary};
pub use counters::{CounterPath, CounterTree};
pub use partial::{FailureRecord, LabelMap, MemberId, MemberOutcome, PartialResult};
pub use status::HealthStatus;
