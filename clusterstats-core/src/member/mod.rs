//! Member-side stats handling
//!
//! Local stats providers, the request handler every member runs, and an
//! in-process cluster wiring members to the coordinator.

pub mod local;
pub mod node;
pub mod recorder;

pub use local::LocalCluster;
pub use node::{LocalStatsProvider, MemberNode};
pub use recorder::StatsRecorder;
