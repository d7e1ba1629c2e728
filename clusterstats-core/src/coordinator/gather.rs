//! Gather collector
//!
//! Thread-safe accumulation point for member outcomes arriving in any order.
//! Each dispatched member contributes exactly once; the first outcome wins
//! and any repeat is rejected.

use std::collections::HashSet;

use parking_lot::Mutex;
use tracing::{debug, error};

use crate::error::{Result, StatsError};
use crate::stats::{FailureRecord, MemberId, MemberOutcome, PartialResult};

/// Collector progress after an arrival
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arrival {
    /// Still waiting on this many members
    Pending { remaining: usize },
    /// Every dispatched member has resolved
    Complete,
}

/// Results and failures, each in arrival order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GatherOutcome {
    pub results: Vec<PartialResult>,
    pub failures: Vec<FailureRecord>,
}

struct GatherState {
    expected: HashSet<MemberId>,
    arrived: HashSet<MemberId>,
    outcome: GatherOutcome,
    finished: bool,
}

/// Accumulates one outcome per dispatched member
pub struct GatherCollector {
    state: Mutex<GatherState>,
}

impl GatherCollector {
    /// Create a collector expecting one outcome from each member
    pub fn new(expected: impl IntoIterator<Item = MemberId>) -> Self {
        Self {
            state: Mutex::new(GatherState {
                expected: expected.into_iter().collect(),
                arrived: HashSet::new(),
                outcome: GatherOutcome::default(),
                finished: false,
            }),
        }
    }

    /// Record a member outcome.
    ///
    /// Outcomes from members that were not dispatched to, or from members
    /// that already contributed, are rejected and leave the state unchanged.
    pub fn record(&self, outcome: MemberOutcome) -> Result<Arrival> {
        let mut state = self.state.lock();
        let member_id = outcome.member_id().clone();

        if !state.expected.contains(&member_id) {
            error!("Outcome from undispatched member {}", member_id);
            return Err(StatsError::UnexpectedMember {
                member_id: member_id.to_string(),
            });
        }
        if state.finished || !state.arrived.insert(member_id.clone()) {
            error!("Duplicate outcome from member {}", member_id);
            return Err(StatsError::DuplicateContribution {
                member_id: member_id.to_string(),
            });
        }

        match outcome {
            MemberOutcome::Result(result) => state.outcome.results.push(result),
            MemberOutcome::Failure(failure) => state.outcome.failures.push(failure),
        }

        let remaining = state.expected.len() - state.arrived.len();
        debug!("Outcome from member {}, remaining: {}", member_id, remaining);

        if remaining == 0 {
            Ok(Arrival::Complete)
        } else {
            Ok(Arrival::Pending { remaining })
        }
    }

    /// Number of members still outstanding
    pub fn remaining(&self) -> usize {
        let state = self.state.lock();
        state.expected.len() - state.arrived.len()
    }

    /// True once every dispatched member has resolved
    pub fn is_complete(&self) -> bool {
        self.remaining() == 0
    }

    /// Members that have not contributed yet, sorted
    pub fn missing(&self) -> Vec<MemberId> {
        let state = self.state.lock();
        let mut missing: Vec<MemberId> = state
            .expected
            .difference(&state.arrived)
            .cloned()
            .collect();
        missing.sort();
        missing
    }

    /// Hand over the gathered outcome. Fails if members are outstanding or
    /// the outcome was already taken.
    pub fn finish(&self) -> Result<GatherOutcome> {
        let mut state = self.state.lock();
        if state.finished {
            return Err(StatsError::Internal {
                message: "gather already finished".into(),
            });
        }
        let received = state.arrived.len();
        if received < state.expected.len() {
            return Err(StatsError::GatherIncomplete {
                expected: state.expected.len(),
                received,
            });
        }
        state.finished = true;
        Ok(std::mem::take(&mut state.outcome))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MemberError;
    use std::sync::Arc;

    fn ids(names: &[&str]) -> Vec<MemberId> {
        names.iter().map(|n| MemberId::new(*n)).collect()
    }

    fn timeout(name: &str) -> MemberOutcome {
        FailureRecord::new(MemberId::new(name), MemberError::Timeout { timeout_ms: 10 }).into()
    }

    #[test]
    fn test_completes_after_every_member() {
        let collector = GatherCollector::new(ids(&["a", "b"]));
        assert_eq!(
            collector.record(PartialResult::new("b").into()).unwrap(),
            Arrival::Pending { remaining: 1 }
        );
        assert!(!collector.is_complete());
        assert_eq!(collector.missing(), ids(&["a"]));

        assert_eq!(collector.record(timeout("a")).unwrap(), Arrival::Complete);

        let outcome = collector.finish().unwrap();
        assert_eq!(outcome.results, vec![PartialResult::new("b")]);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].member_id, MemberId::new("a"));
    }

    #[test]
    fn test_empty_collector_is_complete() {
        let collector = GatherCollector::new(Vec::new());
        assert!(collector.is_complete());
        assert_eq!(collector.finish().unwrap(), GatherOutcome::default());
    }

    #[test]
    fn test_duplicate_rejected_first_kept() {
        let collector = GatherCollector::new(ids(&["a", "b"]));
        collector.record(PartialResult::new("a").into()).unwrap();

        let err = collector.record(timeout("a")).unwrap_err();
        assert!(matches!(err, StatsError::DuplicateContribution { .. }));
        assert_eq!(collector.remaining(), 1);

        collector.record(PartialResult::new("b").into()).unwrap();
        let outcome = collector.finish().unwrap();
        assert_eq!(outcome.results.len(), 2);
        assert!(outcome.failures.is_empty());
    }

    #[test]
    fn test_unexpected_member_rejected() {
        let collector = GatherCollector::new(ids(&["a"]));
        let err = collector.record(PartialResult::new("z").into()).unwrap_err();
        assert!(matches!(err, StatsError::UnexpectedMember { .. }));
        assert_eq!(collector.remaining(), 1);
    }

    #[test]
    fn test_finish_requires_completion() {
        let collector = GatherCollector::new(ids(&["a", "b"]));
        collector.record(timeout("a")).unwrap();
        let err = collector.finish().unwrap_err();
        assert!(matches!(err, StatsError::GatherIncomplete { expected: 2, received: 1 }));

        collector.record(timeout("b")).unwrap();
        assert!(collector.finish().is_ok());
        assert!(collector.finish().is_err());
        assert!(collector.record(timeout("a")).is_err());
    }

    #[test]
    fn test_arrival_order_preserved() {
        let collector = GatherCollector::new(ids(&["a", "b", "c"]));
        for name in ["c", "a", "b"] {
            collector.record(timeout(name)).unwrap();
        }
        let order: Vec<_> = collector
            .finish()
            .unwrap()
            .failures
            .into_iter()
            .map(|f| f.member_id)
            .collect();
        assert_eq!(order, ids(&["c", "a", "b"]));
    }

    #[test]
    fn test_concurrent_arrivals_recorded_once() {
        let members: Vec<MemberId> = (0..64).map(|i| MemberId::new(format!("n{i}"))).collect();
        let collector = Arc::new(GatherCollector::new(members.clone()));

        let handles: Vec<_> = members
            .into_iter()
            .map(|member_id| {
                let collector = collector.clone();
                std::thread::spawn(move || {
                    let first = collector.record(PartialResult::new(member_id.clone()).into());
                    let second = collector.record(PartialResult::new(member_id).into());
                    (first.is_ok(), second.is_ok())
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), (true, false));
        }
        assert_eq!(collector.finish().unwrap().results.len(), 64);
    }
}
