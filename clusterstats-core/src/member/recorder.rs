//! Member-local stats recorder
//!
//! Accumulates counters, statuses, indicators and diagnoses as the member
//! observes them; a stats request takes a snapshot.

use std::collections::BTreeSet;

use parking_lot::Mutex;

use super::node::LocalStatsProvider;
use crate::error::Result;
use crate::stats::{CounterTree, HealthStatus, LabelMap, MemberId, PartialResult};

/// Thread-safe accumulator for one member's stats
#[derive(Default)]
pub struct StatsRecorder {
    state: Mutex<RecorderState>,
}

#[derive(Default)]
struct RecorderState {
    counters: CounterTree,
    statuses: BTreeSet<HealthStatus>,
    indicators: LabelMap,
    diagnoses: LabelMap,
}

impl StatsRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `by` to the counter at a dotted path
    pub fn inc(&self, path: &str, by: i64) -> Result<()> {
        self.state.lock().counters.inc(path, by)
    }

    pub fn record_status(&self, status: HealthStatus) {
        self.state.lock().statuses.insert(status);
    }

    pub fn record_indicator(&self, status: HealthStatus, indicator: impl Into<String>) {
        self.state
            .lock()
            .indicators
            .entry(status)
            .or_default()
            .insert(indicator.into());
    }

    pub fn record_diagnosis(&self, status: HealthStatus, diagnosis: impl Into<String>) {
        self.state
            .lock()
            .diagnoses
            .entry(status)
            .or_default()
            .insert(diagnosis.into());
    }

    /// Clear everything recorded so far
    pub fn reset(&self) {
        *self.state.lock() = RecorderState::default();
    }

    /// Current stats as a partial result. Counters are absent until one is
    /// recorded.
    pub fn snapshot(&self, member_id: MemberId) -> PartialResult {
        let state = self.state.lock();
        PartialResult {
            member_id,
            counters: (!state.counters.is_empty()).then(|| state.counters.clone()),
            statuses: state.statuses.clone(),
            indicators: state.indicators.clone(),
            diagnoses: state.diagnoses.clone(),
        }
    }
}

impl LocalStatsProvider for StatsRecorder {
    fn local_stats(&self, member_id: &MemberId) -> Result<PartialResult> {
        Ok(self.snapshot(member_id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_snapshot_has_no_counters() {
        let recorder = StatsRecorder::new();
        let result = recorder.snapshot(MemberId::new("n1"));
        assert!(result.counters.is_none());
        assert!(result.statuses.is_empty());
    }

    #[test]
    fn test_snapshot_collects_observations() {
        let recorder = StatsRecorder::new();
        recorder.inc("invocations.total", 2).unwrap();
        recorder.record_status(HealthStatus::Red);
        recorder.record_status(HealthStatus::Red);
        recorder.record_indicator(HealthStatus::Red, "disk");
        recorder.record_indicator(HealthStatus::Red, "disk");
        recorder.record_diagnosis(HealthStatus::Yellow, "ilm:not_running");

        let result = recorder.local_stats(&MemberId::new("n1")).unwrap();
        assert_eq!(result.counters.unwrap().get("invocations.total"), 2);
        assert_eq!(result.statuses.len(), 1);
        assert_eq!(result.indicators[&HealthStatus::Red].len(), 1);
        assert!(result.diagnoses[&HealthStatus::Yellow].contains("ilm:not_running"));
    }

    #[test]
    fn test_invalid_path_and_reset() {
        let recorder = StatsRecorder::new();
        assert!(recorder.inc("bad..path", 1).is_err());
        recorder.inc("ok", 1).unwrap();
        recorder.reset();
        assert!(recorder.snapshot(MemberId::new("n1")).counters.is_none());
    }
}
