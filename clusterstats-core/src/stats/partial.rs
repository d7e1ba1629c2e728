//! Per-member contributions
//!
//! A member answers a stats request with exactly one [`MemberOutcome`]:
//! either its [`PartialResult`] or a [`FailureRecord`].

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use super::counters::CounterTree;
use super::status::HealthStatus;
use crate::error::MemberError;

/// Labels grouped by the status they were observed at
pub type LabelMap = BTreeMap<HealthStatus, BTreeSet<String>>;

/// Cluster member identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberId(String);

impl MemberId {
    /// Wrap an identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MemberId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for MemberId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Stats computed locally by one member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialResult {
    /// Member that produced this result
    pub member_id: MemberId,
    /// Counter tree, absent when the member tracked nothing
    pub counters: Option<CounterTree>,
    /// Statuses observed on the member
    pub statuses: BTreeSet<HealthStatus>,
    /// Indicator names by status
    pub indicators: LabelMap,
    /// Diagnosis identifiers by status
    pub diagnoses: LabelMap,
}

impl PartialResult {
    /// Empty result for a member
    pub fn new(member_id: impl Into<MemberId>) -> Self {
        Self {
            member_id: member_id.into(),
            counters: None,
            statuses: BTreeSet::new(),
            indicators: LabelMap::new(),
            diagnoses: LabelMap::new(),
        }
    }

    /// Attach a counter tree
    pub fn with_counters(mut self, counters: CounterTree) -> Self {
        self.counters = Some(counters);
        self
    }

    /// Add an observed status
    pub fn with_status(mut self, status: HealthStatus) -> Self {
        self.statuses.insert(status);
        self
    }

    /// Add an indicator name under a status
    pub fn with_indicator(mut self, status: HealthStatus, indicator: impl Into<String>) -> Self {
        self.indicators.entry(status).or_default().insert(indicator.into());
        self
    }

    /// Add a diagnosis identifier under a status
    pub fn with_diagnosis(mut self, status: HealthStatus, diagnosis: impl Into<String>) -> Self {
        self.diagnoses.entry(status).or_default().insert(diagnosis.into());
        self
    }
}

/// A member that did not contribute a result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureRecord {
    pub member_id: MemberId,
    pub cause: MemberError,
}

impl FailureRecord {
    /// Record `cause` against a member
    pub fn new(member_id: MemberId, cause: MemberError) -> Self {
        Self { member_id, cause }
    }
}

/// Terminal outcome of one member call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberOutcome {
    Result(PartialResult),
    Failure(FailureRecord),
}

impl MemberOutcome {
    /// Member this outcome belongs to
    pub fn member_id(&self) -> &MemberId {
        match self {
            MemberOutcome::Result(result) => &result.member_id,
            MemberOutcome::Failure(failure) => &failure.member_id,
        }
    }
}

impl From<PartialResult> for MemberOutcome {
    fn from(result: PartialResult) -> Self {
        MemberOutcome::Result(result)
    }
}

impl From<FailureRecord> for MemberOutcome {
    fn from(failure: FailureRecord) -> Self {
        MemberOutcome::Failure(failure)
    }
}
