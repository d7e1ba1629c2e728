//! Error types for cluster stats collection
//!
//! Operation-level errors, per-member failure causes and transport errors.
//! Member failures are recorded, never propagated out of a gather.

use serde::Serialize;
use thiserror::Error;

/// Primary error type for all collection operations
#[derive(Debug, Error)]
pub enum StatsError {
    // ========== Data Errors ==========

    /// Counter path is empty or contains an empty segment
    #[error("Invalid counter path: {path:?}")]
    InvalidCounterPath { path: String },

    // ========== Gather Errors ==========

    /// A member contributed more than one outcome to the same operation
    #[error("Duplicate contribution from member {member_id}")]
    DuplicateContribution { member_id: String },

    /// An outcome arrived for a member the operation never dispatched to
    #[error("Unexpected contribution from member {member_id}")]
    UnexpectedMember { member_id: String },

    /// Gather was finished before every dispatched member resolved
    #[error("Gather incomplete: expected {expected} outcomes, received {received}")]
    GatherIncomplete { expected: usize, received: usize },

    // ========== Protocol Errors ==========

    /// Envelope could not be decoded
    #[error("Decode failed: {reason}")]
    Decode { reason: String },

    /// Local stats provider failed on the member side
    #[error("Stats provider failed: {message}")]
    Provider { message: String },

    // ========== Runtime Errors ==========

    /// The coordination layer could not issue the calls at all
    #[error("Dispatch failed: {reason}")]
    DispatchFailed { reason: String },

    /// Internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl StatsError {
    /// Returns true for bookkeeping violations that correct dispatch never produces
    pub fn is_programmer_error(&self) -> bool {
        matches!(
            self,
            StatsError::DuplicateContribution { .. }
                | StatsError::UnexpectedMember { .. }
                | StatsError::GatherIncomplete { .. }
        )
    }

    pub(crate) fn decode(reason: impl Into<String>) -> Self {
        StatsError::Decode { reason: reason.into() }
    }
}

/// Why a single member did not contribute a partial result
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MemberError {
    /// Member did not answer within its timeout
    #[error("timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// Request or response could not be delivered
    #[error("transport failure: {reason}")]
    Transport { reason: String },

    /// Response arrived but was malformed
    #[error("malformed response: {reason}")]
    Decode { reason: String },

    /// Member reported a failure computing its stats
    #[error("remote failure: {reason}")]
    Remote { reason: String },

    /// The call task itself panicked
    #[error("call panicked: {reason}")]
    Panicked { reason: String },
}

impl MemberError {
    /// Returns true if the member timed out
    pub fn is_timeout(&self) -> bool {
        matches!(self, MemberError::Timeout { .. })
    }
}

/// Errors raised by a transport implementation
#[derive(Debug, Error)]
pub enum TransportError {
    /// No route to the member
    #[error("member {member_id} unreachable")]
    Unreachable { member_id: String },

    /// Connection closed before a response arrived
    #[error("connection closed: {reason}")]
    Closed { reason: String },
}

impl From<TransportError> for MemberError {
    fn from(err: TransportError) -> Self {
        MemberError::Transport { reason: err.to_string() }
    }
}

/// Result type alias for collection operations
pub type Result<T> = std::result::Result<T, StatsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_programmer_errors() {
        let dup = StatsError::DuplicateContribution { member_id: "n1".into() };
        assert!(dup.is_programmer_error());
        assert!(!StatsError::decode("short").is_programmer_error());
    }

    #[test]
    fn test_transport_error_becomes_member_error() {
        let err: MemberError = TransportError::Unreachable { member_id: "n2".into() }.into();
        assert_eq!(
            err,
            MemberError::Transport { reason: "member n2 unreachable".into() }
        );
        assert!(!err.is_timeout());
    }

    #[test]
    fn test_member_error_serializes_tagged() {
        let json = serde_json::to_string(&MemberError::Timeout { timeout_ms: 50 }).unwrap();
        assert_eq!(json, r#"{"type":"timeout","timeout_ms":50}"#);
    }
}
