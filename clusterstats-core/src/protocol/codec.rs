//! Envelope codec for node stats requests and responses
//!
//! Envelopes are serde types encoded with bincode: big-endian, fixed-width
//! integers, bounded in size. Decoding is strict. Trailing bytes, unknown
//! variants, a foreign magic or version and invalid counter paths are all
//! rejected.

use std::time::Duration;

use bincode::Options;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, StatsError};
use crate::stats::{MemberId, PartialResult};

/// Request magic, "HS"
pub const REQUEST_MAGIC: u16 = 0x4853;

/// Envelope version
pub const WIRE_VERSION: u8 = 1;

/// Largest envelope accepted in either direction
pub const MAX_ENVELOPE_BYTES: u64 = 16 * 1024 * 1024;

/// Per-member stats request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStatsRequest {
    pub magic: u16,
    pub version: u8,
    /// Collection operation this call belongs to
    pub request_id: Uuid,
    /// Time the coordinator will wait for this member
    pub timeout_ms: u64,
}

impl NodeStatsRequest {
    /// Request for the current wire version
    pub fn new(request_id: Uuid, timeout: Duration) -> Self {
        Self {
            magic: REQUEST_MAGIC,
            version: WIRE_VERSION,
            request_id,
            timeout_ms: duration_millis(timeout),
        }
    }

    /// Member timeout as a duration
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Per-member stats response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeResponse {
    /// Member computed its stats
    Stats(PartialResult),
    /// Member failed to compute its stats
    Failure { reason: String },
}

/// Milliseconds in a duration, saturating at `u64::MAX`
pub fn duration_millis(duration: Duration) -> u64 {
    duration.as_millis().min(u64::MAX as u128) as u64
}

fn wire() -> impl Options {
    bincode::DefaultOptions::new()
        .with_big_endian()
        .with_fixint_encoding()
        .with_limit(MAX_ENVELOPE_BYTES)
        .reject_trailing_bytes()
}

fn encode<T: Serialize>(value: &T) -> Result<Bytes> {
    wire()
        .serialize(value)
        .map(Bytes::from)
        .map_err(|e| StatsError::Internal {
            message: format!("Failed to encode envelope: {}", e),
        })
}

/// Encode a node request
pub fn encode_request(request: &NodeStatsRequest) -> Result<Bytes> {
    encode(request)
}

/// Decode a node request
pub fn decode_request(bytes: &[u8]) -> Result<NodeStatsRequest> {
    let request: NodeStatsRequest = wire()
        .deserialize(bytes)
        .map_err(|e| StatsError::decode(e.to_string()))?;

    if request.magic != REQUEST_MAGIC {
        return Err(StatsError::decode(format!(
            "bad request magic {:#06x}",
            request.magic
        )));
    }
    if request.version != WIRE_VERSION {
        return Err(StatsError::decode(format!(
            "unsupported wire version {}",
            request.version
        )));
    }
    Ok(request)
}

/// Encode a node response
pub fn encode_response(response: &NodeResponse) -> Result<Bytes> {
    encode(response)
}

/// Decode a node response
pub fn decode_response(bytes: &[u8]) -> Result<NodeResponse> {
    wire()
        .deserialize(bytes)
        .map_err(|e| StatsError::decode(e.to_string()))
}

/// Decode a response addressed to `expected`.
///
/// Stats stamped with any other member id are rejected.
pub fn decode_response_from(bytes: &[u8], expected: &MemberId) -> Result<NodeResponse> {
    let response = decode_response(bytes)?;
    if let NodeResponse::Stats(result) = &response {
        if &result.member_id != expected {
            return Err(StatsError::decode(format!(
                "response from {} for request to {}",
                result.member_id, expected
            )));
        }
    }
    Ok(response)
}
