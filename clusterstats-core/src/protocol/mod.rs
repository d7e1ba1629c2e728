//! Member call protocol
//!
//! The transport seam the coordinator sends envelopes through, and the
//! envelope codec.

pub mod codec;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::TransportError;
use crate::stats::MemberId;

pub use codec::{
    decode_request, decode_response, decode_response_from, encode_request, encode_response,
    NodeResponse, NodeStatsRequest,
};

/// Point-to-point delivery of request envelopes to cluster members.
///
/// Implementations either return the member's response envelope or an
/// explicit failure for that destination. Timeouts are enforced by the
/// caller.
#[async_trait]
pub trait MemberTransport: Send + Sync + 'static {
    async fn send(&self, member_id: &MemberId, request: Bytes) -> Result<Bytes, TransportError>;
}
