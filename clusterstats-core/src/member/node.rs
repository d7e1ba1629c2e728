//! Member request handler
//!
//! Decodes a node stats request, asks the local provider for stats and
//! encodes the response envelope. Provider failures travel back as remote
//! failures instead of being dropped.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, warn};

use crate::error::Result;
use crate::protocol::{decode_request, encode_response, NodeResponse};
use crate::stats::{MemberId, PartialResult};

/// Computes a member's partial result from its local state
pub trait LocalStatsProvider: Send + Sync + 'static {
    fn local_stats(&self, member_id: &MemberId) -> Result<PartialResult>;
}

/// A cluster member answering stats requests
pub struct MemberNode {
    member_id: MemberId,
    provider: Arc<dyn LocalStatsProvider>,
}

impl MemberNode {
    /// Create a member answering with stats from `provider`
    pub fn new(member_id: MemberId, provider: Arc<dyn LocalStatsProvider>) -> Self {
        Self { member_id, provider }
    }

    /// Handle one request envelope, always producing a response envelope
    pub fn handle(&self, request: &[u8]) -> Bytes {
        let response = match decode_request(request) {
            Ok(request) => {
                debug!(
                    "Member {} computing stats for request {} (timeout {:?})",
                    self.member_id,
                    request.request_id,
                    request.timeout()
                );
                match self.provider.local_stats(&self.member_id) {
                    Ok(mut result) => {
                        result.member_id = self.member_id.clone();
                        NodeResponse::Stats(result)
                    }
                    Err(e) => {
                        warn!("Member {} failed to compute stats: {}", self.member_id, e);
                        NodeResponse::Failure { reason: e.to_string() }
                    }
                }
            }
            Err(e) => {
                warn!("Member {} rejected request: {}", self.member_id, e);
                NodeResponse::Failure {
                    reason: format!("bad request: {}", e),
                }
            }
        };
        self.encode(&response)
    }

    /// Encode a response, answering with a failure if the stats do not fit
    fn encode(&self, response: &NodeResponse) -> Bytes {
        match encode_response(response) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Member {} failed to encode response: {}", self.member_id, e);
                encode_response(&NodeResponse::Failure { reason: e.to_string() }).unwrap_or_default()
            }
        }
    }
}
