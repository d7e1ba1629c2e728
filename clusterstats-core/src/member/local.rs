//! In-process cluster
//!
//! Members live in the coordinator's process and envelopes are routed to
//! them directly. A member can be detached from the transport while staying
//! listed, which makes it unreachable.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use tracing::info;

use super::node::{LocalStatsProvider, MemberNode};
use crate::coordinator::MemberDirectory;
use crate::error::TransportError;
use crate::protocol::MemberTransport;
use crate::stats::MemberId;

struct Slot {
    node: Arc<MemberNode>,
    attached: bool,
}

/// Membership and transport for members running in this process
#[derive(Default)]
pub struct LocalCluster {
    members: RwLock<BTreeMap<MemberId, Slot>>,
}

impl LocalCluster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a member
    pub fn add_member(&self, member_id: impl Into<MemberId>, provider: Arc<dyn LocalStatsProvider>) {
        let member_id = member_id.into();
        let node = Arc::new(MemberNode::new(member_id.clone(), provider));
        self.members
            .write()
            .insert(member_id.clone(), Slot { node, attached: true });
        info!("Local member {} added", member_id);
    }

    /// Remove a member entirely
    pub fn remove_member(&self, member_id: &MemberId) -> bool {
        self.members.write().remove(member_id).is_some()
    }

    /// Keep a member listed but make it unreachable
    pub fn detach(&self, member_id: &MemberId) -> bool {
        self.set_attached(member_id, false)
    }

    /// Make a detached member reachable again
    pub fn attach(&self, member_id: &MemberId) -> bool {
        self.set_attached(member_id, true)
    }

    fn set_attached(&self, member_id: &MemberId, attached: bool) -> bool {
        match self.members.write().get_mut(member_id) {
            Some(slot) => {
                slot.attached = attached;
                true
            }
            None => false,
        }
    }

    /// Number of listed members, attached or not
    pub fn len(&self) -> usize {
        self.members.read().len()
    }

    /// True when no member is listed
    pub fn is_empty(&self) -> bool {
        self.members.read().is_empty()
    }
}

#[async_trait]
impl MemberDirectory for LocalCluster {
    async fn list_members(&self) -> BTreeSet<MemberId> {
        self.members.read().keys().cloned().collect()
    }
}

#[async_trait]
impl MemberTransport for LocalCluster {
    async fn send(&self, member_id: &MemberId, request: Bytes) -> Result<Bytes, TransportError> {
        let node = match self.members.read().get(member_id) {
            Some(slot) if slot.attached => slot.node.clone(),
            _ => {
                return Err(TransportError::Unreachable {
                    member_id: member_id.to_string(),
                })
            }
        };
        Ok(node.handle(&request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::member::StatsRecorder;
    use crate::protocol::{decode_response, encode_request, NodeResponse, NodeStatsRequest};
    use std::time::Duration;
    use uuid::Uuid;

    fn request() -> Bytes {
        encode_request(&NodeStatsRequest::new(Uuid::new_v4(), Duration::from_secs(1))).unwrap()
    }

    #[tokio::test]
    async fn test_routes_to_attached_members() {
        let cluster = LocalCluster::new();
        cluster.add_member("n1", Arc::new(StatsRecorder::new()));
        cluster.add_member("n2", Arc::new(StatsRecorder::new()));
        assert_eq!(cluster.list_members().await.len(), 2);

        let bytes = cluster.send(&MemberId::new("n1"), request()).await.unwrap();
        assert!(matches!(decode_response(&bytes).unwrap(), NodeResponse::Stats(_)));
    }

    #[tokio::test]
    async fn test_detached_member_is_listed_but_unreachable() {
        let cluster = LocalCluster::new();
        cluster.add_member("n1", Arc::new(StatsRecorder::new()));
        let id = MemberId::new("n1");

        assert!(cluster.detach(&id));
        assert!(cluster.list_members().await.contains(&id));
        assert!(matches!(
            cluster.send(&id, request()).await,
            Err(TransportError::Unreachable { .. })
        ));

        assert!(cluster.attach(&id));
        assert!(cluster.send(&id, request()).await.is_ok());
    }

    #[tokio::test]
    async fn test_unknown_member_unreachable() {
        let cluster = LocalCluster::new();
        assert!(cluster.is_empty());
        assert!(cluster.send(&MemberId::new("ghost"), request()).await.is_err());
        assert!(!cluster.detach(&MemberId::new("ghost")));
    }

    #[tokio::test]
    async fn test_removed_member_is_unlisted() {
        let cluster = LocalCluster::new();
        cluster.add_member("n1", Arc::new(StatsRecorder::new()));
        cluster.add_member("n2", Arc::new(StatsRecorder::new()));
        let id = MemberId::new("n1");

        assert!(cluster.remove_member(&id));
        assert!(!cluster.remove_member(&id));
        assert_eq!(cluster.len(), 1);
        assert!(!cluster.list_members().await.contains(&id));
        assert!(matches!(
            cluster.send(&id, request()).await,
            Err(TransportError::Unreachable { .. })
        ));
    }
}
