//! Cluster membership snapshots
//!
//! The coordinator only needs a point-in-time list of member ids.

use std::collections::BTreeSet;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::info;

use crate::stats::MemberId;

/// Source of the current cluster membership
#[async_trait]
pub trait MemberDirectory: Send + Sync + 'static {
    /// Point-in-time snapshot, possibly empty
    async fn list_members(&self) -> BTreeSet<MemberId>;
}

/// Membership held in memory and changed explicitly
pub struct StaticMembership {
    members: RwLock<BTreeSet<MemberId>>,
}

impl StaticMembership {
    /// Create a membership from an initial set of members
    pub fn new<I, M>(members: I) -> Self
    where
        I: IntoIterator<Item = M>,
        M: Into<MemberId>,
    {
        Self {
            members: RwLock::new(members.into_iter().map(Into::into).collect()),
        }
    }

    /// Add a member. Returns false if it was already present.
    pub async fn join(&self, member_id: MemberId) -> bool {
        let added = self.members.write().await.insert(member_id.clone());
        if added {
            info!("Member {} joined", member_id);
        }
        added
    }

    /// Remove a member. Returns false if it was not present.
    pub async fn leave(&self, member_id: &MemberId) -> bool {
        let removed = self.members.write().await.remove(member_id);
        if removed {
            info!("Member {} left", member_id);
        }
        removed
    }

    /// Number of members
    pub async fn len(&self) -> usize {
        self.members.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.members.read().await.is_empty()
    }
}

impl Default for StaticMembership {
    fn default() -> Self {
        Self::new(Vec::<MemberId>::new())
    }
}

#[async_trait]
impl MemberDirectory for StaticMembership {
    async fn list_members(&self) -> BTreeSet<MemberId> {
        self.members.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_join_and_leave() {
        let membership = StaticMembership::new(["a", "b"]);
        assert_eq!(membership.len().await, 2);

        assert!(membership.join(MemberId::new("c")).await);
        assert!(!membership.join(MemberId::new("c")).await);
        assert!(membership.leave(&MemberId::new("a")).await);
        assert!(!membership.leave(&MemberId::new("a")).await);

        let snapshot = membership.list_members().await;
        assert_eq!(
            snapshot,
            BTreeSet::from([MemberId::new("b"), MemberId::new("c")])
        );
    }

    #[tokio::test]
    async fn test_empty_membership() {
        let membership = StaticMembership::default();
        assert!(membership.is_empty().await);
        assert!(membership.list_members().await.is_empty());
    }
}
