//! Ring ownership lookups.
//!
//! The cluster ring assigns each partition an owning node. Buffer vnodes
//! consult it on every timer re-arm; the ring implementation itself
//! (membership, claim transfer) lives outside this crate.

use ccs_core::{NodeId, Partition};
use parking_lot::RwLock;
use std::collections::HashMap;

/// Read access to ring ownership.
pub trait RingService: Send + Sync + 'static {
    /// The node currently owning a partition.
    fn index_owner(&self, partition: Partition) -> Option<NodeId>;

    /// This node's identity.
    fn my_node(&self) -> NodeId;

    /// Whether this node currently owns the partition.
    fn owns(&self, partition: Partition) -> bool {
        self.index_owner(partition)
            .is_some_and(|owner| owner == self.my_node())
    }
}

/// In-memory ring for tests, demos, and single-node setups. Ownership
/// can be reassigned at runtime to exercise handoff behaviour.
pub struct StaticRing {
    me: NodeId,
    owners: RwLock<HashMap<Partition, NodeId>>,
}

impl StaticRing {
    pub fn new(me: NodeId) -> Self {
        Self {
            me,
            owners: RwLock::new(HashMap::new()),
        }
    }

    /// Assign a partition to a node.
    pub fn set_owner(&self, partition: Partition, owner: NodeId) {
        self.owners.write().insert(partition, owner);
    }

    /// Assign a partition to this node.
    pub fn claim(&self, partition: Partition) {
        let me = self.me.clone();
        self.set_owner(partition, me);
    }
}

impl RingService for StaticRing {
    fn index_owner(&self, partition: Partition) -> Option<NodeId> {
        self.owners.read().get(&partition).cloned()
    }

    fn my_node(&self) -> NodeId {
        self.me.clone()
    }
}
