//! Owning-Tree Record
//!
//! Last document each node was resynced in. Only used to detect adoption.

use std::collections::HashMap;

use fos_dom::NodeId;

#[derive(Debug, Default)]
pub(crate) struct OwnerRecord {
    owners: HashMap<NodeId, NodeId>,
}

impl OwnerRecord {
    /// Record `current` as the node's owner. Returns true when a different
    /// owner was recorded before (the node was adopted).
    pub fn update(&mut self, node: NodeId, current: NodeId) -> bool {
        match self.owners.insert(node, current) {
            Some(previous) => previous != current,
            None => false,
        }
    }

    pub fn get(&self, node: NodeId) -> Option<NodeId> {
        self.owners.get(&node).copied()
    }

    pub fn remove(&mut self, node: NodeId) {
        self.owners.remove(&node);
    }

    pub fn retain(&mut self, mut keep: impl FnMut(NodeId) -> bool) {
        self.owners.retain(|&node, _| keep(node));
    }
}
