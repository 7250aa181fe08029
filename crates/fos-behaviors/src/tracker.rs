//! Node Tracker
//!
//! Every node that currently has behaviors, in first-seen order. Entries are
//! plain handles; liveness is checked against the [`Dom`](fos_dom::Dom) when
//! the engine sweeps.

use std::collections::HashSet;

use fos_dom::NodeId;

#[derive(Debug, Default)]
pub(crate) struct NodeTracker {
    order: Vec<NodeId>,
    members: HashSet<NodeId>,
}

impl NodeTracker {
    /// Returns true if the node was not tracked yet
    pub fn track(&mut self, node: NodeId) -> bool {
        if !self.members.insert(node) {
            return false;
        }
        self.order.push(node);
        true
    }

    pub fn untrack(&mut self, node: NodeId) -> bool {
        if !self.members.remove(&node) {
            return false;
        }
        self.order.retain(|&id| id != node);
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.order.iter().copied()
    }

    /// Keep only nodes accepted by `keep`; returns the evicted ones
    pub fn retain(&mut self, mut keep: impl FnMut(NodeId) -> bool) -> Vec<NodeId> {
        let mut evicted = Vec::new();
        self.order.retain(|&id| {
            let kept = keep(id);
            if !kept {
                evicted.push(id);
            }
            kept
        });
        for id in &evicted {
            self.members.remove(id);
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(index: u32) -> NodeId {
        NodeId::from_raw_parts(index, 0)
    }

    #[test]
    fn test_track_keeps_first_seen_order() {
        let mut tracker = NodeTracker::default();
        assert!(tracker.track(id(3)));
        assert!(tracker.track(id(1)));
        assert!(!tracker.track(id(3)));
        assert_eq!(tracker.iter().collect::<Vec<_>>(), vec![id(3), id(1)]);
    }

    #[test]
    fn test_retain_reports_evicted() {
        let mut tracker = NodeTracker::default();
        for i in 0..4 {
            tracker.track(id(i));
        }
        let evicted = tracker.retain(|node| node.index() % 2 == 0);
        assert_eq!(evicted, vec![id(1), id(3)]);
        assert_eq!(tracker.len(), 2);
        assert_eq!(tracker.iter().collect::<Vec<_>>(), vec![id(0), id(2)]);
        assert!(tracker.untrack(id(0)));
        assert!(!tracker.untrack(id(0)));
    }
}
