//! Instance Store
//!
//! Per-node behavior instances keyed by lower-cased name. An entry outlives
//! disconnects and is only dropped by explicit removal or eviction.

use std::collections::HashMap;

use fos_dom::NodeId;

use crate::behavior::{BehaviorClass, BehaviorHandle};

pub(crate) struct BehaviorEntry {
    pub name: String,
    pub class: BehaviorClass,
    pub instance: BehaviorHandle,
    /// True iff `connected` ran more recently than `disconnected`
    pub connected: bool,
    /// Last value shown to the instance for each observed attribute
    pub observed_values: HashMap<String, Option<String>>,
}

#[derive(Default)]
pub(crate) struct InstanceStore {
    by_node: HashMap<NodeId, Vec<BehaviorEntry>>,
}

impl InstanceStore {
    pub fn entries(&self, node: NodeId) -> &[BehaviorEntry] {
        self.by_node.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn entries_mut(&mut self, node: NodeId) -> &mut [BehaviorEntry] {
        self.by_node
            .get_mut(&node)
            .map(Vec::as_mut_slice)
            .unwrap_or(&mut [])
    }

    pub fn get(&self, node: NodeId, name: &str) -> Option<&BehaviorEntry> {
        self.entries(node).iter().find(|e| e.name == name)
    }

    pub fn get_mut(&mut self, node: NodeId, name: &str) -> Option<&mut BehaviorEntry> {
        self.by_node
            .get_mut(&node)?
            .iter_mut()
            .find(|e| e.name == name)
    }

    pub fn insert(&mut self, node: NodeId, entry: BehaviorEntry) {
        let entries = self.by_node.entry(node).or_default();
        entries.retain(|e| e.name != entry.name);
        entries.push(entry);
    }

    /// Drop one instance; returns it so the caller can still run hooks
    pub fn remove(&mut self, node: NodeId, name: &str) -> Option<BehaviorEntry> {
        let entries = self.by_node.get_mut(&node)?;
        let pos = entries.iter().position(|e| e.name == name)?;
        let entry = entries.remove(pos);
        if entries.is_empty() {
            self.by_node.remove(&node);
        }
        Some(entry)
    }

    pub fn remove_node(&mut self, node: NodeId) -> Vec<BehaviorEntry> {
        self.by_node.remove(&node).unwrap_or_default()
    }

    pub fn has_any(&self, node: NodeId) -> bool {
        self.by_node.contains_key(&node)
    }

    /// Nodes holding an instance of `name`
    pub fn nodes_with(&self, name: &str) -> Vec<NodeId> {
        self.by_node
            .iter()
            .filter(|(_, entries)| entries.iter().any(|e| e.name == name))
            .map(|(&node, _)| node)
            .collect()
    }

    pub fn nodes(&self) -> Vec<NodeId> {
        self.by_node.keys().copied().collect()
    }
}
