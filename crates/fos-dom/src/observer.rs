//! Mutation Observer API
//!
//! Observe DOM changes. Records are queued on every matching observer and
//! sit there until the owner drains them with `take_records`.

use crate::NodeId;
use std::collections::HashMap;

/// Observer handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u32);

/// Mutation type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationType {
    Attributes,
    ChildList,
}

/// Mutation record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    pub mutation_type: MutationType,
    pub target: NodeId,
    pub added_nodes: Vec<NodeId>,
    pub removed_nodes: Vec<NodeId>,
    pub attribute_name: Option<String>,
    pub old_value: Option<String>,
}

impl MutationRecord {
    pub fn child_list(target: NodeId, added: Vec<NodeId>, removed: Vec<NodeId>) -> Self {
        Self {
            mutation_type: MutationType::ChildList,
            target,
            added_nodes: added,
            removed_nodes: removed,
            attribute_name: None,
            old_value: None,
        }
    }

    pub fn attribute(target: NodeId, name: impl Into<String>, old_value: Option<String>) -> Self {
        Self {
            mutation_type: MutationType::Attributes,
            target,
            added_nodes: Vec::new(),
            removed_nodes: Vec::new(),
            attribute_name: Some(name.into()),
            old_value,
        }
    }
}

/// Mutation observer options
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationObserverInit {
    pub child_list: bool,
    pub attributes: bool,
    pub subtree: bool,
    pub attribute_old_value: bool,
    pub attribute_filter: Option<Vec<String>>,
}

impl MutationObserverInit {
    /// Attribute records are wanted, explicitly or through a filter/old value
    fn wants_attributes(&self) -> bool {
        self.attributes || self.attribute_old_value || self.attribute_filter.is_some()
    }

    fn accepts(&self, record: &MutationRecord) -> bool {
        match record.mutation_type {
            MutationType::ChildList => self.child_list,
            MutationType::Attributes => {
                if !self.wants_attributes() {
                    return false;
                }
                match (&self.attribute_filter, &record.attribute_name) {
                    (Some(filter), Some(name)) => filter.iter().any(|f| f == name),
                    _ => true,
                }
            }
        }
    }
}

/// Mutation observer
#[derive(Debug)]
struct MutationObserver {
    id: ObserverId,
    observations: HashMap<NodeId, MutationObserverInit>,
    pending_records: Vec<MutationRecord>,
}

impl MutationObserver {
    fn matching_options(
        &self,
        record: &MutationRecord,
        ancestors: &[NodeId],
    ) -> Option<&MutationObserverInit> {
        ancestors.iter().enumerate().find_map(|(depth, node)| {
            let options = self.observations.get(node)?;
            let in_scope = depth == 0 || options.subtree;
            (in_scope && options.accepts(record)).then_some(options)
        })
    }

    fn record(&mut self, mutation: &MutationRecord, ancestors: &[NodeId]) {
        let Some(options) = self.matching_options(mutation, ancestors) else {
            return;
        };
        let mut record = mutation.clone();
        if record.mutation_type == MutationType::Attributes && !options.attribute_old_value {
            record.old_value = None;
        }
        self.pending_records.push(record);
    }
}

/// Mutation observer manager
#[derive(Debug, Default)]
pub struct MutationObserverManager {
    observers: Vec<MutationObserver>,
    next_id: u32,
}

impl MutationObserverManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create observer
    pub fn create(&mut self) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.observers.push(MutationObserver {
            id,
            observations: HashMap::new(),
            pending_records: Vec::new(),
        });
        id
    }

    fn get(&mut self, id: ObserverId) -> Option<&mut MutationObserver> {
        self.observers.iter_mut().find(|o| o.id == id)
    }

    /// Observe a target. Observing the same target again replaces its options.
    pub fn observe(&mut self, id: ObserverId, target: NodeId, options: MutationObserverInit) {
        if let Some(observer) = self.get(id) {
            observer.observations.insert(target, options);
        }
    }

    /// Stop observing everything and drop pending records
    pub fn disconnect(&mut self, id: ObserverId) {
        if let Some(observer) = self.get(id) {
            observer.observations.clear();
            observer.pending_records.clear();
        }
    }

    /// Take pending records
    pub fn take_records(&mut self, id: ObserverId) -> Vec<MutationRecord> {
        self.get(id)
            .map(|o| std::mem::take(&mut o.pending_records))
            .unwrap_or_default()
    }

    /// Has pending records
    pub fn has_pending(&self, id: ObserverId) -> bool {
        self.observers
            .iter()
            .any(|o| o.id == id && !o.pending_records.is_empty())
    }

    /// Check if observing node
    pub fn is_observing(&self, id: ObserverId, node: NodeId) -> bool {
        self.observers
            .iter()
            .any(|o| o.id == id && o.observations.contains_key(&node))
    }

    /// Remove observer
    pub fn remove(&mut self, id: ObserverId) {
        self.observers.retain(|o| o.id != id);
    }

    /// No observer has a registration
    pub fn is_empty(&self) -> bool {
        self.observers.iter().all(|o| o.observations.is_empty())
    }

    /// Queue `record` on every observer registered on the target, or on one
    /// of its `ancestors` with `subtree`. `ancestors` starts at the target.
    pub(crate) fn notify(&mut self, record: &MutationRecord, ancestors: &[NodeId]) {
        for observer in &mut self.observers {
            observer.record(record, ancestors);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(index: u32) -> NodeId {
        NodeId::from_raw_parts(index, 0)
    }

    #[test]
    fn test_subtree_reaches_descendants() {
        let mut manager = MutationObserverManager::new();
        let observer = manager.create();
        manager.observe(
            observer,
            id(0),
            MutationObserverInit {
                child_list: true,
                subtree: true,
                ..Default::default()
            },
        );

        let record = MutationRecord::child_list(id(2), vec![id(3)], vec![]);
        manager.notify(&record, &[id(2), id(1), id(0)]);
        assert!(manager.has_pending(observer));
        assert_eq!(manager.take_records(observer).len(), 1);
        assert!(!manager.has_pending(observer));
    }

    #[test]
    fn test_without_subtree_only_target() {
        let mut manager = MutationObserverManager::new();
        let observer = manager.create();
        manager.observe(
            observer,
            id(0),
            MutationObserverInit {
                child_list: true,
                ..Default::default()
            },
        );

        let record = MutationRecord::child_list(id(1), vec![id(2)], vec![]);
        manager.notify(&record, &[id(1), id(0)]);
        assert!(!manager.has_pending(observer));
    }

    #[test]
    fn test_attribute_filter_and_old_value() {
        let mut manager = MutationObserverManager::new();
        let observer = manager.create();
        manager.observe(
            observer,
            id(5),
            MutationObserverInit {
                attribute_old_value: true,
                attribute_filter: Some(vec!["count".into()]),
                ..Default::default()
            },
        );

        manager.notify(&MutationRecord::attribute(id(5), "title", None), &[id(5)]);
        manager.notify(&MutationRecord::attribute(id(5), "count", Some("1".into())), &[id(5)]);

        let records = manager.take_records(observer);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].old_value.as_deref(), Some("1"));
    }

    #[test]
    fn test_old_value_stripped_unless_requested() {
        let mut manager = MutationObserverManager::new();
        let observer = manager.create();
        manager.observe(
            observer,
            id(0),
            MutationObserverInit {
                attributes: true,
                ..Default::default()
            },
        );

        manager.notify(&MutationRecord::attribute(id(0), "has", Some("a".into())), &[id(0)]);
        assert_eq!(manager.take_records(observer)[0].old_value, None);
    }

    #[test]
    fn test_record_queued_once_per_observer() {
        let mut manager = MutationObserverManager::new();
        let observer = manager.create();
        let options = MutationObserverInit {
            attributes: true,
            subtree: true,
            ..Default::default()
        };
        manager.observe(observer, id(0), options.clone());
        manager.observe(observer, id(1), options);

        manager.notify(&MutationRecord::attribute(id(1), "has", None), &[id(1), id(0)]);
        assert_eq!(manager.take_records(observer).len(), 1);
    }

    #[test]
    fn test_disconnect_drops_pending() {
        let mut manager = MutationObserverManager::new();
        let observer = manager.create();
        manager.observe(
            observer,
            id(0),
            MutationObserverInit {
                attributes: true,
                ..Default::default()
            },
        );
        manager.notify(&MutationRecord::attribute(id(0), "x", None), &[id(0)]);

        manager.disconnect(observer);
        assert!(!manager.has_pending(observer));
        assert!(!manager.is_observing(observer, id(0)));
        assert!(manager.is_empty());
    }
}
