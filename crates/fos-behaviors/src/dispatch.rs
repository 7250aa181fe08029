//! Mutation Dispatcher & Attribute Change Dispatcher
//!
//! A batch is processed strictly in record order and to completion.

use fos_dom::{Dom, MutationRecord, MutationType, NodeId};

use crate::behavior::{AttributeChange, BehaviorHandle};
use crate::engine::ElementBehaviors;
use crate::watch::TreeKind;

impl ElementBehaviors {
    pub(crate) fn dispatch(&mut self, dom: &mut Dom, batch: Vec<MutationRecord>) {
        for record in batch {
            match record.mutation_type {
                MutationType::Attributes => {
                    let Some(name) = record.attribute_name.as_deref() else {
                        continue;
                    };
                    tracing::trace!("Attribute \"{}\" changed on {:?}", name, record.target);
                    if name == self.config.attribute {
                        self.apply_behaviors(dom, record.target);
                    } else {
                        self.attribute_changed(dom, record.target, name);
                    }
                }
                MutationType::ChildList => {
                    tracing::trace!(
                        "Children of {:?} changed: +{} -{}",
                        record.target,
                        record.added_nodes.len(),
                        record.removed_nodes.len()
                    );
                    for &node in &record.added_nodes {
                        self.attach_subtree(dom, node);
                    }
                    for &node in &record.removed_nodes {
                        self.detach_subtree(dom, node);
                    }
                }
            }
        }
    }

    /// Call `attribute_changed` on every instance of the node whose class
    /// observes `name`
    pub(crate) fn attribute_changed(&mut self, dom: &mut Dom, node: NodeId, name: &str) {
        let calls: Vec<(String, BehaviorHandle, Option<String>)> = self
            .instances
            .entries(node)
            .iter()
            .filter(|e| e.class.observes(name))
            .map(|e| {
                let old = e.observed_values.get(name).cloned().flatten();
                (e.name.clone(), e.instance.clone(), old)
            })
            .collect();
        if calls.is_empty() {
            return;
        }

        let new_value = dom.attribute(node, name).map(str::to_owned);
        for (behavior, instance, old_value) in calls {
            instance.borrow_mut().attribute_changed(
                dom,
                AttributeChange {
                    name,
                    old_value: old_value.as_deref(),
                    new_value: new_value.as_deref(),
                    node,
                },
            );
            if let Some(entry) = self.instances.get_mut(node, &behavior) {
                entry
                    .observed_values
                    .insert(name.to_string(), new_value.clone());
            }
        }
    }

    /// Apply behaviors to an inserted node and its element descendants,
    /// including the contents of its open shadow root
    pub(crate) fn attach_subtree(&mut self, dom: &mut Dom, node: NodeId) {
        if !dom.is_element(node) {
            return;
        }
        if dom.is_frame(node) {
            self.track_frame(dom, node);
        }
        if let Some(root) = self.shadow_tree_of(dom, node) {
            for child in dom.children(root).to_vec() {
                self.attach_subtree(dom, child);
            }
        }
        self.apply_behaviors(dom, node);
        for child in dom.children(node).to_vec() {
            self.attach_subtree(dom, child);
        }
    }

    /// Disconnect a removed node and its element descendants
    pub(crate) fn detach_subtree(&mut self, dom: &mut Dom, node: NodeId) {
        if !dom.is_element(node) {
            return;
        }
        if dom.is_frame(node) {
            self.untrack_frame(dom, node);
        }
        let shadow = self.observation.borrow().trees.shadow_root_of(node);
        if let Some(root) = shadow {
            for child in dom.children(root).to_vec() {
                self.detach_subtree(dom, child);
            }
        }
        self.disconnect_behaviors(dom, node);
        for child in dom.children(node).to_vec() {
            self.detach_subtree(dom, child);
        }
    }

    /// Apply behaviors to everything under a tree root
    pub(crate) fn scan(&mut self, dom: &mut Dom, root: NodeId) {
        for child in dom.children(root).to_vec() {
            self.attach_subtree(dom, child);
        }
    }

    /// Watched shadow root of `host`. An open root that is not watched yet
    /// (created before its document had the interceptor) is registered.
    fn shadow_tree_of(&mut self, dom: &mut Dom, host: NodeId) -> Option<NodeId> {
        let mut observation = self.observation.borrow_mut();
        if let Some(root) = observation.trees.shadow_root_of(host) {
            return Some(root);
        }
        let root = dom.shadow_root(host)?;
        observation.trees.register(root, TreeKind::Shadow { host });
        tracing::debug!("Discovered shadow root {:?} of {:?}", root, host);
        observation.request_restart(dom.observers_mut());
        Some(root)
    }
}
