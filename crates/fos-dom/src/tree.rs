//! DOM Tree (generational arena)
//!
//! One arena holds every document of a page. Freed slots bump their
//! generation so stale [`NodeId`]s never resolve to a reused node.

use std::collections::HashMap;
use std::rc::Rc;

use crate::dom_events::EventListeners;
use crate::node::{Node, NodeData, NodeType};
use crate::observer::{MutationObserverManager, MutationRecord};
use crate::operations::{DomError, DomResult};
use crate::shadow::AttachShadowHook;
use crate::NodeId;

#[derive(Debug)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// Arena-based DOM shared by the main document, frames and shadow roots
pub struct Dom {
    slots: Vec<Slot>,
    free_list: Vec<u32>,
    main_document: NodeId,
    pub(crate) observers: MutationObserverManager,
    pub(crate) listeners: EventListeners,
    /// Subtree-creation hooks keyed by the document whose context they run in
    pub(crate) shadow_hooks: HashMap<NodeId, Vec<Rc<dyn AttachShadowHook>>>,
}

impl Dom {
    /// Create a DOM whose main document is loaded from `url`
    pub fn new(url: &str) -> DomResult<Self> {
        let mut dom = Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            main_document: NodeId::from_raw_parts(0, 0),
            observers: MutationObserverManager::new(),
            listeners: EventListeners::default(),
            shadow_hooks: HashMap::new(),
        };
        let main = dom.create_document(url)?;
        dom.finish_loading(main)?;
        dom.main_document = main;
        tracing::debug!("Created DOM for {}", url);
        Ok(dom)
    }

    /// The top-level document
    #[inline]
    pub fn main_document(&self) -> NodeId {
        self.main_document
    }

    pub(crate) fn alloc(&mut self, node: Node) -> NodeId {
        if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            NodeId::from_raw_parts(index, slot.generation)
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                node: Some(node),
            });
            NodeId::from_raw_parts(index, 0)
        }
    }

    pub(crate) fn free(&mut self, id: NodeId) -> Option<Node> {
        let slot = self.slots.get_mut(id.index() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        let node = slot.node.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(id.index());
        Some(node)
    }

    /// Get a node by ID (None once the node was destroyed)
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.index() as usize)
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.node.as_ref())
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.index() as usize)
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.node.as_mut())
    }

    pub(crate) fn node(&self, id: NodeId) -> DomResult<&Node> {
        self.get(id).ok_or(DomError::NotFound)
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> DomResult<&mut Node> {
        self.get_mut(id).ok_or(DomError::NotFound)
    }

    /// Whether `id` still refers to a live node
    #[inline]
    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.slots.len() - self.free_list.len()
    }

    /// Check if the arena holds no nodes
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // --- Queries ---

    /// Node kind
    pub fn node_type(&self, id: NodeId) -> Option<NodeType> {
        self.get(id).map(Node::node_type)
    }

    /// Check if a node is a live element
    pub fn is_element(&self, id: NodeId) -> bool {
        self.get(id).is_some_and(Node::is_element)
    }

    /// Check if a node is a live document
    pub fn is_document(&self, id: NodeId) -> bool {
        self.node_type(id) == Some(NodeType::Document)
    }

    /// Lower-cased tag name of an element
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.get(id)?.as_element().map(|e| e.tag.as_str())
    }

    /// Parent node
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.parent
    }

    /// Children in tree order (empty for missing nodes)
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Document owning a node; a document owns itself
    pub fn owner_document(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).map(|n| n.owner_document)
    }

    /// Root of the tree containing `id`: a document, a shadow root, or the
    /// top of a detached subtree
    pub fn root(&self, id: NodeId) -> Option<NodeId> {
        let mut current = id;
        let mut node = self.get(current)?;
        while let Some(parent) = node.parent {
            current = parent;
            node = self.get(current)?;
        }
        Some(current)
    }

    /// Whether the node is in a document, looking through shadow hosts
    pub fn is_connected(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            let Some(root) = self.root(current) else {
                return false;
            };
            let Some(node) = self.get(root) else {
                return false;
            };
            match &node.data {
                NodeData::Document(_) => return true,
                NodeData::ShadowRoot(shadow) => current = shadow.host,
                _ => return false,
            }
        }
    }

    /// Node and its parents, nearest first, up to the tree root
    pub(crate) fn inclusive_ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut chain = Vec::new();
        let mut current = Some(id);
        while let Some(node_id) = current {
            let Some(node) = self.get(node_id) else {
                break;
            };
            chain.push(node_id);
            current = node.parent;
        }
        chain
    }

    /// `ancestor` is `id` or one of its shadow-including ancestors
    pub(crate) fn is_inclusive_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node_id) = current {
            if node_id == ancestor {
                return true;
            }
            let Some(node) = self.get(node_id) else {
                return false;
            };
            current = match (&node.data, node.parent) {
                (_, Some(parent)) => Some(parent),
                (NodeData::ShadowRoot(shadow), None) => Some(shadow.host),
                _ => None,
            };
        }
        false
    }

    // --- Attributes ---

    /// Get an attribute value
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        let elem = self.get(id)?.as_element()?;
        if name.bytes().any(|b| b.is_ascii_uppercase()) {
            elem.get_attr(&name.to_ascii_lowercase())
        } else {
            elem.get_attr(name)
        }
    }

    /// Check whether an attribute is present
    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.attribute(id, name).is_some()
    }

    /// Set an attribute and queue an `attributes` mutation
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> DomResult<()> {
        let name = name.to_ascii_lowercase();
        let elem = self
            .node_mut(id)?
            .as_element_mut()
            .ok_or(DomError::InvalidNodeType)?;
        let old_value = elem.set_attr(&name, value);
        self.queue_mutation(MutationRecord::attribute(id, name, old_value));
        Ok(())
    }

    /// Remove an attribute; returns whether it was present
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> DomResult<bool> {
        let name = name.to_ascii_lowercase();
        let elem = self
            .node_mut(id)?
            .as_element_mut()
            .ok_or(DomError::InvalidNodeType)?;
        match elem.remove_attr(&name) {
            Some(old_value) => {
                self.queue_mutation(MutationRecord::attribute(id, name, Some(old_value)));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    // --- Mutation observers ---

    /// Mutation observer registry
    pub fn observers(&self) -> &MutationObserverManager {
        &self.observers
    }

    /// Mutation observer registry (mutable)
    pub fn observers_mut(&mut self) -> &mut MutationObserverManager {
        &mut self.observers
    }

    pub(crate) fn queue_mutation(&mut self, record: MutationRecord) {
        if self.observers.is_empty() {
            return;
        }
        let ancestors = self.inclusive_ancestors(record.target);
        self.observers.notify(&record, &ancestors);
    }
}

impl std::fmt::Debug for Dom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dom")
            .field("nodes", &self.len())
            .field("main_document", &self.main_document)
            .field("observers", &self.observers)
            .finish_non_exhaustive()
    }
}
