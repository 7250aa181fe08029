//! DOM Node Operations
//!
//! Core node manipulation: appendChild, insertBefore, removeChild,
//! adoptNode, textContent and subtree destruction.
//!
//! Inserting a node under a parent owned by another document adopts the
//! node's whole shadow-including subtree first, the way browsers do.

use crate::node::{Node, NodeData};
use crate::observer::MutationRecord;
use crate::{Dom, NodeId};

/// Result type for DOM operations
pub type DomResult<T> = Result<T, DomError>;

/// DOM operation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    #[error("Node not found")]
    NotFound,

    #[error("Hierarchy request error")]
    HierarchyRequest,

    #[error("Node is not a child")]
    NotAChild,

    #[error("Invalid node type")]
    InvalidNodeType,

    #[error("Element already has a shadow root")]
    ShadowAlreadyAttached,

    #[error("Element does not support shadow root")]
    ShadowNotSupported,

    #[error("Element is not a frame container")]
    NotAFrame,

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl Dom {
    /// Append a child node
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<NodeId> {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` before `reference` (or at the end when `None`)
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> DomResult<NodeId> {
        self.validate_insertion(parent, child)?;
        if let Some(reference) = reference {
            if self.node(reference)?.parent != Some(parent) {
                return Err(DomError::NotAChild);
            }
        }

        // Moving within the same parent must not shift the reference index
        if reference == Some(child) {
            return Ok(child);
        }

        self.detach(child);

        let target_document = self.node(parent)?.owner_document;
        if self.node(child)?.owner_document != target_document {
            self.adopt_subtree(child, target_document);
        }

        let parent_node = self.node_mut(parent)?;
        let index = match reference {
            Some(reference) => parent_node
                .children
                .iter()
                .position(|&id| id == reference)
                .ok_or(DomError::NotAChild)?,
            None => parent_node.children.len(),
        };
        parent_node.children.insert(index, child);
        self.node_mut(child)?.parent = Some(parent);

        self.queue_mutation(MutationRecord::child_list(parent, vec![child], Vec::new()));
        Ok(child)
    }

    /// Remove a child node
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<NodeId> {
        if self.node(child)?.parent != Some(parent) {
            return Err(DomError::NotAChild);
        }
        self.detach(child);
        Ok(child)
    }

    /// Detach a node from its parent, if it has one
    pub fn remove(&mut self, node: NodeId) -> DomResult<()> {
        self.node(node)?;
        self.detach(node);
        Ok(())
    }

    /// Detach `node` and move its subtree into `document`
    pub fn adopt_node(&mut self, document: NodeId, node: NodeId) -> DomResult<NodeId> {
        if !self.is_document(document) {
            return Err(DomError::InvalidNodeType);
        }
        match self.node(node)?.data {
            NodeData::Document(_) => return Err(DomError::InvalidNodeType),
            NodeData::ShadowRoot(_) => return Err(DomError::HierarchyRequest),
            _ => {}
        }
        self.detach(node);
        if self.node(node)?.owner_document != document {
            self.adopt_subtree(node, document);
        }
        Ok(node)
    }

    /// Concatenated text of all light-tree descendants
    pub fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        if let Some(text) = self.get(node).and_then(Node::as_text) {
            out.push_str(text);
        }
        for id in self.descendants(node) {
            if let Some(text) = self.get(id).and_then(Node::as_text) {
                out.push_str(text);
            }
        }
        out
    }

    /// Replace all children with a single text node
    pub fn set_text_content(&mut self, node: NodeId, text: &str) -> DomResult<()> {
        if !self.node(node)?.is_container() {
            return Err(DomError::InvalidNodeType);
        }
        let document = self.node(node)?.owner_document;
        let removed = std::mem::take(&mut self.node_mut(node)?.children);
        for &child in &removed {
            if let Some(child) = self.get_mut(child) {
                child.parent = None;
            }
        }

        let mut added = Vec::new();
        if !text.is_empty() {
            let text_node = self.create_text(document, text)?;
            self.node_mut(text_node)?.parent = Some(node);
            self.node_mut(node)?.children.push(text_node);
            added.push(text_node);
        }

        if !added.is_empty() || !removed.is_empty() {
            self.queue_mutation(MutationRecord::child_list(node, added, removed));
        }
        Ok(())
    }

    /// Free a detached subtree. Every id inside it goes stale, including
    /// the contents of shadow roots and frame documents it hosts.
    pub fn destroy(&mut self, node: NodeId) -> DomResult<()> {
        let root = self.node(node)?;
        if root.parent.is_some() || node == self.main_document() {
            return Err(DomError::HierarchyRequest);
        }
        if matches!(root.data, NodeData::ShadowRoot(_)) {
            return Err(DomError::HierarchyRequest);
        }

        let mut stack = vec![node];
        let mut freed = 0usize;
        while let Some(id) = stack.pop() {
            let Some(removed) = self.free(id) else {
                continue;
            };
            freed += 1;
            self.listeners.remove_node(id);
            self.shadow_hooks.remove(&id);
            stack.extend(removed.children.iter().copied());
            if let NodeData::Element(elem) = &removed.data {
                stack.extend(elem.shadow_root);
                stack.extend(elem.frame.as_ref().map(|f| f.document));
            }
        }
        tracing::trace!("Destroyed {} nodes under {:?}", freed, node);
        Ok(())
    }

    fn validate_insertion(&self, parent: NodeId, child: NodeId) -> DomResult<()> {
        if !self.node(parent)?.is_container() {
            return Err(DomError::HierarchyRequest);
        }
        match self.node(child)?.data {
            NodeData::Element(_) | NodeData::Text(_) => {}
            _ => return Err(DomError::HierarchyRequest),
        }
        if self.is_inclusive_ancestor(child, parent) {
            return Err(DomError::HierarchyRequest);
        }
        Ok(())
    }

    /// Unlink from the current parent and queue the removal record
    fn detach(&mut self, child: NodeId) -> Option<NodeId> {
        let parent = self.get(child)?.parent?;
        let siblings = &mut self.get_mut(parent)?.children;
        let pos = siblings.iter().position(|&id| id == child)?;
        siblings.remove(pos);
        self.get_mut(child)?.parent = None;

        self.queue_mutation(MutationRecord::child_list(parent, Vec::new(), vec![child]));
        Some(parent)
    }

    /// Rewrite the owner document of a shadow-including subtree
    fn adopt_subtree(&mut self, node: NodeId, document: NodeId) {
        tracing::debug!("Adopting {:?} into document {:?}", node, document);
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            let Some(current) = self.get_mut(id) else {
                continue;
            };
            current.owner_document = document;
            stack.extend(current.children.iter().copied());
            if let NodeData::Element(elem) = &current.data {
                stack.extend(elem.shadow_root);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dom() -> Dom {
        Dom::new("https://example.com/").unwrap()
    }

    #[test]
    fn test_append_and_remove() {
        let mut dom = dom();
        let main = dom.main_document();
        let body = dom.body(main).unwrap();
        let p1 = dom.create_element(main, "p").unwrap();
        let p2 = dom.create_element(main, "p").unwrap();
        let p3 = dom.create_element(main, "p").unwrap();

        dom.append_child(body, p1).unwrap();
        dom.append_child(body, p3).unwrap();
        dom.insert_before(body, p2, Some(p3)).unwrap();
        assert_eq!(dom.children(body), &[p1, p2, p3]);

        dom.remove_child(body, p2).unwrap();
        assert_eq!(dom.children(body), &[p1, p3]);
        assert_eq!(dom.parent(p2), None);
        assert_eq!(dom.remove_child(body, p2), Err(DomError::NotAChild));
    }

    #[test]
    fn test_cannot_insert_ancestor() {
        let mut dom = dom();
        let main = dom.main_document();
        let outer = dom.create_element(main, "div").unwrap();
        let inner = dom.create_element(main, "div").unwrap();
        dom.append_child(outer, inner).unwrap();

        assert_eq!(dom.append_child(inner, outer), Err(DomError::HierarchyRequest));
        assert_eq!(dom.append_child(outer, outer), Err(DomError::HierarchyRequest));
    }

    #[test]
    fn test_cross_document_insert_adopts_subtree() {
        let mut dom = dom();
        let main = dom.main_document();
        let other = dom.create_document("https://example.com/other").unwrap();
        let other_body = dom.body(other).unwrap();

        let div = dom.create_element(main, "div").unwrap();
        let span = dom.create_element(main, "span").unwrap();
        dom.append_child(div, span).unwrap();
        let root = dom.attach_shadow(div, crate::ShadowRootInit::open()).unwrap();
        let shadow_child = dom.create_element(main, "b").unwrap();
        dom.append_child(root, shadow_child).unwrap();

        dom.append_child(other_body, div).unwrap();

        assert_eq!(dom.owner_document(div), Some(other));
        assert_eq!(dom.owner_document(span), Some(other));
        assert_eq!(dom.owner_document(root), Some(other));
        assert_eq!(dom.owner_document(shadow_child), Some(other));
    }

    #[test]
    fn test_adopt_node_detaches() {
        let mut dom = dom();
        let main = dom.main_document();
        let body = dom.body(main).unwrap();
        let other = dom.create_document("https://example.com/other").unwrap();
        let div = dom.create_element(main, "div").unwrap();
        dom.append_child(body, div).unwrap();

        dom.adopt_node(other, div).unwrap();
        assert_eq!(dom.parent(div), None);
        assert_eq!(dom.owner_document(div), Some(other));
        assert_eq!(dom.adopt_node(other, main), Err(DomError::InvalidNodeType));
    }

    #[test]
    fn test_text_content_roundtrip() {
        let mut dom = dom();
        let main = dom.main_document();
        let div = dom.create_element(main, "div").unwrap();
        let old = dom.create_element(main, "span").unwrap();
        dom.append_child(div, old).unwrap();

        dom.set_text_content(div, "Count: 3").unwrap();
        assert_eq!(dom.text_content(div), "Count: 3");
        assert_eq!(dom.parent(old), None);
        assert_eq!(dom.children(div).len(), 1);
    }

    #[test]
    fn test_destroy_requires_detached_node() {
        let mut dom = dom();
        let main = dom.main_document();
        let body = dom.body(main).unwrap();
        let div = dom.create_element(main, "div").unwrap();
        let child = dom.create_element(main, "span").unwrap();
        dom.append_child(div, child).unwrap();
        dom.append_child(body, div).unwrap();

        assert_eq!(dom.destroy(div), Err(DomError::HierarchyRequest));
        dom.remove(div).unwrap();
        dom.destroy(div).unwrap();
        assert!(!dom.contains(div));
        assert!(!dom.contains(child));
        assert_eq!(dom.destroy(main), Err(DomError::HierarchyRequest));
    }
}
