//! Tree traversal
//!
//! Preorder walk over the light tree below a node. Shadow roots and frame
//! documents are separate trees and are not entered.

use crate::node::NodeType;
use crate::{Dom, NodeId};

/// Preorder iterator over the descendants of a node (the node itself is
/// not yielded)
pub struct Descendants<'a> {
    dom: &'a Dom,
    stack: Vec<NodeId>,
}

impl<'a> Descendants<'a> {
    fn new(dom: &'a Dom, root: NodeId) -> Self {
        let stack = dom.children(root).iter().rev().copied().collect();
        Self { dom, stack }
    }

    /// Keep only elements
    pub fn elements(self) -> impl Iterator<Item = NodeId> + 'a {
        let dom = self.dom;
        self.filter(move |&id| dom.node_type(id) == Some(NodeType::Element))
    }
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let next = self.stack.pop()?;
        self.stack
            .extend(self.dom.children(next).iter().rev().copied());
        Some(next)
    }
}

impl Dom {
    /// Light-tree descendants of `node` in document order
    pub fn descendants(&self, node: NodeId) -> Descendants<'_> {
        Descendants::new(self, node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ShadowRootInit;

    #[test]
    fn test_preorder() {
        let mut dom = Dom::new("https://example.com/").unwrap();
        let main = dom.main_document();
        let root = dom.create_element(main, "div").unwrap();
        let a = dom.create_element(main, "a").unwrap();
        let a1 = dom.create_element(main, "i").unwrap();
        let b = dom.create_element(main, "b").unwrap();
        let text = dom.create_text(main, "x").unwrap();
        dom.append_child(root, a).unwrap();
        dom.append_child(a, a1).unwrap();
        dom.append_child(root, b).unwrap();
        dom.append_child(b, text).unwrap();

        let all: Vec<_> = dom.descendants(root).collect();
        assert_eq!(all, vec![a, a1, b, text]);
        let elements: Vec<_> = dom.descendants(root).elements().collect();
        assert_eq!(elements, vec![a, a1, b]);
    }

    #[test]
    fn test_does_not_enter_shadow_root() {
        let mut dom = Dom::new("https://example.com/").unwrap();
        let main = dom.main_document();
        let host = dom.create_element(main, "div").unwrap();
        let shadow = dom.attach_shadow(host, ShadowRootInit::open()).unwrap();
        let inner = dom.create_element(main, "p").unwrap();
        dom.append_child(shadow, inner).unwrap();

        assert_eq!(dom.descendants(host).count(), 0);
        assert_eq!(dom.descendants(shadow).collect::<Vec<_>>(), vec![inner]);
    }
}
