//! DOM Node
//!
//! Nodes keep their children inline and a back pointer to their parent.
//! Every node also remembers the document that owns it; a shadow root's
//! owner is its host's document and a document owns itself.

use crate::document::DocumentData;
use crate::frame::FrameContent;
use crate::shadow::ShadowRootData;
use crate::NodeId;

/// DOM Node - Core structure
#[derive(Debug)]
pub struct Node {
    /// Parent node (None for tree roots and detached nodes)
    pub(crate) parent: Option<NodeId>,
    /// Children in tree order
    pub(crate) children: Vec<NodeId>,
    /// Document this node belongs to
    pub(crate) owner_document: NodeId,
    /// Node-specific data
    pub(crate) data: NodeData,
}

impl Node {
    pub(crate) fn new(owner_document: NodeId, data: NodeData) -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            owner_document,
            data,
        }
    }

    /// Parent node
    #[inline]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in tree order
    #[inline]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Node-specific data
    #[inline]
    pub fn data(&self) -> &NodeData {
        &self.data
    }

    /// Node kind
    pub fn node_type(&self) -> NodeType {
        match self.data {
            NodeData::Document(_) => NodeType::Document,
            NodeData::Element(_) => NodeType::Element,
            NodeData::Text(_) => NodeType::Text,
            NodeData::ShadowRoot(_) => NodeType::ShadowRoot,
        }
    }

    /// Check if this is an element
    #[inline]
    pub fn is_element(&self) -> bool {
        matches!(self.data, NodeData::Element(_))
    }

    /// Get element data if this is an element
    #[inline]
    pub fn as_element(&self) -> Option<&ElementData> {
        match &self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Get mutable element data
    #[inline]
    pub(crate) fn as_element_mut(&mut self) -> Option<&mut ElementData> {
        match &mut self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Get text content if this is a text node
    #[inline]
    pub fn as_text(&self) -> Option<&str> {
        match &self.data {
            NodeData::Text(t) => Some(t),
            _ => None,
        }
    }

    #[inline]
    pub(crate) fn as_document(&self) -> Option<&DocumentData> {
        match &self.data {
            NodeData::Document(d) => Some(d),
            _ => None,
        }
    }

    #[inline]
    pub(crate) fn as_document_mut(&mut self) -> Option<&mut DocumentData> {
        match &mut self.data {
            NodeData::Document(d) => Some(d),
            _ => None,
        }
    }

    #[inline]
    pub(crate) fn as_shadow_root(&self) -> Option<&ShadowRootData> {
        match &self.data {
            NodeData::ShadowRoot(s) => Some(s),
            _ => None,
        }
    }

    /// Whether this node may have children
    pub(crate) fn is_container(&self) -> bool {
        !matches!(self.data, NodeData::Text(_))
    }
}

/// Node kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Document,
    Element,
    Text,
    ShadowRoot,
}

/// Node-specific data
#[derive(Debug)]
pub enum NodeData {
    /// Document root
    Document(DocumentData),
    /// Element
    Element(ElementData),
    /// Text content
    Text(String),
    /// Isolated subtree root attached to a host element
    ShadowRoot(ShadowRootData),
}

/// Element-specific data
#[derive(Debug)]
pub struct ElementData {
    /// Lower-cased tag name
    pub(crate) tag: String,
    /// Attributes in insertion order
    pub(crate) attrs: Vec<Attribute>,
    /// Attached shadow root, whatever its mode
    pub(crate) shadow_root: Option<NodeId>,
    /// Embedded document for frame containers
    pub(crate) frame: Option<FrameContent>,
}

impl ElementData {
    pub(crate) fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
            shadow_root: None,
            frame: None,
        }
    }

    /// Tag name
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Attributes in insertion order
    pub fn attributes(&self) -> &[Attribute] {
        &self.attrs
    }

    /// Get an attribute value
    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Set an attribute, returning the previous value
    pub(crate) fn set_attr(&mut self, name: &str, value: &str) -> Option<String> {
        for attr in self.attrs.iter_mut() {
            if attr.name == name {
                return Some(std::mem::replace(&mut attr.value, value.to_string()));
            }
        }
        self.attrs.push(Attribute {
            name: name.to_string(),
            value: value.to_string(),
        });
        None
    }

    /// Remove an attribute, returning its value
    pub(crate) fn remove_attr(&mut self, name: &str) -> Option<String> {
        let pos = self.attrs.iter().position(|a| a.name == name)?;
        Some(self.attrs.remove(pos).value)
    }
}

/// Attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}
