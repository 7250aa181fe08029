//! Document - High-level document API

use url::Url;

use crate::node::{ElementData, Node, NodeData};
use crate::operations::{DomError, DomResult};
use crate::{Dom, NodeId};

/// Document loading state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadyState {
    #[default]
    Loading,
    Complete,
}

/// Document-specific data
#[derive(Debug)]
pub struct DocumentData {
    /// Document URL
    pub(crate) url: Url,
    /// Loading state
    pub(crate) ready_state: ReadyState,
    /// Cached reference to <html> element
    pub(crate) html_element: Option<NodeId>,
    /// Cached reference to <head> element
    pub(crate) head_element: Option<NodeId>,
    /// Cached reference to <body> element
    pub(crate) body_element: Option<NodeId>,
}

impl Dom {
    /// Create a standalone document with the basic html/head/body structure.
    ///
    /// The document starts in [`ReadyState::Loading`].
    pub fn create_document(&mut self, url: &str) -> DomResult<NodeId> {
        let url = Url::parse(url).map_err(|e| DomError::InvalidUrl(e.to_string()))?;
        let data = DocumentData {
            url,
            ready_state: ReadyState::Loading,
            html_element: None,
            head_element: None,
            body_element: None,
        };

        // A document owns itself; patch the owner once the id is known
        let placeholder = NodeId::from_raw_parts(u32::MAX, u32::MAX);
        let doc = self.alloc(Node::new(placeholder, NodeData::Document(data)));
        self.node_mut(doc)?.owner_document = doc;

        let html = self.create_element(doc, "html")?;
        let head = self.create_element(doc, "head")?;
        let body = self.create_element(doc, "body")?;
        self.append_child(doc, html)?;
        self.append_child(html, head)?;
        self.append_child(html, body)?;

        let data = self
            .node_mut(doc)?
            .as_document_mut()
            .ok_or(DomError::InvalidNodeType)?;
        data.html_element = Some(html);
        data.head_element = Some(head);
        data.body_element = Some(body);

        Ok(doc)
    }

    /// Create an element owned by `document`
    pub fn create_element(&mut self, document: NodeId, tag: &str) -> DomResult<NodeId> {
        if !self.is_document(document) {
            return Err(DomError::InvalidNodeType);
        }
        Ok(self.alloc(Node::new(
            document,
            NodeData::Element(ElementData::new(tag)),
        )))
    }

    /// Create a text node owned by `document`
    pub fn create_text(&mut self, document: NodeId, text: &str) -> DomResult<NodeId> {
        if !self.is_document(document) {
            return Err(DomError::InvalidNodeType);
        }
        Ok(self.alloc(Node::new(document, NodeData::Text(text.to_string()))))
    }

    fn document_data(&self, document: NodeId) -> Option<&DocumentData> {
        self.get(document)?.as_document()
    }

    /// Document URL
    pub fn url(&self, document: NodeId) -> Option<&Url> {
        self.document_data(document).map(|d| &d.url)
    }

    /// Loading state
    pub fn ready_state(&self, document: NodeId) -> Option<ReadyState> {
        self.document_data(document).map(|d| d.ready_state)
    }

    /// Mark a document as fully loaded
    pub fn finish_loading(&mut self, document: NodeId) -> DomResult<()> {
        let data = self
            .node_mut(document)?
            .as_document_mut()
            .ok_or(DomError::InvalidNodeType)?;
        data.ready_state = ReadyState::Complete;
        tracing::debug!("Document {:?} finished loading", document);
        Ok(())
    }

    /// Get <html> element
    pub fn document_element(&self, document: NodeId) -> Option<NodeId> {
        self.document_data(document)?
            .html_element
            .filter(|&id| self.contains(id))
    }

    /// Get <head> element
    pub fn head(&self, document: NodeId) -> Option<NodeId> {
        self.document_data(document)?
            .head_element
            .filter(|&id| self.contains(id))
    }

    /// Get <body> element
    pub fn body(&self, document: NodeId) -> Option<NodeId> {
        self.document_data(document)?
            .body_element
            .filter(|&id| self.contains(id))
    }
}
