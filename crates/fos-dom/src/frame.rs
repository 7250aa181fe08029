//! Frames
//!
//! An `<iframe>` element can embed its own document. The embedded document
//! lives in the same arena but is a separate tree: it is not a child of the
//! frame element.

use crate::operations::{DomError, DomResult};
use crate::{Dom, NodeId};

/// Document embedded by a frame container
#[derive(Debug, Clone, Copy)]
pub struct FrameContent {
    pub(crate) document: NodeId,
}

impl Dom {
    /// Load a new document into an `<iframe>`. The document starts in
    /// [`ReadyState::Loading`](crate::ReadyState::Loading) until
    /// [`Dom::finish_loading`] is called for it.
    pub fn attach_frame(&mut self, iframe: NodeId, url: &str) -> DomResult<NodeId> {
        if self.tag_name(iframe) != Some("iframe") {
            return Err(DomError::NotAFrame);
        }
        let document = self.create_document(url)?;
        if let Some(elem) = self.node_mut(iframe)?.as_element_mut() {
            elem.frame = Some(FrameContent { document });
        }
        tracing::debug!("Frame {:?} loading document {:?}", iframe, document);
        Ok(document)
    }

    /// Whether `node` is a frame container
    pub fn is_frame(&self, node: NodeId) -> bool {
        self.tag_name(node) == Some("iframe")
    }

    /// Embedded document regardless of origin
    pub fn frame_document(&self, iframe: NodeId) -> Option<NodeId> {
        let document = self.get(iframe)?.as_element()?.frame?.document;
        self.contains(document).then_some(document)
    }

    /// Embedded document when it shares an origin with the frame's owner
    /// document; cross-origin content is not reachable.
    pub fn content_document(&self, iframe: NodeId) -> Option<NodeId> {
        let document = self.frame_document(iframe)?;
        let owner = self.owner_document(iframe)?;
        let frame_origin = self.url(document)?.origin();
        let owner_origin = self.url(owner)?.origin();
        (frame_origin.is_tuple() && frame_origin == owner_origin).then_some(document)
    }
}
