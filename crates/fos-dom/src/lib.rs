//! fOS DOM - Document Object Model
//!
//! Arena-backed node tree shared by every document of a page. The main
//! document, embedded frame documents and shadow roots all live in one
//! [`Dom`], so nodes can move (and be adopted) between them.
//!
//! Handles are generational: once a subtree is destroyed its [`NodeId`]s go
//! stale and every query on them answers "absent". Callers can hold ids as
//! weak references and check liveness with [`Dom::contains`].
//!
//! Each document and shadow root is an independent tree for mutation
//! observers. Registrations with `subtree` never see across a shadow or frame
//! boundary.

mod document;
mod dom_events;
mod frame;
mod node;
mod observer;
mod operations;
mod shadow;
mod tree;
mod tree_walker;

pub use document::ReadyState;
pub use dom_events::{EventListener, ListenerId};
pub use node::{Attribute, ElementData, Node, NodeData, NodeType};
pub use observer::{
    MutationObserverInit, MutationObserverManager, MutationRecord, MutationType, ObserverId,
};
pub use operations::{DomError, DomResult};
pub use shadow::{AttachShadowHook, ShadowAttached, ShadowRootInit, ShadowRootMode};
pub use tree::Dom;
pub use tree_walker::Descendants;

/// Node identifier (generational index into the arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    /// Build an id from its raw parts
    pub const fn from_raw_parts(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Arena slot
    #[inline]
    pub const fn index(self) -> u32 {
        self.index
    }

    /// Slot generation this handle was issued for
    #[inline]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}
