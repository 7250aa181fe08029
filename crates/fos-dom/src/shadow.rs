//! Shadow DOM
//!
//! Shadow roots are separate trees hanging off a host element. They are
//! not children of the host, so tree walks and `subtree` observers stop at
//! the boundary.

use std::rc::Rc;

use crate::node::{Node, NodeData};
use crate::observer::MutationObserverManager;
use crate::operations::{DomError, DomResult};
use crate::{Dom, NodeId};

/// Shadow root mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShadowRootMode {
    /// Reachable from outside through the host
    #[default]
    Open,
    /// Hidden from outside code
    Closed,
}

/// Options for `attach_shadow`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShadowRootInit {
    pub mode: ShadowRootMode,
}

impl ShadowRootInit {
    pub fn open() -> Self {
        Self {
            mode: ShadowRootMode::Open,
        }
    }

    pub fn closed() -> Self {
        Self {
            mode: ShadowRootMode::Closed,
        }
    }
}

/// Shadow root data
#[derive(Debug)]
pub struct ShadowRootData {
    /// Host element
    pub(crate) host: NodeId,
    pub(crate) mode: ShadowRootMode,
}

impl ShadowRootData {
    /// Host element
    pub fn host(&self) -> NodeId {
        self.host
    }

    /// Mode the root was created with
    pub fn mode(&self) -> ShadowRootMode {
        self.mode
    }
}

/// Notification handed to [`AttachShadowHook`]s after a root is created
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShadowAttached {
    pub host: NodeId,
    pub root: NodeId,
    pub mode: ShadowRootMode,
}

/// Hook run after every successful `attach_shadow` in a document.
///
/// Hooks get the observer registry so they can start watching the new
/// root before any of its content is built.
pub trait AttachShadowHook {
    fn shadow_attached(&self, observers: &mut MutationObserverManager, event: ShadowAttached);
}

impl Dom {
    /// Attach a shadow root to an element. The root is returned whatever
    /// its mode; an element can only host one.
    pub fn attach_shadow(&mut self, host: NodeId, init: ShadowRootInit) -> DomResult<NodeId> {
        let host_node = self.node(host)?;
        let elem = host_node.as_element().ok_or(DomError::ShadowNotSupported)?;
        if elem.shadow_root.is_some() {
            return Err(DomError::ShadowAlreadyAttached);
        }
        let document = host_node.owner_document;

        let root = self.alloc(Node::new(
            document,
            NodeData::ShadowRoot(ShadowRootData {
                host,
                mode: init.mode,
            }),
        ));
        if let Some(elem) = self.node_mut(host)?.as_element_mut() {
            elem.shadow_root = Some(root);
        }
        tracing::trace!("Attached {:?} shadow root to {:?}", init.mode, host);

        let hooks = self.shadow_hooks.get(&document).cloned().unwrap_or_default();
        let event = ShadowAttached {
            host,
            root,
            mode: init.mode,
        };
        for hook in hooks {
            hook.shadow_attached(&mut self.observers, event);
        }
        Ok(root)
    }

    /// Open shadow root of a host
    pub fn shadow_root(&self, host: NodeId) -> Option<NodeId> {
        let root = self.get(host)?.as_element()?.shadow_root?;
        match self.get(root)?.as_shadow_root()?.mode {
            ShadowRootMode::Open => Some(root),
            ShadowRootMode::Closed => None,
        }
    }

    /// Host of a shadow root
    pub fn shadow_host(&self, root: NodeId) -> Option<NodeId> {
        self.get(root)?.as_shadow_root().map(|s| s.host)
    }

    /// Run `hook` after every shadow root attached in `document`.
    /// Installing the same hook twice is a no-op.
    pub fn install_shadow_hook(
        &mut self,
        document: NodeId,
        hook: Rc<dyn AttachShadowHook>,
    ) -> DomResult<()> {
        if !self.is_document(document) {
            return Err(DomError::InvalidNodeType);
        }
        let hooks = self.shadow_hooks.entry(document).or_default();
        if !hooks.iter().any(|h| Rc::ptr_eq(h, &hook)) {
            hooks.push(hook);
        }
        Ok(())
    }

    /// Uninstall a hook; returns whether it was installed
    pub fn remove_shadow_hook(&mut self, document: NodeId, hook: &Rc<dyn AttachShadowHook>) -> bool {
        let Some(hooks) = self.shadow_hooks.get_mut(&document) else {
            return false;
        };
        let before = hooks.len();
        hooks.retain(|h| !Rc::ptr_eq(h, hook));
        let removed = hooks.len() != before;
        if hooks.is_empty() {
            self.shadow_hooks.remove(&document);
        }
        removed
    }
}
