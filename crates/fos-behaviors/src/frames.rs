//! Frame Tracker
//!
//! Same-origin frame documents become watched trees once they finish
//! loading. Cross-origin frames are skipped without error.

use fos_dom::{Dom, NodeId, ReadyState};

use crate::engine::ElementBehaviors;
use crate::watch::TreeKind;

/// Frames whose documents are still loading
#[derive(Debug, Default)]
pub(crate) struct FrameTracker {
    pending: Vec<(NodeId, NodeId)>,
}

impl FrameTracker {
    pub fn is_pending(&self, container: NodeId) -> bool {
        self.pending.iter().any(|&(c, _)| c == container)
    }

    pub fn retain(&mut self, mut keep: impl FnMut(NodeId) -> bool) {
        self.pending.retain(|&(container, _)| keep(container));
    }
}

impl ElementBehaviors {
    /// Start tracking an inserted frame container
    pub(crate) fn track_frame(&mut self, dom: &mut Dom, container: NodeId) {
        let Some(document) = dom.content_document(container) else {
            tracing::debug!("Skipping inaccessible frame {:?}", container);
            return;
        };
        if self.observation.borrow().trees.contains(document) || self.frames.is_pending(container)
        {
            return;
        }
        // Shadow roots created inside the frame report to this engine
        if let Err(err) = dom.install_shadow_hook(document, self.interceptor.clone()) {
            tracing::warn!("Cannot watch frame {:?}: {}", container, err);
            return;
        }

        if dom.ready_state(document) == Some(ReadyState::Complete) {
            self.finish_frame(dom, container, document);
        } else {
            tracing::debug!("Waiting for frame {:?} to load", container);
            self.frames.pending.push((container, document));
        }
    }

    /// Watch a loaded frame document and attach everything already in it
    fn finish_frame(&mut self, dom: &mut Dom, container: NodeId, document: NodeId) {
        {
            let mut observation = self.observation.borrow_mut();
            observation
                .trees
                .register(document, TreeKind::Frame { container });
            observation.request_restart(dom.observers_mut());
        }
        tracing::debug!("Watching frame document {:?} of {:?}", document, container);
        self.scan(dom, document);
    }

    /// Finish frames whose documents completed loading
    pub(crate) fn poll_frames(&mut self, dom: &mut Dom) {
        let pending = std::mem::take(&mut self.frames.pending);
        for (container, document) in pending {
            if !dom.contains(container) || dom.frame_document(container) != Some(document) {
                continue;
            }
            if dom.ready_state(document) == Some(ReadyState::Complete) {
                self.finish_frame(dom, container, document);
            } else {
                self.frames.pending.push((container, document));
            }
        }
    }

    /// Stop watching a removed frame. Instances inside it are disconnected
    /// and forgotten, as are nested frames and shadow trees.
    pub(crate) fn untrack_frame(&mut self, dom: &mut Dom, container: NodeId) {
        let loading = self
            .frames
            .pending
            .iter()
            .find(|&&(pending, _)| pending == container)
            .map(|&(_, document)| document);
        self.frames
            .pending
            .retain(|&(pending, _)| pending != container);

        let watched = {
            let mut observation = self.observation.borrow_mut();
            let document = observation.trees.frame_document_of(container);
            if let Some(document) = document {
                observation.trees.unregister(document);
            }
            document
        };
        // A frame still loading has a hook but no tree yet
        let Some(document) = watched
            .or(loading)
            .or_else(|| dom.frame_document(container))
        else {
            return;
        };
        dom.remove_shadow_hook(document, &self.interceptor);

        let mut nested: Vec<NodeId> = self
            .observation
            .borrow()
            .trees
            .trees()
            .filter_map(|(_, kind)| match kind {
                TreeKind::Frame { container } => Some(container),
                _ => None,
            })
            .collect();
        nested.extend(self.frames.pending.iter().map(|&(c, _)| c));
        nested.retain(|&c| dom.owner_document(c) == Some(document));
        for nested_container in nested {
            self.untrack_frame(dom, nested_container);
        }

        let shadows = self.observation.borrow_mut().trees.retain(|_, kind| match kind {
            TreeKind::Shadow { host } => dom.owner_document(host) != Some(document),
            _ => true,
        });

        let inside: Vec<NodeId> = self
            .tracker
            .iter()
            .filter(|&node| self.owners.get(node) == Some(document))
            .collect();
        for node in &inside {
            self.disconnect_behaviors(dom, *node);
            self.forget(*node);
        }

        tracing::debug!(
            "Stopped watching frame {:?} ({} nodes released)",
            container,
            inside.len()
        );
        if watched.is_some() || shadows > 0 {
            self.observation
                .borrow_mut()
                .request_restart(dom.observers_mut());
        }
    }
}
