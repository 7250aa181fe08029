//! Tree-Creation Interceptor
//!
//! Installed on every watched document through
//! [`Dom::install_shadow_hook`](fos_dom::Dom::install_shadow_hook). Each new
//! open shadow root becomes a watched tree. Closed roots are never seen.

use std::cell::RefCell;
use std::rc::Rc;

use fos_dom::{AttachShadowHook, MutationObserverManager, ShadowAttached, ShadowRootMode};

use crate::watch::{Observation, TreeKind};

pub(crate) struct ShadowInterceptor {
    observation: Rc<RefCell<Observation>>,
}

impl ShadowInterceptor {
    pub fn new(observation: Rc<RefCell<Observation>>) -> Self {
        Self { observation }
    }
}

impl AttachShadowHook for ShadowInterceptor {
    fn shadow_attached(&self, observers: &mut MutationObserverManager, event: ShadowAttached) {
        if event.mode == ShadowRootMode::Closed {
            tracing::trace!("Ignoring closed shadow root on {:?}", event.host);
            return;
        }
        let Ok(mut observation) = self.observation.try_borrow_mut() else {
            tracing::warn!("Shadow root {:?} attached during an observer restart", event.root);
            return;
        };
        if !observation
            .trees
            .register(event.root, TreeKind::Shadow { host: event.host })
        {
            return;
        }
        tracing::debug!("Watching shadow root {:?} of {:?}", event.root, event.host);
        observation.request_restart(observers);
    }
}
