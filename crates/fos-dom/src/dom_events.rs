//! DOM Events
//!
//! Minimal listener registry. Events are dispatched to the target only;
//! listeners receive the whole [`Dom`] so they can mutate it.

use std::collections::HashMap;
use std::rc::Rc;

use crate::{Dom, NodeId};

/// Event callback
pub type EventListener = Rc<dyn Fn(&mut Dom, NodeId)>;

/// Listener handle returned by `add_event_listener`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Registered {
    id: ListenerId,
    event_type: String,
    listener: EventListener,
}

#[derive(Default)]
pub(crate) struct EventListeners {
    by_node: HashMap<NodeId, Vec<Registered>>,
    next_id: u64,
}

impl EventListeners {
    pub(crate) fn remove_node(&mut self, node: NodeId) {
        self.by_node.remove(&node);
    }
}

impl Dom {
    /// Register a listener for `event_type` on `node`
    pub fn add_event_listener(
        &mut self,
        node: NodeId,
        event_type: &str,
        listener: impl Fn(&mut Dom, NodeId) + 'static,
    ) -> ListenerId {
        let id = ListenerId(self.listeners.next_id);
        self.listeners.next_id += 1;
        self.listeners.by_node.entry(node).or_default().push(Registered {
            id,
            event_type: event_type.to_string(),
            listener: Rc::new(listener),
        });
        id
    }

    /// Remove a listener; returns whether it was registered
    pub fn remove_event_listener(&mut self, node: NodeId, id: ListenerId) -> bool {
        let Some(list) = self.listeners.by_node.get_mut(&node) else {
            return false;
        };
        let before = list.len();
        list.retain(|r| r.id != id);
        let removed = list.len() != before;
        if list.is_empty() {
            self.listeners.by_node.remove(&node);
        }
        removed
    }

    /// Run every `event_type` listener on `node`; returns how many ran
    pub fn dispatch_event(&mut self, node: NodeId, event_type: &str) -> usize {
        if !self.contains(node) {
            return 0;
        }
        let listeners: Vec<EventListener> = self
            .listeners
            .by_node
            .get(&node)
            .map(|list| {
                list.iter()
                    .filter(|r| r.event_type == event_type)
                    .map(|r| r.listener.clone())
                    .collect()
            })
            .unwrap_or_default();
        for listener in &listeners {
            listener(self, node);
        }
        listeners.len()
    }

    /// Dispatch a `click`
    pub fn click(&mut self, node: NodeId) -> usize {
        self.dispatch_event(node, "click")
    }
}
