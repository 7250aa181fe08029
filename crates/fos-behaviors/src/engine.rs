//! Element Behaviors engine
//!
//! Owns the registry and all per-node bookkeeping. The host drives it by
//! calling [`ElementBehaviors::tick`] at the end of every turn.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use std::time::Duration;

use fos_dom::{AttachShadowHook, Dom, NodeId};

use crate::behavior::{BehaviorClass, BehaviorHandle};
use crate::clock::{Clock, SystemClock};
use crate::config::BehaviorsConfig;
use crate::frames::FrameTracker;
use crate::instances::{BehaviorEntry, InstanceStore};
use crate::interceptor::ShadowInterceptor;
use crate::owners::OwnerRecord;
use crate::registry::BehaviorRegistry;
use crate::tokens;
use crate::tracker::NodeTracker;
use crate::watch::{Observation, ObservationState, TreeKind};
use crate::{EngineError, VERSION};

/// Attribute-driven behavior engine for one [`Dom`]
pub struct ElementBehaviors {
    pub(crate) config: BehaviorsConfig,
    pub(crate) registry: BehaviorRegistry,
    pub(crate) tracker: NodeTracker,
    pub(crate) instances: InstanceStore,
    pub(crate) owners: OwnerRecord,
    pub(crate) frames: FrameTracker,
    pub(crate) observation: Rc<RefCell<Observation>>,
    pub(crate) interceptor: Rc<dyn AttachShadowHook>,
}

impl ElementBehaviors {
    /// Start watching `dom` with the wall clock
    pub fn new(dom: &mut Dom, config: BehaviorsConfig) -> Result<Self, EngineError> {
        Self::with_clock(dom, config, Rc::new(SystemClock))
    }

    /// Start watching `dom`, reading time from `clock`
    pub fn with_clock(
        dom: &mut Dom,
        mut config: BehaviorsConfig,
        clock: Rc<dyn Clock>,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        config.attribute = config.attribute.trim().to_ascii_lowercase();
        config.observer_timeout = config.effective_timeout();

        let observer = dom.observers_mut().create();
        let observation = Rc::new(RefCell::new(Observation::new(
            observer,
            clock,
            config.tree_options.clone(),
            config.observer_timeout,
        )));
        let interceptor: Rc<dyn AttachShadowHook> =
            Rc::new(ShadowInterceptor::new(observation.clone()));

        let main = dom.main_document();
        dom.install_shadow_hook(main, interceptor.clone())?;
        {
            let mut observation = observation.borrow_mut();
            observation.trees.register(main, TreeKind::Document);
            observation.start(dom.observers_mut());
        }

        let mut engine = Self {
            config,
            registry: BehaviorRegistry::new(),
            tracker: NodeTracker::default(),
            instances: InstanceStore::default(),
            owners: OwnerRecord::default(),
            frames: FrameTracker::default(),
            observation,
            interceptor,
        };
        engine.scan(dom, main);

        tracing::info!(
            "Element Behaviors {} watching {} (attribute \"{}\")",
            VERSION,
            dom.url(main).map(|u| u.as_str()).unwrap_or("<unknown>"),
            engine.config.attribute
        );
        Ok(engine)
    }

    // --- Public API ---

    /// Register `class` under `name`. False (and no change) if the name,
    /// in any case, is already taken.
    pub fn define(&mut self, name: &str, class: BehaviorClass) -> bool {
        let defined = self.registry.define(name, class);
        if defined {
            tracing::debug!("Defined behavior \"{}\"", name.to_lowercase());
        } else {
            tracing::debug!("Behavior \"{}\" is already defined", name.to_lowercase());
        }
        defined
    }

    /// Remove a definition. Only the class that was registered can remove
    /// it; every instance of it is removed from its node first.
    pub fn undefine(&mut self, dom: &mut Dom, name: &str, class: &BehaviorClass) -> bool {
        if !self.registry.matches(name, class) {
            return false;
        }
        let name = name.to_lowercase();
        let wanted = std::slice::from_ref(&name);

        let mut nodes = self.instances.nodes_with(&name);
        let carrying = self.tracker.iter().filter(|&node| {
            dom.attribute(node, &self.config.attribute)
                .is_some_and(|value| tokens::contains_all(value, wanted))
        });
        let carrying: Vec<NodeId> = carrying.collect();
        for node in carrying {
            if !nodes.contains(&node) {
                nodes.push(node);
            }
        }

        self.remove_behavior(dom, nodes, &name);
        self.registry.remove(&name);
        tracing::debug!("Undefined behavior \"{}\"", name);
        true
    }

    /// Destroy the named instances on each node and strip the names from
    /// the declarative attribute. Missing pairs are skipped.
    pub fn remove_behavior<I>(&mut self, dom: &mut Dom, nodes: I, names: &str)
    where
        I: IntoIterator<Item = NodeId>,
    {
        let names = tokens::parse(names);
        if names.is_empty() {
            return;
        }
        for node in nodes {
            for name in &names {
                let Some(entry) = self.instances.remove(node, name) else {
                    continue;
                };
                if entry.connected {
                    entry.instance.borrow_mut().disconnected(dom, node);
                }
            }

            if let Some(value) = dom.attribute(node, &self.config.attribute) {
                let stripped = tokens::remove_tokens(value, &names);
                let changed = stripped != value;
                let result = if stripped.is_empty() {
                    dom.remove_attribute(node, &self.config.attribute).map(|_| ())
                } else if changed {
                    dom.set_attribute(node, &self.config.attribute, &stripped)
                } else {
                    Ok(())
                };
                if let Err(err) = result {
                    tracing::warn!("Failed to update behaviors of {:?}: {}", node, err);
                }
            }

            if self.instances.has_any(node) {
                self.refresh_attribute_interest(node);
            } else {
                self.forget(node);
            }
        }
    }

    /// Tracked nodes that are still alive, optionally only those whose
    /// declarative attribute lists every name in `filter`
    pub fn behavior_elements(&self, dom: &Dom, filter: Option<&str>) -> Vec<NodeId> {
        let wanted = filter.map(tokens::parse).unwrap_or_default();
        self.tracker
            .iter()
            .filter(|&node| dom.contains(node))
            .filter(|&node| {
                wanted.is_empty()
                    || dom
                        .attribute(node, &self.config.attribute)
                        .is_some_and(|value| tokens::contains_all(value, &wanted))
            })
            .collect()
    }

    /// Throttle window for observer restarts, in milliseconds. Values below
    /// 1 are clamped to 1.
    pub fn set_observer_timeout(&mut self, ms: i64) {
        let window = Duration::from_millis(ms.max(1) as u64);
        self.config.observer_timeout = window;
        self.observation.borrow_mut().set_window(window);
    }

    /// Crate version
    pub fn version(&self) -> &'static str {
        VERSION
    }

    /// End-of-turn pump: run a due observer restart, finish loaded frames,
    /// evict stale nodes, then dispatch every pending mutation record.
    pub fn tick(&mut self, dom: &mut Dom) {
        self.observation.borrow_mut().poll(dom.observers_mut());
        self.poll_frames(dom);
        self.sweep(dom);

        let fresh = self.observation.borrow_mut().take_fresh();
        for root in fresh {
            self.scan(dom, root);
        }

        let batch = self.observation.borrow_mut().take_batch(dom.observers_mut());
        if !batch.is_empty() {
            tracing::trace!("Dispatching {} mutation records", batch.len());
            self.dispatch(dom, batch);
        }
    }

    // --- Inspection ---

    /// Live instance of `name` on `node`
    pub fn instance(&self, node: NodeId, name: &str) -> Option<BehaviorHandle> {
        self.instances
            .get(node, &name.to_lowercase())
            .map(|e| e.instance.clone())
    }

    /// Connected flag of an instance
    pub fn is_connected(&self, node: NodeId, name: &str) -> Option<bool> {
        self.instances
            .get(node, &name.to_lowercase())
            .map(|e| e.connected)
    }

    /// Whether `root` is one of the watched trees
    pub fn is_tracking_tree(&self, root: NodeId) -> bool {
        self.observation.borrow().trees.contains(root)
    }

    /// Whether the observer currently has registrations
    pub fn observing(&self) -> bool {
        self.observation.borrow().state() == ObservationState::Observing
    }

    /// Active configuration
    pub fn config(&self) -> &BehaviorsConfig {
        &self.config
    }

    // --- Attachment ---

    /// Resync the node's instances with its declarative attribute
    pub(crate) fn apply_behaviors(&mut self, dom: &mut Dom, node: NodeId) {
        if !dom.is_element(node) {
            return;
        }
        let names = dom
            .attribute(node, &self.config.attribute)
            .map(tokens::parse)
            .unwrap_or_default();
        if names.is_empty() {
            self.disconnect_behaviors(dom, node);
            return;
        }

        if self.tracker.track(node) {
            tracing::trace!("Tracking {:?}", node);
        }

        let Some(current) = dom.owner_document(node) else {
            return;
        };
        let adopted = self.owners.update(node, current);
        if adopted {
            tracing::debug!("{:?} adopted into document {:?}", node, current);
        }

        // Names that left the attribute
        let mut leaving = Vec::new();
        for entry in self.instances.entries_mut(node) {
            if entry.connected && !names.contains(&entry.name) {
                entry.connected = false;
                leaving.push(entry.instance.clone());
            }
        }
        for instance in leaving {
            instance.borrow_mut().disconnected(dom, node);
        }

        let mut adoptions: Vec<BehaviorHandle> = Vec::new();
        let mut connections: Vec<(String, BehaviorHandle)> = Vec::new();
        for name in &names {
            let Some(class) = self.registry.get(name).cloned() else {
                continue;
            };
            if self.instances.get(node, name).is_none() {
                self.create_instance(dom, node, name, class);
            }
            let Some(entry) = self.instances.get(node, name) else {
                continue;
            };
            if !entry.connected {
                if adopted {
                    adoptions.push(entry.instance.clone());
                }
                connections.push((name.clone(), entry.instance.clone()));
            }
        }

        for instance in adoptions {
            instance.borrow_mut().adopted(dom, node);
        }
        for (name, instance) in connections {
            instance.borrow_mut().connected(dom, node);
            if let Some(entry) = self.instances.get_mut(node, &name) {
                entry.connected = true;
            }
        }
    }

    fn create_instance(&mut self, dom: &mut Dom, node: NodeId, name: &str, class: BehaviorClass) {
        let instance = class.construct(dom, node);
        let observed_values: HashMap<String, Option<String>> = class
            .observed_attributes()
            .iter()
            .map(|attr| (attr.clone(), dom.attribute(node, attr).map(str::to_owned)))
            .collect();
        if !class.observed_attributes().is_empty() {
            self.observation.borrow_mut().add_attribute_interest(
                dom.observers_mut(),
                node,
                class.observed_attributes(),
            );
        }
        tracing::trace!("Created \"{}\" instance for {:?}", name, node);
        self.instances.insert(
            node,
            BehaviorEntry {
                name: name.to_string(),
                class,
                instance,
                connected: false,
                observed_values,
            },
        );
    }

    /// Disconnect every connected instance on the node, keeping them cached
    pub(crate) fn disconnect_behaviors(&mut self, dom: &mut Dom, node: NodeId) {
        let mut leaving = Vec::new();
        for entry in self.instances.entries_mut(node) {
            if entry.connected {
                entry.connected = false;
                leaving.push(entry.instance.clone());
            }
        }
        for instance in leaving {
            instance.borrow_mut().disconnected(dom, node);
        }
    }

    /// Drop all bookkeeping for a node
    pub(crate) fn forget(&mut self, node: NodeId) {
        self.tracker.untrack(node);
        self.instances.remove_node(node);
        self.owners.remove(node);
        self.observation
            .borrow_mut()
            .trees
            .remove_attribute_interest(node);
    }

    /// Attribute interest is the union over the node's remaining classes
    fn refresh_attribute_interest(&mut self, node: NodeId) {
        let mut observed: Vec<String> = Vec::new();
        for entry in self.instances.entries(node) {
            for attr in entry.class.observed_attributes() {
                if !observed.contains(attr) {
                    observed.push(attr.clone());
                }
            }
        }
        let mut observation = self.observation.borrow_mut();
        observation.trees.remove_attribute_interest(node);
        if !observed.is_empty() {
            observation.trees.add_attribute_interest(node, &observed);
        }
    }

    /// Evict bookkeeping for nodes whose handles went stale
    fn sweep(&mut self, dom: &Dom) {
        let evicted = self.tracker.retain(|node| dom.contains(node));
        let stale_instances: HashSet<NodeId> = self
            .instances
            .nodes()
            .into_iter()
            .filter(|&node| !dom.contains(node))
            .collect();
        for &node in evicted.iter().chain(stale_instances.iter()) {
            self.instances.remove_node(node);
        }
        self.owners.retain(|node| dom.contains(node));

        let mut observation = self.observation.borrow_mut();
        observation
            .trees
            .retain_attribute_interest(|node| dom.contains(node));
        let dropped = observation.trees.retain(|root, kind| {
            dom.contains(root)
                && match kind {
                    TreeKind::Document => true,
                    TreeKind::Frame { container } => dom.contains(container),
                    TreeKind::Shadow { host } => dom.contains(host),
                }
        });
        drop(observation);
        self.frames.retain(|container| dom.contains(container));

        if !evicted.is_empty() || dropped > 0 {
            tracing::debug!(
                "Swept {} stale nodes and {} stale trees",
                evicted.len(),
                dropped
            );
        }
    }
}

impl std::fmt::Debug for ElementBehaviors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElementBehaviors")
            .field("attribute", &self.config.attribute)
            .field("definitions", &self.registry.len())
            .field("tracked", &self.tracker.len())
            .finish_non_exhaustive()
    }
}
