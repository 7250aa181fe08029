//! Tree Watch Set & Observation Scheduler
//!
//! One mutation observer covers every watched tree. Adding a tree means
//! stopping and restarting that observer, so restarts are throttled: the
//! first request after a quiet period runs at once, later requests inside
//! the window collapse into one trailing restart at the window's end.

use std::collections::HashMap;
use std::rc::Rc;
use std::time::{Duration, Instant};

use fos_dom::{MutationObserverInit, MutationObserverManager, MutationRecord, NodeId, ObserverId};

use crate::clock::Clock;

/// Whether the observer currently has registrations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObservationState {
    Idle,
    Observing,
}

/// Where a watched tree comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TreeKind {
    /// The main document
    Document,
    /// Document embedded by `container`
    Frame { container: NodeId },
    /// Open shadow root of `host`
    Shadow { host: NodeId },
}

#[derive(Debug)]
struct WatchedTree {
    root: NodeId,
    kind: TreeKind,
    /// Registered with the observer at least once
    observed: bool,
}

/// Trees to observe plus per-node attribute interest
#[derive(Debug, Default)]
pub(crate) struct TreeWatchSet {
    trees: Vec<WatchedTree>,
    attribute_interest: HashMap<NodeId, Vec<String>>,
}

impl TreeWatchSet {
    /// Returns false if the root is already watched
    pub fn register(&mut self, root: NodeId, kind: TreeKind) -> bool {
        if self.contains(root) {
            return false;
        }
        self.trees.push(WatchedTree {
            root,
            kind,
            observed: false,
        });
        true
    }

    pub fn unregister(&mut self, root: NodeId) -> bool {
        let before = self.trees.len();
        self.trees.retain(|t| t.root != root);
        self.trees.len() != before
    }

    pub fn contains(&self, root: NodeId) -> bool {
        self.trees.iter().any(|t| t.root == root)
    }

    pub fn len(&self) -> usize {
        self.trees.len()
    }

    /// Tracked shadow root hosted by `host`
    pub fn shadow_root_of(&self, host: NodeId) -> Option<NodeId> {
        self.trees
            .iter()
            .find(|t| t.kind == TreeKind::Shadow { host })
            .map(|t| t.root)
    }

    /// Tracked document embedded by `container`
    pub fn frame_document_of(&self, container: NodeId) -> Option<NodeId> {
        self.trees
            .iter()
            .find(|t| t.kind == TreeKind::Frame { container })
            .map(|t| t.root)
    }

    /// Roots and kinds of every watched tree
    pub fn trees(&self) -> impl Iterator<Item = (NodeId, TreeKind)> + '_ {
        self.trees.iter().map(|t| (t.root, t.kind))
    }

    /// Drop trees rejected by `keep`; returns how many went away
    pub fn retain(&mut self, mut keep: impl FnMut(NodeId, TreeKind) -> bool) -> usize {
        let before = self.trees.len();
        self.trees.retain(|t| keep(t.root, t.kind));
        before - self.trees.len()
    }

    /// Merge `names` into the attributes watched on `node`; returns the
    /// merged filter
    pub fn add_attribute_interest(&mut self, node: NodeId, names: &[String]) -> Vec<String> {
        let filter = self.attribute_interest.entry(node).or_default();
        for name in names {
            if !filter.contains(name) {
                filter.push(name.clone());
            }
        }
        filter.clone()
    }

    pub fn remove_attribute_interest(&mut self, node: NodeId) {
        self.attribute_interest.remove(&node);
    }

    pub fn retain_attribute_interest(&mut self, mut keep: impl FnMut(NodeId) -> bool) {
        self.attribute_interest.retain(|&node, _| keep(node));
    }
}

/// Throttle for observer restarts
#[derive(Debug)]
pub(crate) struct ObservationScheduler {
    window: Duration,
    last_run: Option<Instant>,
    trailing: Option<Instant>,
}

impl ObservationScheduler {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_run: None,
            trailing: None,
        }
    }

    /// Ask for a restart at `now`. Returns true when it should run right
    /// away; otherwise a trailing restart is scheduled.
    pub fn request(&mut self, now: Instant) -> bool {
        match self.last_run {
            Some(last) if now.saturating_duration_since(last) < self.window => {
                if self.trailing.is_none() {
                    self.trailing = Some(last + self.window);
                }
                false
            }
            _ => {
                self.last_run = Some(now);
                self.trailing = None;
                true
            }
        }
    }

    /// Returns true (and consumes the trailing restart) once it is due
    pub fn due(&mut self, now: Instant) -> bool {
        match self.trailing {
            Some(deadline) if now >= deadline => {
                self.trailing = None;
                self.last_run = Some(now);
                true
            }
            _ => false,
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.trailing
    }

    /// Replace the window. A pending trailing restart keeps its slot but is
    /// moved to the new window's end.
    pub fn set_window(&mut self, window: Duration) {
        self.window = window;
        if let (Some(last), Some(_)) = (self.last_run, self.trailing) {
            self.trailing = Some(last + window);
        }
    }
}

/// The single watcher over every tree
pub(crate) struct Observation {
    observer: ObserverId,
    state: ObservationState,
    pub(crate) trees: TreeWatchSet,
    scheduler: ObservationScheduler,
    /// Records drained from the observer by a stop, not yet dispatched
    backlog: Vec<MutationRecord>,
    /// Shadow roots and frame documents that became observed since the
    /// last drain
    fresh: Vec<NodeId>,
    clock: Rc<dyn Clock>,
    tree_options: MutationObserverInit,
}

impl Observation {
    pub fn new(
        observer: ObserverId,
        clock: Rc<dyn Clock>,
        tree_options: MutationObserverInit,
        window: Duration,
    ) -> Self {
        Self {
            observer,
            state: ObservationState::Idle,
            trees: TreeWatchSet::default(),
            scheduler: ObservationScheduler::new(window),
            backlog: Vec::new(),
            fresh: Vec::new(),
            clock,
            tree_options,
        }
    }

    pub fn state(&self) -> ObservationState {
        self.state
    }

    pub fn set_window(&mut self, window: Duration) {
        self.scheduler.set_window(window);
    }

    /// Register every watched tree and every attribute interest
    pub fn start(&mut self, observers: &mut MutationObserverManager) {
        if self.state == ObservationState::Observing {
            return;
        }
        for tree in &mut self.trees.trees {
            observers.observe(self.observer, tree.root, self.tree_options.clone());
            if !tree.observed {
                tree.observed = true;
                if tree.kind != TreeKind::Document {
                    self.fresh.push(tree.root);
                }
            }
        }
        for (&node, filter) in &self.trees.attribute_interest {
            observers.observe(self.observer, node, Self::interest_options(filter.clone()));
        }
        self.state = ObservationState::Observing;
        tracing::trace!("Observing {} trees", self.trees.len());
    }

    /// Drop every registration, keeping pending records in the backlog
    pub fn stop(&mut self, observers: &mut MutationObserverManager) {
        if self.state == ObservationState::Idle {
            return;
        }
        self.backlog.extend(observers.take_records(self.observer));
        observers.disconnect(self.observer);
        self.state = ObservationState::Idle;
    }

    pub fn restart(&mut self, observers: &mut MutationObserverManager) {
        self.stop(observers);
        self.start(observers);
    }

    /// Throttled restart
    pub fn request_restart(&mut self, observers: &mut MutationObserverManager) {
        if self.scheduler.request(self.clock.now()) {
            self.restart(observers);
        } else {
            tracing::trace!("Observer restart deferred to {:?}", self.scheduler.deadline());
        }
    }

    /// Run a trailing restart once it is due
    pub fn poll(&mut self, observers: &mut MutationObserverManager) -> bool {
        if !self.scheduler.due(self.clock.now()) {
            return false;
        }
        self.restart(observers);
        true
    }

    /// Watch `names` on `node` itself, so changes are seen even while the
    /// node sits outside every watched tree
    pub fn add_attribute_interest(
        &mut self,
        observers: &mut MutationObserverManager,
        node: NodeId,
        names: &[String],
    ) {
        let filter = self.trees.add_attribute_interest(node, names);
        if self.state == ObservationState::Observing {
            observers.observe(self.observer, node, Self::interest_options(filter));
        }
    }

    /// Backlog followed by everything queued since
    pub fn take_batch(&mut self, observers: &mut MutationObserverManager) -> Vec<MutationRecord> {
        let mut batch = std::mem::take(&mut self.backlog);
        batch.extend(observers.take_records(self.observer));
        batch
    }

    pub fn take_fresh(&mut self) -> Vec<NodeId> {
        std::mem::take(&mut self.fresh)
    }

    fn interest_options(filter: Vec<String>) -> MutationObserverInit {
        MutationObserverInit {
            attributes: true,
            attribute_filter: Some(filter),
            ..Default::default()
        }
    }
}
