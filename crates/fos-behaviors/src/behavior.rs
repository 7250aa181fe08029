//! Behavior capability contract
//!
//! A behavior is constructed once per (node, name) pair and then receives
//! lifecycle calls as the node's declarative attribute, position and
//! observed attributes change. Every hook is optional.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use fos_dom::{Dom, NodeId};

/// An observed attribute changed on the node carrying the behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeChange<'a> {
    pub name: &'a str,
    /// Value last shown to this instance
    pub old_value: Option<&'a str>,
    /// Value currently on the node
    pub new_value: Option<&'a str>,
    pub node: NodeId,
}

/// Lifecycle hooks
pub trait Behavior {
    fn connected(&mut self, _dom: &mut Dom, _node: NodeId) {}

    fn disconnected(&mut self, _dom: &mut Dom, _node: NodeId) {}

    /// Node moved to another tree; runs before the matching `connected`
    fn adopted(&mut self, _dom: &mut Dom, _node: NodeId) {}

    fn attribute_changed(&mut self, _dom: &mut Dom, _change: AttributeChange<'_>) {}
}

/// Shared handle to a live instance
pub type BehaviorHandle = Rc<RefCell<Box<dyn Behavior>>>;

/// Typed shortcut for building a [`BehaviorClass`]
pub trait DefineBehavior: Behavior + Sized + 'static {
    /// Attributes whose changes reach `attribute_changed`
    const OBSERVED_ATTRIBUTES: &'static [&'static str] = &[];

    fn construct(dom: &mut Dom, node: NodeId) -> Self;
}

type Constructor = Box<dyn Fn(&mut Dom, NodeId) -> Box<dyn Behavior>>;

struct ClassInner {
    observed_attributes: Vec<String>,
    constructor: Constructor,
}

/// Constructor plus observed attribute list.
///
/// Clones share identity: two handles are equal only when one was cloned
/// from the other.
#[derive(Clone)]
pub struct BehaviorClass(Rc<ClassInner>);

impl BehaviorClass {
    /// Class with no observed attributes
    pub fn new<F>(constructor: F) -> Self
    where
        F: Fn(&mut Dom, NodeId) -> Box<dyn Behavior> + 'static,
    {
        Self::with_observed_attributes(std::iter::empty::<&str>(), constructor)
    }

    pub fn with_observed_attributes<I, S, F>(observed: I, constructor: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        F: Fn(&mut Dom, NodeId) -> Box<dyn Behavior> + 'static,
    {
        let mut observed_attributes: Vec<String> = Vec::new();
        for name in observed {
            let name = name.as_ref().to_ascii_lowercase();
            if !observed_attributes.contains(&name) {
                observed_attributes.push(name);
            }
        }
        Self(Rc::new(ClassInner {
            observed_attributes,
            constructor: Box::new(constructor),
        }))
    }

    /// Class built from a [`DefineBehavior`] type
    pub fn of<B: DefineBehavior>() -> Self {
        Self::with_observed_attributes(B::OBSERVED_ATTRIBUTES.iter().copied(), |dom, node| {
            Box::new(B::construct(dom, node)) as Box<dyn Behavior>
        })
    }

    /// Lower-cased observed attribute names
    pub fn observed_attributes(&self) -> &[String] {
        &self.0.observed_attributes
    }

    pub fn observes(&self, name: &str) -> bool {
        self.0
            .observed_attributes
            .iter()
            .any(|a| a.eq_ignore_ascii_case(name))
    }

    pub(crate) fn construct(&self, dom: &mut Dom, node: NodeId) -> BehaviorHandle {
        Rc::new(RefCell::new((self.0.constructor)(dom, node)))
    }
}

impl PartialEq for BehaviorClass {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for BehaviorClass {}

impl fmt::Debug for BehaviorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BehaviorClass")
            .field("observed_attributes", &self.0.observed_attributes)
            .finish_non_exhaustive()
    }
}
