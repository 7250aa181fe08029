//! Engine Configuration

use std::time::Duration;

use fos_dom::MutationObserverInit;

use crate::EngineError;

/// Default declarative attribute
pub const DEFAULT_ATTRIBUTE: &str = "has";

/// Default throttle window for observer restarts
pub const DEFAULT_OBSERVER_TIMEOUT: Duration = Duration::from_millis(50);

/// Shortest allowed throttle window
pub const MIN_OBSERVER_TIMEOUT: Duration = Duration::from_millis(1);

/// Element behaviors configuration options
#[derive(Debug, Clone)]
pub struct BehaviorsConfig {
    /// Attribute whose tokens name the behaviors of a node
    pub attribute: String,

    /// Throttle window for observer restarts
    pub observer_timeout: Duration,

    /// Options used when watching each tree
    pub tree_options: MutationObserverInit,
}

impl Default for BehaviorsConfig {
    fn default() -> Self {
        Self {
            attribute: DEFAULT_ATTRIBUTE.to_string(),
            observer_timeout: DEFAULT_OBSERVER_TIMEOUT,
            tree_options: MutationObserverInit {
                child_list: true,
                attributes: true,
                subtree: true,
                ..Default::default()
            },
        }
    }
}

impl BehaviorsConfig {
    /// Use a different declarative attribute
    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = attribute.into();
        self
    }

    /// Use a different throttle window
    pub fn with_observer_timeout(mut self, timeout: Duration) -> Self {
        self.observer_timeout = timeout;
        self
    }

    /// Check the options can drive an engine
    pub fn validate(&self) -> Result<(), EngineError> {
        let attribute = self.attribute.trim();
        if attribute.is_empty() {
            return Err(EngineError::InvalidConfig(
                "declarative attribute name is empty".into(),
            ));
        }
        if attribute.chars().any(char::is_whitespace) {
            return Err(EngineError::InvalidConfig(format!(
                "declarative attribute name {:?} contains whitespace",
                self.attribute
            )));
        }
        if !self.tree_options.child_list || !self.tree_options.subtree {
            return Err(EngineError::InvalidConfig(
                "tree options must report child list changes for the whole subtree".into(),
            ));
        }
        Ok(())
    }

    /// Throttle window clamped to the allowed minimum
    pub(crate) fn effective_timeout(&self) -> Duration {
        self.observer_timeout.max(MIN_OBSERVER_TIMEOUT)
    }
}
