//! Behavior Registry
//!
//! Name to class mapping. Names are case-insensitive.

use std::collections::HashMap;

use crate::behavior::BehaviorClass;

#[derive(Debug, Default)]
pub(crate) struct BehaviorRegistry {
    definitions: HashMap<String, BehaviorClass>,
}

impl BehaviorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `class` under `name`; false if the name is taken
    pub fn define(&mut self, name: &str, class: BehaviorClass) -> bool {
        let name = name.to_lowercase();
        if self.definitions.contains_key(&name) {
            return false;
        }
        self.definitions.insert(name, class);
        true
    }

    pub fn get(&self, name: &str) -> Option<&BehaviorClass> {
        self.definitions.get(&name.to_lowercase())
    }

    /// `class` is the one registered under `name`
    pub fn matches(&self, name: &str, class: &BehaviorClass) -> bool {
        self.get(name).is_some_and(|registered| registered == class)
    }

    pub fn remove(&mut self, name: &str) -> Option<BehaviorClass> {
        self.definitions.remove(&name.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }
}
