//! Process-wide behavior catalogue.
//!
//! Maps behavior names to their implementations. Built once (the builtin
//! table, plus anything an embedder registers) and read-only afterwards, so
//! it can be shared across launchers without locking.

use crate::behavior::Behavior;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Catalogue of behaviors keyed by name.
#[derive(Default)]
pub struct Registry {
    behaviors: BTreeMap<String, Arc<dyn Behavior>>,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Registry {
            behaviors: BTreeMap::new(),
        }
    }

    /// The builtin catalogue: basic behaviors, their per-line variants, and
    /// the HTTP responders.
    pub fn builtin() -> Self {
        let mut registry = Registry::new();
        for behavior in crate::behaviors::builtin() {
            registry.register(behavior);
        }
        registry
    }

    /// Register a behavior under its own name. A behavior registered under
    /// an existing name replaces the previous entry.
    pub fn register(&mut self, behavior: Arc<dyn Behavior>) {
        self.behaviors.insert(behavior.name().to_string(), behavior);
    }

    /// Look up a behavior by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Behavior>> {
        self.behaviors.get(name).map(Arc::clone)
    }

    /// Every registered behavior, in name order.
    pub fn all(&self) -> Vec<Arc<dyn Behavior>> {
        self.behaviors.values().map(Arc::clone).collect()
    }

    /// Registered names, in name order.
    pub fn names(&self) -> Vec<&str> {
        self.behaviors.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.behaviors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.behaviors.is_empty()
    }
}
