use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

/// Per-operation view model: named slots mapping to downstream payloads.
///
/// A slot is either present with the payload exactly as the data API
/// returned it, or absent. Aggregator operations short-circuit on the first
/// failed call, so a constructed `ViewModel` is always complete; partial
/// views are never built.
#[derive(Debug, Default, Serialize)]
#[serde(transparent)]
pub struct ViewModel {
    slots: BTreeMap<&'static str, Value>,
}

impl ViewModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fill a slot. `Null` payloads count as absent and are dropped.
    pub fn fill(&mut self, slot: &'static str, payload: Value) {
        if !payload.is_null() {
            self.slots.insert(slot, payload);
        }
    }

    pub fn with(mut self, slot: &'static str, payload: Value) -> Self {
        self.fill(slot, payload);
        self
    }

    pub fn slot(&self, name: &str) -> Option<&Value> {
        self.slots.get(name)
    }

    pub fn is_absent(&self, name: &str) -> bool {
        !self.slots.contains_key(name)
    }
}
