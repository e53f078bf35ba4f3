//! In-memory properties.

use serde_json::Value;

use super::{PersistentProperties, PropertyMap};

/// Properties with no durable medium
///
/// Every mutation that would hit a real medium instead bumps a write
/// counter and records the serialized map, which makes it a convenient spy.
#[derive(Debug, Default)]
pub struct MemoryProperties {
    name: String,
    map: PropertyMap,
    writes: usize,
    last_written: Option<String>,
}

impl MemoryProperties {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Start from previously persisted JSON content
    pub fn from_json(name: &str, raw: &str) -> Self {
        Self {
            name: name.to_string(),
            map: PropertyMap::parse(Some(raw)),
            ..Default::default()
        }
    }

    /// Number of full-map writes performed so far
    pub fn writes(&self) -> usize {
        self.writes
    }

    /// Content of the most recent write
    pub fn last_written(&self) -> Option<&str> {
        self.last_written.as_deref()
    }
}

impl PersistentProperties for MemoryProperties {
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, key: &str) -> Option<Value> {
        self.map.get(key)
    }

    fn set(&mut self, key: &str, value: Option<Value>) {
        if !self.map.apply(key, value) {
            return;
        }
        self.writes += 1;
        match self.map.to_json() {
            Ok(json) => self.last_written = Some(json),
            Err(e) => tracing::debug!(error = %e, "Could not serialize properties"),
        }
    }
}
