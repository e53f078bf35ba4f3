//! Persistent properties
//!
//! A small durable key-value store per application name, holding settings
//! such as the client id and the enabled flag. The whole map lives in
//! memory and is rewritten to its medium in full on every mutation.
//!
//! ## Backends
//!
//! - [`FileProperties`]: a dotfile in the user's home directory
//! - [`BrowserProperties`]: one web-storage entry keyed by the app name
//! - [`MemoryProperties`]: no medium, counts writes (tests, embedding)
//!
//! Loading never fails: a missing, empty or corrupt medium yields an empty
//! map. Write failures are logged and dropped; the in-memory map stays
//! authoritative for the rest of the process.

mod browser;
mod file;
mod memory;

pub use browser::{BrowserProperties, MemoryWebStorage, WebStorage};
#[cfg(target_arch = "wasm32")]
pub use browser::LocalStorage;
pub use file::FileProperties;
pub use memory::MemoryProperties;

use serde_json::{Map, Value};

use crate::error::Result;

/// Durable key-value store of JSON values
pub trait PersistentProperties: Send {
    /// Application name the store belongs to
    fn name(&self) -> &str;

    /// Current value for `key`, if any
    fn get(&self, key: &str) -> Option<Value>;

    /// Set or clear (`None`) a value, persisting the whole map if it changed
    fn set(&mut self, key: &str, value: Option<Value>);
}

/// In-memory map plus the mutation rules shared by every backend
#[derive(Debug, Clone, Default)]
pub(crate) struct PropertyMap {
    map: Map<String, Value>,
}

impl PropertyMap {
    /// Decode persisted content, falling back to an empty map
    pub(crate) fn parse(raw: Option<&str>) -> Self {
        let raw = match raw.map(str::trim) {
            Some(raw) if !raw.is_empty() => raw,
            _ => return Self::default(),
        };

        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(map)) => Self { map },
            Ok(other) => {
                tracing::debug!(kind = %json_kind(&other), "Ignoring non-object properties content");
                Self::default()
            }
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring corrupt properties content");
                Self::default()
            }
        }
    }

    pub(crate) fn get(&self, key: &str) -> Option<Value> {
        self.map.get(key).cloned()
    }

    /// Apply a mutation. Returns false when nothing changed.
    ///
    /// Assigning JSON `null` clears the key.
    pub(crate) fn apply(&mut self, key: &str, value: Option<Value>) -> bool {
        match value.filter(|v| !v.is_null()) {
            None => self.map.remove(key).is_some(),
            Some(value) => {
                if self.map.get(key) == Some(&value) {
                    return false;
                }
                self.map.insert(key.to_string(), value);
                true
            }
        }
    }

    pub(crate) fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.map)?)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_fallbacks() {
        assert!(PropertyMap::parse(None).get("a").is_none());
        assert!(PropertyMap::parse(Some("")).get("a").is_none());
        assert!(PropertyMap::parse(Some("  \n")).get("a").is_none());
        assert!(PropertyMap::parse(Some("{not json")).get("a").is_none());
        assert!(PropertyMap::parse(Some("[1, 2]")).get("a").is_none());
    }

    #[test]
    fn test_parse_object() {
        let map = PropertyMap::parse(Some(r#"{"cid": "abc-123", "enabled": false}"#));
        assert_eq!(map.get("cid"), Some(json!("abc-123")));
        assert_eq!(map.get("enabled"), Some(json!(false)));
    }

    #[test]
    fn test_apply_reports_changes() {
        let mut map = PropertyMap::default();

        // Clearing an absent key changes nothing
        assert!(!map.apply("a", None));

        assert!(map.apply("a", Some(json!(1))));
        assert!(!map.apply("a", Some(json!(1))));
        assert!(map.apply("a", Some(json!({"nested": true}))));
        assert!(map.apply("a", None));
        assert!(map.get("a").is_none());
    }

    #[test]
    fn test_apply_null_clears() {
        let mut map = PropertyMap::default();
        assert!(!map.apply("a", Some(Value::Null)));
        assert!(map.get("a").is_none());

        assert!(map.apply("a", Some(json!("x"))));
        assert!(map.apply("a", Some(Value::Null)));
        assert!(map.get("a").is_none());
        assert_eq!(map.to_json().unwrap(), "{}");
    }
}
