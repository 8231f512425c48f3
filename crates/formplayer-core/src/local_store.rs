//! Caller-keyed string → JSON storage used by the display layer.
//!
//! Session state never goes through here; it lives only in the URL fragment.

use std::collections::BTreeMap;

use serde_json::Map;
use serde_json::Value;

const DISPLAY_OPTIONS_PREFIX: &str = "formplayer-display-options";

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String);
    fn remove(&mut self, key: &str);
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

pub fn display_options_key(scope: &str) -> String {
    format!("{DISPLAY_OPTIONS_PREFIX}:{scope}")
}

pub fn save_display_options(
    store: &mut dyn KeyValueStore,
    scope: &str,
    options: &Map<String, Value>,
) {
    let encoded = Value::Object(options.clone()).to_string();
    store.set(&display_options_key(scope), encoded);
}

/// Saved options for `scope`; missing or unparsable entries read as empty.
pub fn saved_display_options(store: &dyn KeyValueStore, scope: &str) -> Map<String, Value> {
    let Some(raw) = store.get(&display_options_key(scope)) else {
        return Map::new();
    };
    match serde_json::from_str::<Value>(&raw) {
        Ok(Value::Object(options)) => options,
        Ok(_) | Err(_) => {
            tracing::debug!(scope, "ignoring unreadable display options");
            Map::new()
        }
    }
}
