//! The meta overlay rule.
//!
//! Clients address some keys with a `Default:` prefix and read them back
//! without it. Every write or delete of `Default:K` is mirrored onto `K`,
//! and a write or delete of a bare `K` reaches an existing `Default:K`, so
//! both spellings always agree.

use serde::Deserialize;
use serde_json::Value;

use lobby_types::MetaMap;

/// Prefix mirrored onto the bare key.
pub const DEFAULT_PREFIX: &str = "Default:";

/// An `{update, delete}` patch against a meta map.
///
/// Update values are stored as strings; non-string JSON values keep their
/// JSON text.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetaPatch {
    /// Keys to set.
    #[serde(default)]
    pub update: serde_json::Map<String, Value>,
    /// Keys to remove.
    #[serde(default)]
    pub delete: Vec<String>,
}

impl MetaPatch {
    /// A patch that only sets `key` to `value`.
    pub fn set(key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut update = serde_json::Map::new();
        update.insert(key.into(), Value::String(value.into()));
        Self {
            update,
            delete: Vec::new(),
        }
    }

    /// A patch that only removes `key`.
    pub fn remove(key: impl Into<String>) -> Self {
        Self {
            update: serde_json::Map::new(),
            delete: vec![key.into()],
        }
    }

    /// Apply the patch to `meta`, deletes first. Returns the removed keys,
    /// mirrors included.
    pub fn apply(&self, meta: &mut MetaMap) -> Vec<String> {
        let mut removed = Vec::new();
        for key in &self.delete {
            for k in spellings(key) {
                if meta.remove(&k).is_some() {
                    removed.push(k);
                }
            }
        }
        for (key, value) in &self.update {
            let value = meta_value(value);
            let [key, other] = spellings(key);
            // A bare key only reaches a prefixed spelling that already exists.
            if key.starts_with(DEFAULT_PREFIX) || meta.contains_key(&other) {
                meta.insert(other, value.clone());
            }
            meta.insert(key, value);
        }
        removed
    }
}

/// Both spellings of `key`: itself and its prefixed or bare counterpart.
fn spellings(key: &str) -> [String; 2] {
    let other = key.strip_prefix(DEFAULT_PREFIX).map_or_else(
        || format!("{DEFAULT_PREFIX}{key}"),
        str::to_owned,
    );
    [key.to_owned(), other]
}

fn meta_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Convert a JSON object into a meta map.
pub fn meta_from_json(object: serde_json::Map<String, Value>) -> MetaMap {
    object
        .into_iter()
        .map(|(k, v)| {
            let v = meta_value(&v);
            (k, v)
        })
        .collect()
}
