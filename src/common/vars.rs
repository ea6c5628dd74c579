//! Ordered key/value bag used as the parameter bag and component field map.

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

/// A JSON object wrapper that preserves insertion order.
///
/// `Vars` is the currency of the engine: resolved parameter bags, component
/// config fields and linkage params are all `Vars`. It round-trips losslessly
/// to `serde_json::Value` so it can cross the boundary into handler code.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Vars {
    inner: Map<String, Value>,
}

impl Vars {
    pub fn new() -> Self {
        Self {
            inner: Map::new(),
        }
    }

    /// Set a key to any serializable value.
    pub fn set<T: Serialize>(
        &mut self,
        key: &str,
        value: T,
    ) {
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        self.inner.insert(key.to_string(), value);
    }

    /// Set a key to a raw JSON value.
    pub fn set_value(
        &mut self,
        key: &str,
        value: Value,
    ) {
        self.inner.insert(key.to_string(), value);
    }

    /// Get a key, deserialized into the requested type.
    pub fn get<T: DeserializeOwned>(
        &self,
        key: &str,
    ) -> Option<T> {
        self.inner.get(key).cloned().and_then(|v| serde_json::from_value(v).ok())
    }

    /// Get a key as a raw JSON value.
    pub fn get_value(
        &self,
        key: &str,
    ) -> Option<&Value> {
        self.inner.get(key)
    }

    pub fn contains_key(
        &self,
        key: &str,
    ) -> bool {
        self.inner.contains_key(key)
    }

    pub fn remove(
        &mut self,
        key: &str,
    ) -> Option<Value> {
        self.inner.remove(key)
    }

    /// Merge another bag into this one; keys from `other` win.
    pub fn extend(
        &mut self,
        other: Vars,
    ) {
        for (k, v) in other.inner {
            self.inner.insert(k, v);
        }
    }

    pub fn iter(&self) -> serde_json::map::Iter<'_> {
        self.inner.iter()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl From<Vars> for Value {
    fn from(vars: Vars) -> Self {
        Value::Object(vars.inner)
    }
}

impl From<Map<String, Value>> for Vars {
    fn from(inner: Map<String, Value>) -> Self {
        Self {
            inner,
        }
    }
}

impl From<Value> for Vars {
    /// An object becomes its field map; any other value becomes an empty bag.
    fn from(value: Value) -> Self {
        match value {
            Value::Object(inner) => Self {
                inner,
            },
            _ => Self::new(),
        }
    }
}
