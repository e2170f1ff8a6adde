use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// Namespace key under which rowkeep keeps its own per-field annotations
pub const METADATA_NAMESPACE: &str = "rowkeep";

/// Key inside the namespace marking a primary-key field
pub const PRIMARY_KEY: &str = "primary_key";

/// Per-field metadata mapping
///
/// An extensible JSON object: callers may store arbitrary nested values
/// under their own keys, rowkeep only reads and writes its namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct FieldMetadata {
    data: Map<String, JsonValue>,
}

impl FieldMetadata {
    /// Create a new empty mapping
    pub fn new() -> Self {
        Self { data: Map::new() }
    }

    /// Get a value by key
    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.data.get(key)
    }

    /// Set a value by key
    pub fn set(&mut self, key: impl Into<String>, value: JsonValue) {
        self.data.insert(key.into(), value);
    }

    /// Check if a key exists
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Get the number of top-level entries
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if metadata is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Merge `extra` into the `namespace` sub-mapping
    ///
    /// Top-level keys outside the namespace are untouched, keys already in
    /// the namespace survive unless `extra` overwrites them. A namespace
    /// entry that is not an object is replaced.
    pub fn augment(mut self, namespace: &str, extra: Map<String, JsonValue>) -> Self {
        let mut merged = match self.data.remove(namespace) {
            Some(JsonValue::Object(existing)) => existing,
            _ => Map::new(),
        };
        merged.extend(extra);
        self.data
            .insert(namespace.to_string(), JsonValue::Object(merged));
        self
    }

    /// True when the namespaced `primary_key` marker is exactly `true`
    pub fn is_primary_key(&self) -> bool {
        self.data
            .get(METADATA_NAMESPACE)
            .and_then(|ns| ns.get(PRIMARY_KEY))
            .and_then(JsonValue::as_bool)
            .unwrap_or(false)
    }
}

impl From<Map<String, JsonValue>> for FieldMetadata {
    fn from(data: Map<String, JsonValue>) -> Self {
        Self { data }
    }
}

impl From<FieldMetadata> for Map<String, JsonValue> {
    fn from(metadata: FieldMetadata) -> Self {
        metadata.data
    }
}

/// Mark field metadata as primary key
///
/// Accepts the field's existing metadata (or `None`) and returns it with
/// the namespaced marker applied. Applying it twice yields the same mapping.
pub fn primary_key(old_metadata: Option<FieldMetadata>) -> FieldMetadata {
    let mut marker = Map::new();
    marker.insert(PRIMARY_KEY.to_string(), JsonValue::Bool(true));
    old_metadata
        .unwrap_or_default()
        .augment(METADATA_NAMESPACE, marker)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn meta(v: JsonValue) -> FieldMetadata {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn test_primary_key_from_nothing() {
        let expected = meta(json!({"rowkeep": {"primary_key": true}}));
        assert_eq!(primary_key(None), expected);
        assert_eq!(primary_key(Some(FieldMetadata::new())), expected);
        assert_eq!(primary_key(Some(primary_key(None))), expected);
    }

    #[test]
    fn test_primary_key_keeps_unrelated_top_level_keys() {
        let base = meta(json!({"something": "else"}));
        let expected = meta(json!({"something": "else", "rowkeep": {"primary_key": true}}));
        assert_eq!(primary_key(Some(base.clone())), expected);
        assert_eq!(primary_key(Some(primary_key(Some(base)))), expected);
    }

    #[test]
    fn test_primary_key_keeps_namespace_siblings() {
        let base = meta(json!({"rowkeep": {"future_prop": "x"}}));
        let expected = meta(json!({"rowkeep": {"primary_key": true, "future_prop": "x"}}));
        assert_eq!(primary_key(Some(base.clone())), expected);
        assert_eq!(primary_key(Some(primary_key(Some(base)))), expected);
    }

    #[test]
    fn test_primary_key_overrides_false_marker() {
        let base = meta(json!({"rowkeep": {"primary_key": false}}));
        assert!(!base.is_primary_key());
        assert!(primary_key(Some(base)).is_primary_key());
    }

    #[test]
    fn test_is_primary_key_requires_literal_true() {
        assert!(!FieldMetadata::new().is_primary_key());
        assert!(!meta(json!({"rowkeep": {"primary_key": 1}})).is_primary_key());
        assert!(!meta(json!({"primary_key": true})).is_primary_key());
    }
}
