// Helpers over the dynamic YAML value tree
use serde_yaml::{Mapping, Sequence, Value};

/// What a `key: value` entry in the services hierarchy stands for.
///
/// A sequence value makes the key a group, a mapping value makes it a
/// service. Anything else is not part of the hierarchy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HierarchyNode<'a> {
    Group(&'a Sequence),
    Service(&'a Mapping),
    Skip,
}

impl<'a> HierarchyNode<'a> {
    pub fn classify(value: &'a Value) -> Self {
        match value {
            Value::Sequence(items) => HierarchyNode::Group(items),
            Value::Mapping(fields) => HierarchyNode::Service(fields),
            _ => HierarchyNode::Skip,
        }
    }
}

/// Decode YAML text, treating malformed input as an absent document.
pub fn decode_lenient(text: &str) -> Value {
    match serde_yaml::from_str::<Value>(text) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(error = %e, "Discarding undecodable YAML document");
            Value::Null
        }
    }
}

/// Decode YAML text expected to hold a mapping; anything else yields `{}`.
pub fn decode_mapping(text: &str) -> Mapping {
    match decode_lenient(text) {
        Value::Mapping(mapping) => mapping,
        _ => Mapping::new(),
    }
}

/// String form of a scalar value. Sequences, mappings, null and tagged
/// values have none.
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Mapping keys are usually strings, but `- 2024:` is a number key.
pub fn key_to_string(key: &Value) -> Option<String> {
    scalar_to_string(key)
}

/// Look up a layout-style entry by its display name. Keys are compared in
/// string form so `2024:` is found as `"2024"`.
pub fn get_by_name<'a>(mapping: &'a Mapping, name: &str) -> Option<&'a Value> {
    mapping
        .iter()
        .find(|(key, _)| key_to_string(key).as_deref() == Some(name))
        .map(|(_, value)| value)
}

/// Borrow `key` from a value when it is a mapping.
pub fn mapping_get<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    match value {
        Value::Mapping(mapping) => mapping.get(key),
        _ => None,
    }
}

/// The `layout` map of a settings document, or empty when missing or not a map
/// (`layout: []` is common in fresh installs).
pub fn layout_of(settings: &Mapping) -> Mapping {
    match settings.get("layout") {
        Some(Value::Mapping(layout)) => layout.clone(),
        _ => Mapping::new(),
    }
}
