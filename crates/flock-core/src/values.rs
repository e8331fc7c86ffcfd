//! Generic configuration trees with override-merge support
//!
//! Every layered file, playbook document and cluster data blob is held as a
//! `Values` tree until the decode boundary. Merging is override-merge: maps
//! merge recursively key by key, any other type replaces the prior value at
//! that path wholesale. The fold is a pure function of input order, so
//! re-running a merge with identical inputs yields an identical tree.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::path::Path;

use crate::error::{CoreError, Result};

/// Values container with override-merge capability
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Values(pub JsonValue);

impl Values {
    /// Create an empty tree (an empty map)
    pub fn new() -> Self {
        Self(JsonValue::Object(serde_json::Map::new()))
    }

    /// Load a tree from a structured file, JSON or YAML by extension
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        if path.extension().is_some_and(|e| e == "json") {
            Self::from_json(&content)
        } else {
            Self::from_yaml(&content)
        }
    }

    /// Parse a tree from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let value: JsonValue = serde_yaml::from_str(yaml)?;
        Ok(Self(value))
    }

    /// Parse a tree from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        let value: JsonValue = serde_json::from_str(json)?;
        Ok(Self(value))
    }

    /// Override-merge another tree into this one
    ///
    /// Rules:
    /// - Maps: recursive merge, key by key
    /// - Scalars and lists: overlay replaces base
    pub fn merge(&mut self, overlay: &Values) {
        override_merge(&mut self.0, &overlay.0);
    }

    /// Fold a sequence of trees in order, least priority first
    pub fn merge_all<I: IntoIterator<Item = Values>>(layers: I) -> Self {
        let mut result = Values::new();
        for layer in layers {
            result.merge(&layer);
        }
        result
    }

    /// Remove the given top-level keys, if present
    pub fn prune(&mut self, keys: &[&str]) {
        if let JsonValue::Object(map) = &mut self.0 {
            for key in keys {
                map.remove(*key);
            }
        }
    }

    /// Set a value by dotted path (e.g., "image.tag")
    pub fn set(&mut self, path: &str, value: JsonValue) {
        let parts: Vec<&str> = path.split('.').collect();
        set_nested(&mut self.0, &parts, value);
    }

    /// Get a value by dotted path
    pub fn get(&self, path: &str) -> Option<&JsonValue> {
        let parts: Vec<&str> = path.split('.').collect();
        get_nested(&self.0, &parts)
    }

    /// Borrow the inner JSON value
    pub fn inner(&self) -> &JsonValue {
        &self.0
    }

    /// Convert into the inner JSON value
    pub fn into_inner(self) -> JsonValue {
        self.0
    }

    /// Check whether the tree carries no data
    pub fn is_empty(&self) -> bool {
        match &self.0 {
            JsonValue::Object(map) => map.is_empty(),
            JsonValue::Null => true,
            _ => false,
        }
    }

    /// Render the tree as YAML
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(&self.0)?)
    }
}

impl From<JsonValue> for Values {
    fn from(value: JsonValue) -> Self {
        Self(value)
    }
}

/// Override-merge two JSON values in place
fn override_merge(base: &mut JsonValue, overlay: &JsonValue) {
    match (base, overlay) {
        (JsonValue::Object(base_map), JsonValue::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                match base_map.get_mut(key) {
                    Some(base_value) => override_merge(base_value, overlay_value),
                    None => {
                        base_map.insert(key.clone(), overlay_value.clone());
                    }
                }
            }
        }
        (base, overlay) => {
            *base = overlay.clone();
        }
    }
}

/// Set a nested value by path, creating intermediate maps as needed
fn set_nested(value: &mut JsonValue, path: &[&str], new_value: JsonValue) {
    if path.is_empty() {
        *value = new_value;
        return;
    }

    if !value.is_object() {
        *value = JsonValue::Object(serde_json::Map::new());
    }

    let map = value
        .as_object_mut()
        .expect("value is an object after initialization");

    let key = path[0];
    let remaining = &path[1..];

    if remaining.is_empty() {
        map.insert(key.to_string(), new_value);
    } else {
        let entry = map
            .entry(key.to_string())
            .or_insert_with(|| JsonValue::Object(serde_json::Map::new()));
        set_nested(entry, remaining, new_value);
    }
}

/// Get a nested value by path
fn get_nested<'a>(value: &'a JsonValue, path: &[&str]) -> Option<&'a JsonValue> {
    if path.is_empty() {
        return Some(value);
    }

    match value {
        JsonValue::Object(map) => map.get(path[0]).and_then(|v| get_nested(v, &path[1..])),
        _ => None,
    }
}

/// Parse --set arguments (key=value format) into a tree
pub fn parse_set_values(set_args: &[String]) -> Result<Values> {
    let mut values = Values::new();

    for arg in set_args {
        let (key, val) = arg.split_once('=').ok_or_else(|| CoreError::Values {
            message: format!("Invalid --set format: '{}'. Expected key=value", arg),
        })?;

        // Try to parse as a typed scalar, fall back to string
        let json_value = if val == "true" {
            JsonValue::Bool(true)
        } else if val == "false" {
            JsonValue::Bool(false)
        } else if val == "null" {
            JsonValue::Null
        } else if let Ok(num) = val.parse::<i64>() {
            JsonValue::Number(num.into())
        } else if let Ok(num) = val.parse::<f64>() {
            JsonValue::Number(serde_json::Number::from_f64(num).unwrap_or(0.into()))
        } else if val.starts_with('[') || val.starts_with('{') {
            serde_json::from_str(val).unwrap_or(JsonValue::String(val.to_string()))
        } else {
            JsonValue::String(val.to_string())
        };

        values.set(key, json_value);
    }

    Ok(values)
}
