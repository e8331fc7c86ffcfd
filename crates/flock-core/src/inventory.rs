//! Inventory of deployment targets
//!
//! The inventory document lists every deploy target (entry) together with
//! its declared groups, least specific first. The resolved group list for an
//! entry is derived, never stored: `all`, then the declared groups as
//! authored, then the entry's own name. Order is significant for merge
//! priority, so resolution never dedupes or sorts.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::Result;
use crate::pattern::Validator;

/// The implicit group every entry belongs to
pub const ALL_GROUP: &str = "all";

/// Reference to cluster-scoped data (namespace + configmap)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterRef {
    pub namespace: String,
    pub config_map: String,
}

/// Credential backend reference, consumed only by the external loader
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialSpec {
    /// Backend name (e.g. "s3", "file")
    pub backend: String,

    /// Backend-specific parameters, opaque to the resolver
    #[serde(default)]
    pub params: BTreeMap<String, String>,
}

/// One deploy target's identity record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    /// Unique target name
    pub name: String,

    /// Declared groups, least specific to most specific, as authored
    #[serde(default)]
    pub groups: Vec<String>,

    /// Where cluster-scoped data lives, if any
    #[serde(default)]
    pub cluster: Option<ClusterRef>,

    /// How the external credential loader fetches kubeconfig material
    #[serde(default)]
    pub credentials: Option<CredentialSpec>,
}

impl Entry {
    /// The ordered group list used for merge priority and admission
    ///
    /// Always starts with `all` and ends with the entry's own name.
    /// Duplicates are left in place: matching is order-insensitive, merge
    /// priority is not.
    pub fn resolved_groups(&self) -> Vec<String> {
        let mut resolved = Vec::with_capacity(self.groups.len() + 2);
        resolved.push(ALL_GROUP.to_string());
        resolved.extend(self.groups.iter().cloned());
        resolved.push(self.name.clone());
        resolved
    }
}

/// The inventory document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Inventory {
    #[serde(default)]
    pub entries: Vec<Entry>,
}

impl Inventory {
    /// Load the inventory from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse the inventory from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Get an entry by exact name
    pub fn get(&self, name: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Select entries by name filter and limit expressions
    ///
    /// The name filter is an anchored regex over entry names; empty admits
    /// every entry. Limit expressions are group selector patterns evaluated
    /// against each entry's resolved groups; no expressions means
    /// unconditional admission. A name or limit that matches nothing yields
    /// an empty selection, not an error; a malformed expression is fatal.
    pub fn select(&self, name_filter: &str, limit: &[String]) -> Result<Vec<&Entry>> {
        let name_regex = if name_filter.is_empty() {
            None
        } else {
            Some(regex::Regex::new(&format!("^{}$", name_filter))?)
        };

        let mut selected = Vec::new();
        for entry in &self.entries {
            if let Some(regex) = &name_regex {
                if !regex.is_match(&entry.name) {
                    continue;
                }
            }

            if !limit.is_empty() {
                let validator = Validator::compile(limit, &entry.resolved_groups())?;
                if !validator.valid() {
                    continue;
                }
            }

            selected.push(entry);
        }

        Ok(selected)
    }
}
