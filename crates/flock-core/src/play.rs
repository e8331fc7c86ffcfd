//! Plays: group-gated units of deployable work
//!
//! A play is decoded twice. The lightweight `BasePlay` pass extracts only
//! the name and group patterns and keeps the remaining body as an opaque
//! payload, because chart and repository definitions may contain template
//! expressions that only resolve after the full per-target merge. The typed
//! `Play` pass runs at the decode boundary, after merge and evaluation have
//! succeeded.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::path::Path;

use crate::error::{CoreError, Result};
use crate::values::Values;

/// A play with its body still undecoded
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasePlay {
    /// Play name
    pub name: String,

    /// Group selector expressions gating this play
    #[serde(default)]
    pub groups: Vec<String>,

    /// The rest of the play body (charts, repositories), deferred
    #[serde(flatten)]
    pub payload: serde_json::Map<String, JsonValue>,
}

/// The shared playbook document, lightweight pass
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlaybookDoc {
    #[serde(default)]
    pub plays: Vec<BasePlay>,
}

impl PlaybookDoc {
    /// Load the playbook from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse the playbook from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }
}

/// Re-serialize a list of plays into a generic tree for merging
///
/// The opaque payload travels along untouched; nothing is decoded here.
pub fn plays_to_tree(plays: &[BasePlay]) -> Result<Values> {
    let mut map = serde_json::Map::new();
    map.insert("plays".to_string(), serde_json::to_value(plays)?);
    Ok(Values(JsonValue::Object(map)))
}

/// A chart deployment within a play, fully decoded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSpec {
    /// Release name
    pub name: String,

    /// Chart reference handed to the chart renderer
    pub chart: String,

    #[serde(default)]
    pub version: Option<String>,

    /// Name of a repository declared in the play
    #[serde(default)]
    pub repository: Option<String>,

    #[serde(default)]
    pub namespace: Option<String>,

    /// Value map for this chart, already merged and evaluated
    #[serde(default)]
    pub values: Values,
}

/// A chart repository referenced by charts in a play
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoSpec {
    pub name: String,
    pub url: String,
}

/// A fully decoded play
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Play {
    pub name: String,

    #[serde(default)]
    pub groups: Vec<String>,

    #[serde(default)]
    pub charts: Vec<ChartSpec>,

    #[serde(default)]
    pub repositories: Vec<RepoSpec>,
}

/// The typed playbook configuration produced at the decode boundary
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayConfig {
    #[serde(default)]
    pub plays: Vec<Play>,
}

impl PlayConfig {
    /// Decode a merged, evaluated tree into typed plays
    pub fn from_tree(tree: &Values) -> Result<Self> {
        serde_json::from_value(tree.inner().clone()).map_err(|e| CoreError::InvalidPlaybook {
            message: e.to_string(),
        })
    }

    /// Names of all decoded plays, in document order
    pub fn play_names(&self) -> Vec<&str> {
        self.plays.iter().map(|p| p.name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAYBOOK: &str = r#"
plays:
  - name: ingress
    groups: ["all"]
    repositories:
      - name: stable
        url: https://charts.example.com/stable
    charts:
      - name: nginx
        chart: ingress-nginx
        version: "4.10.0"
        repository: stable
        namespace: ingress
        values:
          controller:
            replicaCount: 2
  - name: monitoring
    groups: ["prod-.*"]
    charts:
      - name: prometheus
        chart: kube-prometheus-stack
"#;

    #[test]
    fn test_lightweight_pass_keeps_payload_opaque() {
        let doc = PlaybookDoc::from_yaml(PLAYBOOK).unwrap();

        assert_eq!(doc.plays.len(), 2);
        assert_eq!(doc.plays[0].name, "ingress");
        assert_eq!(doc.plays[0].groups, vec!["all"]);

        // Charts stay undecoded in the payload
        assert!(doc.plays[0].payload.contains_key("charts"));
        assert!(doc.plays[0].payload.contains_key("repositories"));
    }

    #[test]
    fn test_plays_to_tree_roundtrips_payload() {
        let doc = PlaybookDoc::from_yaml(PLAYBOOK).unwrap();
        let tree = plays_to_tree(&doc.plays).unwrap();

        assert_eq!(
            tree.get("plays").unwrap().as_array().unwrap().len(),
            2
        );
        // Payload content survives re-serialization
        let first = &tree.get("plays").unwrap()[0];
        assert_eq!(first["charts"][0]["chart"], "ingress-nginx");
    }

    #[test]
    fn test_full_decode() {
        let doc = PlaybookDoc::from_yaml(PLAYBOOK).unwrap();
        let tree = plays_to_tree(&doc.plays).unwrap();

        let config = PlayConfig::from_tree(&tree).unwrap();
        assert_eq!(config.play_names(), vec!["ingress", "monitoring"]);

        let ingress = &config.plays[0];
        assert_eq!(ingress.charts[0].version.as_deref(), Some("4.10.0"));
        assert_eq!(ingress.charts[0].namespace.as_deref(), Some("ingress"));
        assert_eq!(ingress.repositories[0].name, "stable");
        assert_eq!(
            ingress.charts[0].values.get("controller.replicaCount").unwrap(),
            2
        );
    }

    #[test]
    fn test_decode_failure_is_error() {
        let tree = Values::from_yaml("plays: [{name: 1}]").unwrap();
        assert!(PlayConfig::from_tree(&tree).is_err());
    }
}
