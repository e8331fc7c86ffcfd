//! Building target and playbook sets for a selection of inventory entries
//!
//! One resolver invocation selects entries by name filter and limit
//! expressions, runs one layer merge per entry, and materializes one
//! playbook per target. Each target's result is a pure function of its own
//! inputs; the reference behavior is sequential and the first failing
//! target aborts the whole build with no partial sets.

use std::collections::BTreeMap;
use std::path::PathBuf;

use flock_core::{Entry, Inventory, PlaybookDoc, Values};

use crate::cluster::ClusterData;
use crate::error::Result;
use crate::evaluator::Evaluator;
use crate::merger::LayerMerger;
use crate::secrets::SecretDecryptor;
use crate::target::{Materializer, Target, TargetPlaybook};

/// One target per admitted inventory entry, keyed by entry name
#[derive(Debug, Default)]
pub struct TargetSet {
    targets: BTreeMap<String, Target>,
}

impl TargetSet {
    pub fn get(&self, name: &str) -> Option<&Target> {
        self.targets.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Target)> {
        self.targets.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn names(&self) -> Vec<&str> {
        self.targets.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// One materialized playbook per target, keyed by entry name
#[derive(Debug, Default)]
pub struct PlaybookSet {
    playbooks: BTreeMap<String, TargetPlaybook>,
}

impl PlaybookSet {
    pub fn get(&self, name: &str) -> Option<&TargetPlaybook> {
        self.playbooks.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TargetPlaybook)> {
        self.playbooks.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.playbooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.playbooks.is_empty()
    }
}

/// Orchestrates selection, layering and materialization for one invocation
pub struct Resolver<'a> {
    inventory: &'a Inventory,
    playbook: &'a PlaybookDoc,
    values_root: PathBuf,
    decryptor: Option<&'a dyn SecretDecryptor>,
    evaluator: Option<&'a dyn Evaluator>,
    cluster_data: Option<&'a dyn ClusterData>,
    overrides: Option<&'a Values>,
    skip_cluster_data: bool,
}

impl<'a> Resolver<'a> {
    pub fn new(
        inventory: &'a Inventory,
        playbook: &'a PlaybookDoc,
        values_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            inventory,
            playbook,
            values_root: values_root.into(),
            decryptor: None,
            evaluator: None,
            cluster_data: None,
            overrides: None,
            skip_cluster_data: false,
        }
    }

    pub fn with_decryptor(mut self, decryptor: &'a dyn SecretDecryptor) -> Self {
        self.decryptor = Some(decryptor);
        self
    }

    pub fn with_evaluator(mut self, evaluator: &'a dyn Evaluator) -> Self {
        self.evaluator = Some(evaluator);
        self
    }

    pub fn with_cluster_data(mut self, provider: &'a dyn ClusterData) -> Self {
        self.cluster_data = Some(provider);
        self
    }

    /// Merge a final override tree into every target's values
    pub fn with_overrides(mut self, overrides: &'a Values) -> Self {
        self.overrides = Some(overrides);
        self
    }

    pub fn skip_cluster_data(mut self, skip: bool) -> Self {
        self.skip_cluster_data = skip;
        self
    }

    /// Run one layer merge for a single entry
    pub fn target(&self, entry: &Entry) -> Result<Target> {
        let mut merger = LayerMerger::new(&self.values_root);
        if let Some(decryptor) = self.decryptor {
            merger = merger.with_decryptor(decryptor);
        }
        if let Some(evaluator) = self.evaluator {
            merger = merger.with_evaluator(evaluator);
        }
        if let Some(overrides) = self.overrides {
            merger = merger.with_overrides(overrides);
        }

        let values = merger.merge(&entry.resolved_groups())?;
        Ok(Target {
            entry: entry.clone(),
            values,
        })
    }

    /// Build one target per entry admitted by the name filter and limit
    pub fn targets(&self, name_filter: &str, limit: &[String]) -> Result<TargetSet> {
        let mut targets = BTreeMap::new();
        for entry in self.inventory.select(name_filter, limit)? {
            let target = self.target(entry)?;
            targets.insert(entry.name.clone(), target);
        }
        Ok(TargetSet { targets })
    }

    /// Build targets and their materialized playbooks in one pass
    pub fn playbooks(&self, name_filter: &str, limit: &[String]) -> Result<(TargetSet, PlaybookSet)> {
        let targets = self.targets(name_filter, limit)?;

        let mut materializer = Materializer::new().skip_cluster_data(self.skip_cluster_data);
        if let Some(evaluator) = self.evaluator {
            materializer = materializer.with_evaluator(evaluator);
        }
        if let Some(provider) = self.cluster_data {
            materializer = materializer.with_cluster_data(provider);
        }

        let mut playbooks = BTreeMap::new();
        for (name, target) in targets.iter() {
            let playbook = materializer.materialize(&self.playbook.plays, target)?;
            playbooks.insert(name.to_string(), playbook);
        }

        Ok((targets, PlaybookSet { playbooks }))
    }
}
