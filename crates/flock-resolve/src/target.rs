//! Per-target materialization
//!
//! A target is an inventory entry paired with its layered values. The
//! materializer folds three sources into one document, lowest priority
//! first: cluster-scoped data (unless skipped), the filtered playbook, and
//! the target's own layered values. The pre-evaluation tree is kept
//! unconditionally; unless evaluation is skipped, the tree is evaluated and
//! decoded into typed plays. Evaluation and decode failures are hard errors,
//! unlike the soft-fail on layer decryption.

use flock_core::{BasePlay, Entry, PlayConfig, Values, plays_to_tree};

use crate::cluster::ClusterData;
use crate::error::{ResolveError, Result, strip_ansi};
use crate::evaluator::Evaluator;
use crate::layer::PRUNE_KEYS;
use crate::merger::MergedValues;
use crate::playbook::filter_plays;

/// An inventory entry paired with its layered values
#[derive(Debug, Clone)]
pub struct Target {
    pub entry: Entry,
    pub values: MergedValues,
}

impl Target {
    pub fn name(&self) -> &str {
        &self.entry.name
    }
}

/// A target's merged playbook: the raw tree always, the typed plays only
/// when evaluation ran and decoding succeeded
#[derive(Debug, Clone)]
pub struct TargetPlaybook {
    pub raw: Values,
    pub config: Option<PlayConfig>,
}

impl TargetPlaybook {
    /// Names of decoded plays; empty when evaluation was skipped
    pub fn play_names(&self) -> Vec<&str> {
        self.config
            .as_ref()
            .map(|c| c.play_names())
            .unwrap_or_default()
    }
}

/// Builds one `TargetPlaybook` per target
pub struct Materializer<'a> {
    evaluator: Option<&'a dyn Evaluator>,
    cluster_data: Option<&'a dyn ClusterData>,
    skip_cluster_data: bool,
}

impl Default for Materializer<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> Materializer<'a> {
    /// Create a materializer with evaluation and cluster data both skipped
    pub fn new() -> Self {
        Self {
            evaluator: None,
            cluster_data: None,
            skip_cluster_data: false,
        }
    }

    pub fn with_evaluator(mut self, evaluator: &'a dyn Evaluator) -> Self {
        self.evaluator = Some(evaluator);
        self
    }

    pub fn with_cluster_data(mut self, provider: &'a dyn ClusterData) -> Self {
        self.cluster_data = Some(provider);
        self
    }

    /// Skip the cluster data merge even when a provider is wired
    pub fn skip_cluster_data(mut self, skip: bool) -> Self {
        self.skip_cluster_data = skip;
        self
    }

    /// Merge, evaluate and decode one target's playbook
    pub fn materialize(&self, plays: &[BasePlay], target: &Target) -> Result<TargetPlaybook> {
        let groups = target.entry.resolved_groups();
        let kept = filter_plays(plays, &groups)?;

        // Cluster data is the merge base; the provider hands out an owned
        // copy, so per-target mutation cannot leak across targets
        let mut merged = match (&self.cluster_data, &target.entry.cluster) {
            (Some(provider), Some(location)) if !self.skip_cluster_data => {
                provider.fetch(location)?
            }
            _ => Values::new(),
        };

        // Playbook beats cluster data, values beat both
        merged.merge(&plays_to_tree(&kept)?);
        merged.merge(target.values.final_tree());

        let config = match self.evaluator {
            Some(evaluator) => {
                let evaluated = evaluator.evaluate(&merged, PRUNE_KEYS).map_err(|e| {
                    ResolveError::Evaluation {
                        message: strip_ansi(&e.message),
                    }
                })?;
                Some(PlayConfig::from_tree(&evaluated)?)
            }
            None => None,
        };

        Ok(TargetPlaybook {
            raw: merged,
            config,
        })
    }
}
