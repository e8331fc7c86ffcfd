//! Folding per-group value files into one tree
//!
//! For each group, in resolved-group order, three file classes are
//! discovered under the values root, ascending priority within the group:
//!
//! 1. a same-named subdirectory, walked recursively in lexical order per
//!    level with directories contributing before files at the same level;
//! 2. `group.{json,yaml,yml}` directly in the root;
//! 3. a `group.sops.*` envelope, always merged last for that group.
//!
//! The concatenated file list is folded with override-merge. A group with
//! no matching files contributes nothing; that is not an error. Discovery
//! results are cached per merger instance, never globally.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use flock_core::Values;

use crate::error::{ResolveError, Result, strip_ansi};
use crate::evaluator::Evaluator;
use crate::layer::{PRUNE_KEYS, is_value_file, load_layer};
use crate::secrets::SecretDecryptor;

/// The outcome of a merge: the raw fold, and the evaluated tree unless
/// evaluation was skipped
#[derive(Debug, Clone)]
pub struct MergedValues {
    raw: Values,
    evaluated: Option<Values>,
}

impl MergedValues {
    /// Assemble a merge outcome directly, for callers that layer values
    /// through other means
    pub fn new(raw: Values, evaluated: Option<Values>) -> Self {
        Self { raw, evaluated }
    }

    /// The pre-evaluation fold, always retrievable
    pub fn raw(&self) -> &Values {
        &self.raw
    }

    /// The evaluator's output, if evaluation ran
    pub fn evaluated(&self) -> Option<&Values> {
        self.evaluated.as_ref()
    }

    /// The final tree: evaluated when available, raw otherwise
    pub fn final_tree(&self) -> &Values {
        self.evaluated.as_ref().unwrap_or(&self.raw)
    }

    /// Consume into the final tree
    pub fn into_final(self) -> Values {
        self.evaluated.unwrap_or(self.raw)
    }
}

/// Discovers and folds the value layers for one ordered group list
pub struct LayerMerger<'a> {
    root: PathBuf,
    decryptor: Option<&'a dyn SecretDecryptor>,
    evaluator: Option<&'a dyn Evaluator>,
    overrides: Option<&'a Values>,
    // per-instance discovery cache, keyed by group
    discovered: HashMap<String, Vec<PathBuf>>,
}

impl<'a> LayerMerger<'a> {
    /// Create a merger over a values root with decryption and evaluation
    /// both skipped
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            decryptor: None,
            evaluator: None,
            overrides: None,
            discovered: HashMap::new(),
        }
    }

    /// Decrypt envelope files through the given collaborator
    pub fn with_decryptor(mut self, decryptor: &'a dyn SecretDecryptor) -> Self {
        self.decryptor = Some(decryptor);
        self
    }

    /// Submit the folded tree to the given evaluator
    pub fn with_evaluator(mut self, evaluator: &'a dyn Evaluator) -> Self {
        self.evaluator = Some(evaluator);
        self
    }

    /// Merge a final override tree on top of every fold, before evaluation
    pub fn with_overrides(mut self, overrides: &'a Values) -> Self {
        self.overrides = Some(overrides);
        self
    }

    /// Fold all applicable files for the given group order into one tree
    pub fn merge(&mut self, groups: &[String]) -> Result<MergedValues> {
        if self.root.exists() && !self.root.is_dir() {
            return Err(ResolveError::NotADirectory {
                path: self.root.clone(),
            });
        }

        let mut files = Vec::new();
        for group in groups {
            files.extend(self.discover(group)?);
        }

        let mut raw = Values::new();
        for file in &files {
            let layer = load_layer(file, self.decryptor)?;
            raw.merge(&layer);
        }
        raw.prune(PRUNE_KEYS);

        if let Some(overrides) = self.overrides {
            raw.merge(overrides);
        }

        let evaluated = match self.evaluator {
            Some(evaluator) => Some(evaluator.evaluate(&raw, PRUNE_KEYS).map_err(|e| {
                ResolveError::Evaluation {
                    message: strip_ansi(&e.message),
                }
            })?),
            None => None,
        };

        Ok(MergedValues { raw, evaluated })
    }

    /// The ordered file list one group contributes
    pub fn discover(&mut self, group: &str) -> Result<Vec<PathBuf>> {
        if let Some(cached) = self.discovered.get(group) {
            return Ok(cached.clone());
        }

        let mut files = Vec::new();

        let subdir = self.root.join(group);
        if subdir.is_dir() {
            files.extend(walk_sorted(&subdir)?);
        }

        // Fixed lexical extension order keeps runs deterministic even when
        // more than one root-level file exists for a group
        for ext in ["json", "yaml", "yml"] {
            let candidate = self.root.join(format!("{}.{}", group, ext));
            if candidate.is_file() {
                files.push(candidate);
            }
        }

        for ext in ["json", "yaml", "yml"] {
            let candidate = self.root.join(format!("{}.sops.{}", group, ext));
            if candidate.is_file() {
                files.push(candidate);
            }
        }

        tracing::debug!("group {} contributes {} file(s)", group, files.len());
        self.discovered.insert(group.to_string(), files.clone());
        Ok(files)
    }
}

/// Walk a directory recursively: lexical order per level, directories
/// before files at the same level
fn walk_sorted(dir: &Path) -> Result<Vec<PathBuf>> {
    let walker = WalkDir::new(dir).sort_by(|a, b| {
        (a.file_type().is_file(), a.file_name()).cmp(&(b.file_type().is_file(), b.file_name()))
    });

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|e| ResolveError::Io(e.into()))?;
        if entry.file_type().is_file() && is_value_file(entry.path()) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}
