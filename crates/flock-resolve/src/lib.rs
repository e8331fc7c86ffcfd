//! Flock Resolve - Value layering and target materialization
//!
//! This crate turns an inventory, a values root directory and a shared
//! playbook into one deterministic configuration document per deploy
//! target:
//! - `LayerMerger`: folds per-group value files in priority order
//! - `filter_plays`: keeps the plays a target's groups admit
//! - `Materializer`: merges cluster data, playbook and values, then
//!   evaluates and decodes
//! - `Resolver`: orchestrates the above into target/playbook sets
//!
//! Expression evaluation and secret decryption are consumed through the
//! `Evaluator` and `SecretDecryptor` traits; `JinjaEvaluator` and
//! `SopsDecryptor` are the bundled implementations.

pub mod cluster;
pub mod error;
pub mod evaluator;
pub mod layer;
pub mod merger;
pub mod playbook;
pub mod secrets;
pub mod set;
pub mod target;

pub use cluster::{ClusterData, FileClusterData};
pub use error::{ResolveError, Result, strip_ansi};
pub use evaluator::{EvalError, Evaluator, JinjaEvaluator};
pub use layer::{ENVELOPE_MARKER_KEY, PRUNE_KEYS, is_envelope, load_layer};
pub use merger::{LayerMerger, MergedValues};
pub use playbook::filter_plays;
pub use secrets::{DecryptError, SecretDecryptor, SecretSettings, SopsDecryptor};
pub use set::{PlaybookSet, Resolver, TargetSet};
pub use target::{Materializer, Target, TargetPlaybook};
