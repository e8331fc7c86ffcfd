//! Flock Core - Core types for fleet configuration resolution
//!
//! This crate provides the foundational types used throughout Flock:
//! - `Values`: Configuration trees with override-merge support
//! - `Pattern` / `Validator`: Group selector matching and admission
//! - `Inventory` / `Entry`: Deploy target identity and group resolution
//! - `BasePlay` / `Play`: Group-gated units of deployable work

pub mod error;
pub mod inventory;
pub mod pattern;
pub mod play;
pub mod values;

pub use error::{CoreError, Result};
pub use inventory::{ALL_GROUP, ClusterRef, CredentialSpec, Entry, Inventory};
pub use pattern::{Modifier, Pattern, Validator};
pub use play::{BasePlay, ChartSpec, Play, PlayConfig, PlaybookDoc, RepoSpec, plays_to_tree};
pub use values::{Values, parse_set_values};
