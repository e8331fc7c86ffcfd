//! Resolution error types

use regex::Regex;
use std::path::PathBuf;
use std::sync::LazyLock;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error(transparent)]
    Core(#[from] flock_core::CoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("values root exists but is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    #[error("expression evaluation failed: {message}")]
    Evaluation { message: String },

    #[error("cluster data fetch failed: {message}")]
    ClusterData { message: String },

    #[error("decryption failed: {message}")]
    Decrypt { message: String },
}

pub type Result<T> = std::result::Result<T, ResolveError>;

static ANSI_ESCAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b\[[0-9;]*[A-Za-z]").expect("valid ANSI escape regex"));

/// Strip terminal color escapes from a collaborator's error message
pub fn strip_ansi(message: &str) -> String {
    ANSI_ESCAPE.replace_all(message, "").into_owned()
}
