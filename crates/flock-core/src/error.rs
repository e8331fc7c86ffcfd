//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("empty pattern expression")]
    EmptyPattern,

    #[error("only modifier given in pattern: {expression}")]
    BareModifier { expression: String },

    #[error("invalid pattern expression: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Values error: {message}")]
    Values { message: String },

    #[error("Invalid playbook: {message}")]
    InvalidPlaybook { message: String },
}

pub type Result<T> = std::result::Result<T, CoreError>;
