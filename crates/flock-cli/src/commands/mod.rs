//! CLI command implementations

pub mod playbook;
pub mod targets;
pub mod values;
