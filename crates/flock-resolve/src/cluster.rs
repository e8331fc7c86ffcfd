//! Cluster-scoped data providers
//!
//! The materializer fetches cluster data through the `ClusterData` trait;
//! the kube-backed provider lives outside this crate. `FileClusterData`
//! reads per-location YAML files from a directory so the pipeline can run
//! against fixtures or exported configmaps.

use std::path::PathBuf;

use flock_core::{ClusterRef, Values};

use crate::error::{ResolveError, Result};

/// The external cluster data contract
pub trait ClusterData {
    /// Fetch the tree stored at the given location
    fn fetch(&self, location: &ClusterRef) -> Result<Values>;
}

/// File-backed provider: `<dir>/<namespace>/<configMap>.yaml` per location
pub struct FileClusterData {
    dir: PathBuf,
}

impl FileClusterData {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ClusterData for FileClusterData {
    fn fetch(&self, location: &ClusterRef) -> Result<Values> {
        let path = self
            .dir
            .join(&location.namespace)
            .join(format!("{}.yaml", location.config_map));

        if !path.is_file() {
            return Err(ResolveError::ClusterData {
                message: format!(
                    "no data for {}/{} at {}",
                    location.namespace,
                    location.config_map,
                    path.display()
                ),
            });
        }

        Values::from_path(&path).map_err(|e| ResolveError::ClusterData {
            message: e.to_string(),
        })
    }
}
