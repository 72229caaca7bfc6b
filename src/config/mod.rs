mod types;

pub use types::{scalar_to_string, AnsibleSettings, ClusterConfig, NodeConfig};

use std::{io, path::PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to locate config file: {}", .0.display())]
    NotFound(PathBuf),
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid cluster config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("cluster config contains no entries")]
    Empty,
    #[error("cluster config is missing `{0}`")]
    MissingField(&'static str),
    #[error("node {node} is missing `{field}`")]
    MissingNodeField { node: String, field: &'static str },
    #[error("{field} count is {declared} but only {listed} are listed")]
    CountMismatch {
        field: &'static str,
        declared: usize,
        listed: usize,
    },
}

impl ConfigError {
    pub(crate) fn missing_node_field(node: &str, field: &'static str) -> Self {
        ConfigError::MissingNodeField {
            node: node.to_string(),
            field,
        }
    }
}
