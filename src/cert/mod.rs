// src/cert/mod.rs
mod api_server;
mod ca;
mod cfssl;
mod node;
mod operations;
mod types;
mod verification;

pub use api_server::ApiServerCertGenerator;
pub use operations::CertificateOperations;
pub use verification::CertificateVerifier;

use crate::config::ConfigError;
use crate::utils::{command::CommandError, template::TemplateError};
use std::{io, path::PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CertOperationError {
    #[error("certificate IO error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Failed to find all pre-check files, missing: {}", display_paths(.0))]
    MissingTemplates(Vec<PathBuf>),
    #[error("worker CSR for {node} is not valid JSON: {source}")]
    InvalidCsr {
        node: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("expected file was not produced: {}", .0.display())]
    MissingOutput(PathBuf),
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
