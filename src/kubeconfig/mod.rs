mod encryption;
mod inspect;
mod kube;

pub use encryption::{EncryptionConfigGenerator, EncryptionError};
pub use inspect::verify_kubeconfigs;
pub use kube::KubeConfigGenerator;

use crate::config::ConfigError;
use crate::utils::command::CommandError;
use std::{io, path::PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum KubeConfigError {
    #[error("kubeconfig IO error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to parse {}: {source}", .path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("kubectl config {step} for {} did not succeed ({status}): {output}", .kubeconfig.display())]
    UnexpectedOutput {
        step: &'static str,
        kubeconfig: PathBuf,
        status: String,
        output: String,
    },
    #[error("kubeconfig was not created: {}", .0.display())]
    MissingOutput(PathBuf),
}
