// src/kubeconfig/inspect.rs
use super::kube::{CLUSTER_NAME, CONTEXT_NAME};
use super::KubeConfigError;
use glob::{glob, Pattern};
use serde::Deserialize;
use std::{
    fs, io,
    path::{Path, PathBuf},
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct KubeConfig {
    #[serde(default)]
    pub clusters: Vec<NamedCluster>,
    #[serde(default)]
    pub users: Vec<NamedUser>,
    #[serde(default)]
    pub contexts: Vec<NamedContext>,
    pub current_context: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NamedCluster {
    pub name: String,
    pub cluster: ClusterEntry,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ClusterEntry {
    pub server: String,
    pub certificate_authority_data: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NamedUser {
    pub name: String,
    pub user: UserEntry,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UserEntry {
    pub client_certificate_data: Option<String>,
    pub client_key_data: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NamedContext {
    pub name: String,
    pub context: ContextEntry,
}

#[derive(Debug, Deserialize)]
pub struct ContextEntry {
    pub cluster: String,
    pub user: String,
}

impl KubeConfig {
    pub fn load(path: &Path) -> Result<Self, KubeConfigError> {
        let contents = fs::read_to_string(path)?;
        serde_yaml::from_str(&contents).map_err(|source| KubeConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Everything that would stop this file from working as generated.
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if self.current_context.as_deref() != Some(CONTEXT_NAME) {
            problems.push(format!(
                "current-context is {:?}, expected {:?}",
                self.current_context, CONTEXT_NAME
            ));
        }

        match self.clusters.iter().find(|c| c.name == CLUSTER_NAME) {
            Some(named) => {
                if named.cluster.certificate_authority_data.is_none() {
                    problems.push(format!("cluster {} has no embedded CA", CLUSTER_NAME));
                }
                if !named.cluster.server.starts_with("https://") {
                    problems.push(format!("cluster {} server is not https: {}", CLUSTER_NAME, named.cluster.server));
                }
            }
            None => problems.push(format!("no cluster named {}", CLUSTER_NAME)),
        }

        let Some(context) = self.contexts.iter().find(|c| c.name == CONTEXT_NAME) else {
            problems.push(format!("no context named {}", CONTEXT_NAME));
            return problems;
        };

        if context.context.cluster != CLUSTER_NAME {
            problems.push(format!("context {} points at cluster {}", CONTEXT_NAME, context.context.cluster));
        }

        match self.users.iter().find(|u| u.name == context.context.user) {
            Some(user) => {
                if user.user.client_certificate_data.is_none() || user.user.client_key_data.is_none() {
                    problems.push(format!("user {} has no embedded credentials", user.name));
                }
            }
            None => problems.push(format!("context user {} is not defined", context.context.user)),
        }

        problems
    }
}

pub fn kubeconfig_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let pattern = format!("{}/*.kubeconfig", Pattern::escape(&dir.display().to_string()));
    let entries = glob(&pattern).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    let mut files = Vec::new();
    for entry in entries {
        files.push(entry.map_err(io::Error::from)?);
    }
    files.sort();
    Ok(files)
}

/// Checks every kubeconfig in `dir`; problems are prefixed with the file path.
pub fn verify_kubeconfigs(dir: &Path) -> Result<Vec<String>, KubeConfigError> {
    let files = kubeconfig_files(dir)?;
    let mut problems = Vec::new();

    if files.is_empty() {
        problems.push(format!("no kubeconfig files in {}", dir.display()));
    }

    for path in files {
        match KubeConfig::load(&path) {
            Ok(kubeconfig) => {
                let found = kubeconfig.problems();
                if found.is_empty() {
                    tracing::info!(path = %path.display(), "kubeconfig ok");
                }
                problems.extend(found.into_iter().map(|p| format!("{}: {}", path.display(), p)));
            }
            Err(e) => problems.push(format!("{}: {}", path.display(), e)),
        }
    }

    Ok(problems)
}
