// config/types.rs
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::{
    fs,
    path::{Path, PathBuf},
};

use super::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeConfig {
    pub name: String,
    #[serde(rename = "externalIP")]
    pub external_ip: String,
    #[serde(rename = "internalIP", default)]
    pub internal_ip: Option<String>,
    #[serde(default)]
    pub ssh_user: Option<String>,
}

impl NodeConfig {
    pub fn internal_ip(&self) -> Result<&str, ConfigError> {
        self.internal_ip
            .as_deref()
            .ok_or_else(|| ConfigError::missing_node_field(&self.name, "internalIP"))
    }

    pub fn ssh_user(&self) -> Result<&str, ConfigError> {
        self.ssh_user
            .as_deref()
            .ok_or_else(|| ConfigError::missing_node_field(&self.name, "sshUser"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnsibleSettings {
    /// Insertion order is kept; it is the order rendered into the playbook.
    pub etcd_servers: Map<String, Value>,
    #[serde(rename = "podCIDR")]
    pub pod_cidr: Map<String, Value>,
    pub kubernetes_version: String,
    #[serde(rename = "kubeAPIServerCount")]
    pub kube_api_server_count: Value,
    #[serde(rename = "clusterDNS")]
    pub cluster_dns: String,
    #[serde(rename = "cluster_cidr")]
    pub cluster_cidr: String,
}

/// First element of the cluster description array.
///
/// Every key is optional at parse time; each stage asks for the keys it
/// needs through the accessors, which fail with [`ConfigError::MissingField`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterConfig {
    pub workers_count: Option<usize>,
    pub controllers_count: Option<usize>,
    #[serde(rename = "staticExternalIP")]
    pub static_external_ip: Option<String>,
    pub certificates_path: Option<String>,
    pub k8s_conf_path: Option<String>,
    pub templates_path: Option<String>,
    #[serde(default)]
    pub controllers: Vec<NodeConfig>,
    #[serde(default)]
    pub workers: Vec<NodeConfig>,
    pub ansible_inventory: Option<String>,
    pub ansible_playbook: Option<String>,
    pub ansible_settings: Option<AnsibleSettings>,
}

impl ClusterConfig {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> Result<Self, ConfigError> {
        let mut entries: Vec<ClusterConfig> = serde_json::from_str(contents)?;
        if entries.is_empty() {
            return Err(ConfigError::Empty);
        }
        Ok(entries.swap_remove(0))
    }

    pub fn static_external_ip(&self) -> Result<&str, ConfigError> {
        required(&self.static_external_ip, "staticExternalIP")
    }

    pub fn certificates_path(&self) -> Result<PathBuf, ConfigError> {
        required(&self.certificates_path, "certificatesPath").map(expand_path)
    }

    pub fn k8s_conf_path(&self) -> Result<PathBuf, ConfigError> {
        required(&self.k8s_conf_path, "k8sConfPath").map(expand_path)
    }

    pub fn templates_path(&self) -> Result<PathBuf, ConfigError> {
        required(&self.templates_path, "templatesPath").map(expand_path)
    }

    pub fn ansible_inventory(&self) -> Result<PathBuf, ConfigError> {
        required(&self.ansible_inventory, "ansibleInventory").map(expand_path)
    }

    pub fn ansible_playbook(&self) -> Result<PathBuf, ConfigError> {
        required(&self.ansible_playbook, "ansiblePlaybook").map(expand_path)
    }

    pub fn ansible_settings(&self) -> Result<&AnsibleSettings, ConfigError> {
        self.ansible_settings
            .as_ref()
            .ok_or(ConfigError::MissingField("ansibleSettings"))
    }

    /// The first `workersCount` workers, or all of them when no count is set.
    pub fn active_workers(&self) -> Result<&[NodeConfig], ConfigError> {
        take_active(&self.workers, self.workers_count, "workers")
    }
}

fn required<'a>(value: &'a Option<String>, field: &'static str) -> Result<&'a str, ConfigError> {
    value.as_deref().ok_or(ConfigError::MissingField(field))
}

fn expand_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).into_owned())
}

fn take_active<'a>(
    nodes: &'a [NodeConfig],
    count: Option<usize>,
    field: &'static str,
) -> Result<&'a [NodeConfig], ConfigError> {
    match count {
        None => Ok(nodes),
        Some(declared) if declared <= nodes.len() => Ok(&nodes[..declared]),
        Some(declared) => Err(ConfigError::CountMismatch {
            field,
            declared,
            listed: nodes.len(),
        }),
    }
}

/// Renders a JSON scalar the way it reads in the config file, without quotes.
pub fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
