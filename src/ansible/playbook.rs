use crate::config::{scalar_to_string, AnsibleSettings};
use serde_json::{Map, Value};
use std::collections::HashMap;

pub const PLAYBOOK_TEMPLATE: &str = "ansible-playbook.yml";

// Continuation lines of a YAML list nested under a `vars:` key.
const LIST_SEPARATOR: &str = "\n      ";

/// `- <name>: <value>` per entry, joined so each lands on its own list line.
pub fn yaml_list(entries: &Map<String, Value>) -> String {
    entries
        .iter()
        .map(|(name, value)| format!("- {}: {}", name, scalar_to_string(value)))
        .collect::<Vec<_>>()
        .join(LIST_SEPARATOR)
}

/// Substitution values for the playbook template.
pub fn playbook_values(settings: &AnsibleSettings, public_address: &str) -> HashMap<&'static str, String> {
    HashMap::from([
        ("etcd_servers", yaml_list(&settings.etcd_servers)),
        ("pod_cidr", yaml_list(&settings.pod_cidr)),
        ("kubernetes_version", settings.kubernetes_version.clone()),
        ("kubernetes_public_address", public_address.to_string()),
        ("kube_apiserver_count", scalar_to_string(&settings.kube_api_server_count)),
        ("cluster_dns", settings.cluster_dns.clone()),
        ("cluster_cidr", settings.cluster_cidr.clone()),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn settings() -> AnsibleSettings {
        serde_json::from_value(json!({
            "etcdServers": {"controller-0": "10.240.0.10", "controller-1": "10.240.0.11"},
            "podCIDR": {"worker-0": "10.200.0.0/24"},
            "kubernetesVersion": "v1.12.0",
            "kubeAPIServerCount": 2,
            "clusterDNS": "10.32.0.10",
            "cluster_cidr": "10.200.0.0/16"
        }))
        .unwrap()
    }

    #[test]
    fn list_entries_are_joined_with_indent() {
        assert_eq!(
            yaml_list(&settings().etcd_servers),
            "- controller-0: 10.240.0.10\n      - controller-1: 10.240.0.11"
        );
    }

    #[test]
    fn empty_list_renders_nothing() {
        assert_eq!(yaml_list(&Map::new()), "");
    }

    #[test]
    fn numeric_server_count_is_rendered_bare() {
        let values = playbook_values(&settings(), "35.1.2.3");
        assert_eq!(values["kube_apiserver_count"], "2");
        assert_eq!(values["kubernetes_public_address"], "35.1.2.3");
        assert_eq!(values["pod_cidr"], "- worker-0: 10.200.0.0/24");
        assert_eq!(values.len(), 7);
    }
}
