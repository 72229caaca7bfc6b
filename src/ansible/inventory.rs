use crate::config::{ConfigError, NodeConfig};
use serde::{ser::SerializeMap, Serialize, Serializer};

#[derive(Debug, Serialize)]
struct HostVars<'a> {
    ansible_host: &'a str,
    ansible_ssh_user: &'a str,
}

/// Hosts keyed by node name, in config order.
#[derive(Debug)]
struct Hosts<'a>(Vec<(&'a str, HostVars<'a>)>);

impl Serialize for Hosts<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, vars) in &self.0 {
            map.serialize_entry(name, vars)?;
        }
        map.end()
    }
}

#[derive(Debug, Serialize)]
struct Group<'a> {
    hosts: Hosts<'a>,
}

impl<'a> Group<'a> {
    fn from_nodes(nodes: &'a [NodeConfig]) -> Result<Self, ConfigError> {
        let mut hosts = Vec::with_capacity(nodes.len());
        for node in nodes {
            hosts.push((
                node.name.as_str(),
                HostVars {
                    ansible_host: &node.external_ip,
                    ansible_ssh_user: node.ssh_user()?,
                },
            ));
        }
        Ok(Self { hosts: Hosts(hosts) })
    }
}

#[derive(Debug, Serialize)]
pub struct Inventory<'a> {
    controllers: Group<'a>,
    workers: Group<'a>,
}

impl<'a> Inventory<'a> {
    pub fn new(controllers: &'a [NodeConfig], workers: &'a [NodeConfig]) -> Result<Self, ConfigError> {
        Ok(Self {
            controllers: Group::from_nodes(controllers)?,
            workers: Group::from_nodes(workers)?,
        })
    }

    pub fn render(&self) -> Result<String, serde_yaml::Error> {
        Ok(format!("---\n{}", serde_yaml::to_string(self)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(name: &str, ip: &str) -> NodeConfig {
        NodeConfig {
            name: name.to_string(),
            external_ip: ip.to_string(),
            internal_ip: None,
            ssh_user: Some("ubuntu".to_string()),
        }
    }

    #[test]
    fn renders_groups_in_config_order() {
        let controllers = vec![node("controller-1", "35.0.0.11"), node("controller-0", "35.0.0.10")];
        let workers = vec![node("worker-0", "35.0.0.20")];

        let rendered = Inventory::new(&controllers, &workers).unwrap().render().unwrap();

        assert_eq!(
            rendered,
            "---\n\
             controllers:\n  hosts:\n    \
             controller-1:\n      ansible_host: 35.0.0.11\n      ansible_ssh_user: ubuntu\n    \
             controller-0:\n      ansible_host: 35.0.0.10\n      ansible_ssh_user: ubuntu\n\
             workers:\n  hosts:\n    \
             worker-0:\n      ansible_host: 35.0.0.20\n      ansible_ssh_user: ubuntu\n"
        );
    }

    #[test]
    fn rendered_inventory_parses_back() {
        let workers = vec![node("worker-0", "35.0.0.20"), node("worker-1", "35.0.0.21")];
        let rendered = Inventory::new(&[], &workers).unwrap().render().unwrap();

        let doc: serde_yaml::Value = serde_yaml::from_str(&rendered).unwrap();
        assert_eq!(doc["workers"]["hosts"]["worker-1"]["ansible_host"].as_str(), Some("35.0.0.21"));
    }

    #[test]
    fn node_without_ssh_user_is_rejected() {
        let mut worker = node("worker-0", "35.0.0.20");
        worker.ssh_user = None;
        let err = Inventory::new(&[], &[worker]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingNodeField { field: "sshUser", .. }));
    }
}
