// src/cert/api_server.rs
use super::types::{CertificateConfig, CertificateType, TemplateFiles, KUBERNETES_HOSTNAMES, KUBERNETES_SERVICE_IP};
use crate::config::{ConfigError, NodeConfig};

pub struct ApiServerCertGenerator<'a> {
    controllers: &'a [NodeConfig],
    static_external_ip: &'a str,
}

impl<'a> ApiServerCertGenerator<'a> {
    pub fn new(controllers: &'a [NodeConfig], static_external_ip: &'a str) -> Self {
        Self {
            controllers,
            static_external_ip,
        }
    }

    /// Service IP, every controller's internal address, the public address,
    /// loopback, then the in-cluster DNS names.
    pub fn hostnames(&self) -> Result<Vec<String>, ConfigError> {
        let mut hostnames = vec![KUBERNETES_SERVICE_IP.to_string()];
        for controller in self.controllers {
            hostnames.push(controller.internal_ip()?.to_string());
        }
        hostnames.push(self.static_external_ip.to_string());
        hostnames.push("127.0.0.1".to_string());
        hostnames.extend(KUBERNETES_HOSTNAMES.iter().map(|h| h.to_string()));
        Ok(hostnames)
    }

    pub fn get_config(&self, templates: &TemplateFiles) -> Result<CertificateConfig, ConfigError> {
        let cert_type = CertificateType::APIServer;
        let csr = templates.csr(&cert_type);
        Ok(CertificateConfig::new(cert_type, csr).with_hostnames(self.hostnames()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn controller(name: &str, internal: &str) -> NodeConfig {
        NodeConfig {
            name: name.to_string(),
            external_ip: "35.0.0.1".to_string(),
            internal_ip: Some(internal.to_string()),
            ssh_user: None,
        }
    }

    #[test]
    fn hostname_list_matches_cluster_layout() {
        let controllers = vec![
            controller("controller-0", "10.240.0.10"),
            controller("controller-1", "10.240.0.11"),
        ];
        let generator = ApiServerCertGenerator::new(&controllers, "35.1.2.3");

        assert_eq!(
            generator.hostnames().unwrap().join(","),
            "10.32.0.1,10.240.0.10,10.240.0.11,35.1.2.3,127.0.0.1,\
             kubernetes,kubernetes.default,kubernetes.default.svc,\
             kubernetes.default.svc.cluster,kubernetes.svc.cluster.local"
        );
    }

    #[test]
    fn config_points_at_kubernetes_csr() {
        let controllers = vec![controller("controller-0", "10.240.0.10")];
        let config = ApiServerCertGenerator::new(&controllers, "35.1.2.3")
            .get_config(&TemplateFiles::new(PathBuf::from("tpl")))
            .unwrap();
        assert_eq!(config.csr_path, PathBuf::from("tpl/kubernetes-csr.json"));
        assert_eq!(config.cert_type.file_stem(), "kubernetes");
    }

    #[test]
    fn controller_without_internal_ip_is_rejected() {
        let mut c = controller("controller-0", "unused");
        c.internal_ip = None;
        let controllers = vec![c];
        assert!(ApiServerCertGenerator::new(&controllers, "35.1.2.3").hostnames().is_err());
    }
}
