use super::types::{CertificateConfig, CertificateType};
use super::CertOperationError;
use crate::config::NodeConfig;
use crate::utils::template::Template;
use serde::Serialize;
use serde_json::{ser::PrettyFormatter, Serializer, Value};
use std::{collections::HashMap, fs, path::Path};

/// Renders the worker CSR template for one node and re-serialises it as
/// 4-space indented JSON.
pub fn render_worker_csr(template: &Template, node_name: &str) -> Result<String, CertOperationError> {
    let values = HashMap::from([("instance", node_name.to_string())]);
    let rendered = template.substitute(&values)?;

    let csr: Value =
        serde_json::from_str(&rendered).map_err(|source| CertOperationError::InvalidCsr {
            node: node_name.to_string(),
            source,
        })?;

    let mut buf = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    csr.serialize(&mut serializer)
        .map_err(|source| CertOperationError::InvalidCsr {
            node: node_name.to_string(),
            source,
        })?;

    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// SANs for a worker's kubelet certificate: name, external and internal address.
pub fn node_hostnames(node: &NodeConfig) -> Result<Vec<String>, CertOperationError> {
    Ok(vec![
        node.name.clone(),
        node.external_ip.clone(),
        node.internal_ip()?.to_string(),
    ])
}

/// Writes `<certs_dir>/<node>-csr.json` and returns the signing request for it.
pub fn prepare_node_request(
    template: &Template,
    certs_dir: &Path,
    node: &NodeConfig,
) -> Result<CertificateConfig, CertOperationError> {
    let hostnames = node_hostnames(node)?;

    let csr_path = certs_dir.join(format!("{}-csr.json", node.name));
    fs::write(&csr_path, render_worker_csr(template, &node.name)?)?;
    tracing::debug!(node = %node.name, path = %csr_path.display(), "worker CSR written");

    Ok(CertificateConfig::new(CertificateType::Node(node.name.clone()), csr_path)
        .with_hostnames(hostnames))
}
