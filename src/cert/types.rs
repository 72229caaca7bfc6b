// cert/types.rs
use std::path::{Path, PathBuf};

/// First address of the service range; the API server's in-cluster address.
pub const KUBERNETES_SERVICE_IP: &str = "10.32.0.1";

pub const KUBERNETES_HOSTNAMES: [&str; 5] = [
    "kubernetes",
    "kubernetes.default",
    "kubernetes.default.svc",
    "kubernetes.default.svc.cluster",
    "kubernetes.svc.cluster.local",
];

pub const SIGNING_PROFILE: &str = "kubernetes";
pub const CERTS_ARCHIVE: &str = "k8s-certs.tar.gz";

#[derive(Debug, Clone, PartialEq)]
pub enum CertificateType {
    CA,
    Admin,
    Node(String),
    ControllerManager,
    KubeProxy,
    Scheduler,
    APIServer,
    ServiceAccount,
}

impl CertificateType {
    /// Output prefix handed to `cfssljson -bare`; yields `<stem>.pem`,
    /// `<stem>-key.pem` and `<stem>.csr`.
    pub fn file_stem(&self) -> &str {
        match self {
            CertificateType::CA => "ca",
            CertificateType::Admin => "admin",
            CertificateType::Node(name) => name,
            CertificateType::ControllerManager => "kube-controller-manager",
            CertificateType::KubeProxy => "kube-proxy",
            CertificateType::Scheduler => "kube-scheduler",
            CertificateType::APIServer => "kubernetes",
            CertificateType::ServiceAccount => "service-account",
        }
    }

    pub fn csr_template(&self) -> &'static str {
        match self {
            CertificateType::CA => "ca-csr.json",
            CertificateType::Admin => "admin-csr.json",
            CertificateType::Node(_) => "worker-csr.json",
            CertificateType::ControllerManager => "kube-controller-manager-csr.json",
            CertificateType::KubeProxy => "kube-proxy-csr.json",
            CertificateType::Scheduler => "kube-scheduler-csr.json",
            CertificateType::APIServer => "kubernetes-csr.json",
            CertificateType::ServiceAccount => "service-account-csr.json",
        }
    }

    pub fn description(&self) -> String {
        match self {
            CertificateType::CA => "certificate authority".to_string(),
            CertificateType::Admin => "admin client".to_string(),
            CertificateType::Node(name) => format!("{} kubelet", name),
            CertificateType::ControllerManager => "kube-controller-manager client".to_string(),
            CertificateType::KubeProxy => "kube-proxy client".to_string(),
            CertificateType::Scheduler => "kube-scheduler client".to_string(),
            CertificateType::APIServer => "API server".to_string(),
            CertificateType::ServiceAccount => "service account".to_string(),
        }
    }
}

/// One signing request against the cluster CA.
#[derive(Debug, Clone)]
pub struct CertificateConfig {
    pub cert_type: CertificateType,
    pub csr_path: PathBuf,
    pub hostnames: Vec<String>,
}

impl CertificateConfig {
    pub fn new(cert_type: CertificateType, csr_path: PathBuf) -> Self {
        Self {
            cert_type,
            csr_path,
            hostnames: Vec::new(),
        }
    }

    pub fn with_hostnames(mut self, hostnames: Vec<String>) -> Self {
        self.hostnames = hostnames;
        self
    }
}

/// Locations of the CA material inside the certificates directory.
#[derive(Debug, Clone)]
pub struct CaFiles {
    pub cert: PathBuf,
    pub key: PathBuf,
    pub csr: PathBuf,
}

impl CaFiles {
    pub fn in_dir(certs_dir: &Path) -> Self {
        Self {
            cert: certs_dir.join("ca.pem"),
            key: certs_dir.join("ca-key.pem"),
            csr: certs_dir.join("ca.csr"),
        }
    }
}

/// The CSR and signing-config files read from `templatesPath`.
#[derive(Debug, Clone)]
pub struct TemplateFiles {
    dir: PathBuf,
}

impl TemplateFiles {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn ca_config(&self) -> PathBuf {
        self.dir.join("ca-config.json")
    }

    pub fn csr(&self, cert_type: &CertificateType) -> PathBuf {
        self.dir.join(cert_type.csr_template())
    }

    /// Files that must exist before any certificate is generated.
    pub fn prerequisites(&self) -> Vec<PathBuf> {
        vec![
            self.ca_config(),
            self.csr(&CertificateType::CA),
            self.csr(&CertificateType::Admin),
            self.csr(&CertificateType::Node(String::new())),
        ]
    }
}
