// src/cert/operations.rs
use super::{
    api_server::ApiServerCertGenerator,
    ca::generate_ca,
    cfssl::sign,
    node::prepare_node_request,
    types::{CaFiles, CertificateConfig, CertificateType, TemplateFiles, CERTS_ARCHIVE},
    CertOperationError,
};
use crate::config::{ClusterConfig, NodeConfig};
use crate::types::ExternalTools;
use crate::utils::{archive::archive_directory, command::CommandRunner, fs::reset_directory, template::Template};
use std::path::PathBuf;

pub struct CertificateOperations<'a> {
    runner: &'a mut dyn CommandRunner,
    tools: &'a ExternalTools,
    templates: TemplateFiles,
    certs_dir: PathBuf,
}

impl<'a> CertificateOperations<'a> {
    pub fn new(
        runner: &'a mut dyn CommandRunner,
        tools: &'a ExternalTools,
        templates_dir: PathBuf,
        certs_dir: PathBuf,
    ) -> Self {
        Self {
            runner,
            tools,
            templates: TemplateFiles::new(templates_dir),
            certs_dir,
        }
    }

    /// Full run: CA, admin, workers, control-plane clients, API server,
    /// service account, then the archive. Returns the archive path.
    pub fn generate_all(&mut self, config: &ClusterConfig) -> Result<PathBuf, CertOperationError> {
        let workers = config.active_workers()?;
        let controllers = &config.controllers;
        let static_external_ip = config.static_external_ip()?;

        self.prepare()?;
        let ca = generate_ca(self.runner, self.tools, &self.templates, &self.certs_dir)?;

        self.generate_client_cert(&ca, CertificateType::Admin)?;
        self.generate_node_certificates(&ca, workers)?;
        self.generate_client_cert(&ca, CertificateType::ControllerManager)?;
        self.generate_client_cert(&ca, CertificateType::KubeProxy)?;
        self.generate_client_cert(&ca, CertificateType::Scheduler)?;
        self.generate_api_server_cert(&ca, controllers, static_external_ip)?;
        self.generate_client_cert(&ca, CertificateType::ServiceAccount)?;

        self.archive()
    }

    /// Recreates the certificates directory and checks the required templates.
    pub fn prepare(&mut self) -> Result<(), CertOperationError> {
        tracing::info!(path = %self.certs_dir.display(), "Checking certs directory");
        reset_directory(&self.certs_dir)?;

        let mut missing = Vec::new();
        for file in self.templates.prerequisites() {
            if file.exists() {
                tracing::info!(path = %file.display(), "template found");
            } else {
                missing.push(file);
            }
        }

        if !missing.is_empty() {
            return Err(CertOperationError::MissingTemplates(missing));
        }
        Ok(())
    }

    pub fn generate_client_cert(
        &mut self,
        ca: &CaFiles,
        cert_type: CertificateType,
    ) -> Result<PathBuf, CertOperationError> {
        let csr = self.templates.csr(&cert_type);
        self.generate_cert(ca, &CertificateConfig::new(cert_type, csr))
    }

    pub fn generate_node_certificates(
        &mut self,
        ca: &CaFiles,
        workers: &[NodeConfig],
    ) -> Result<Vec<PathBuf>, CertOperationError> {
        let template_path = self.templates.csr(&CertificateType::Node(String::new()));
        let template = Template::from_file(&template_path)?;

        let mut certs = Vec::with_capacity(workers.len());
        for worker in workers {
            let request = prepare_node_request(&template, &self.certs_dir, worker)?;
            certs.push(self.generate_cert(ca, &request)?);
        }

        tracing::info!(path = %self.certs_dir.display(), count = certs.len(), "worker node certificates stored");
        Ok(certs)
    }

    pub fn generate_api_server_cert(
        &mut self,
        ca: &CaFiles,
        controllers: &[NodeConfig],
        static_external_ip: &str,
    ) -> Result<PathBuf, CertOperationError> {
        let request = ApiServerCertGenerator::new(controllers, static_external_ip).get_config(&self.templates)?;
        self.generate_cert(ca, &request)
    }

    pub fn generate_cert(
        &mut self,
        ca: &CaFiles,
        request: &CertificateConfig,
    ) -> Result<PathBuf, CertOperationError> {
        let description = request.cert_type.description();
        tracing::info!("Generating {} certificate", description);
        tracing::debug!(csr = %request.csr_path.display(), hostnames = ?request.hostnames, "signing request");

        let out_prefix = self.certs_dir.join(request.cert_type.file_stem());
        let cert = sign(
            self.runner,
            self.tools,
            ca,
            &self.templates.ca_config(),
            request,
            &out_prefix,
        )?;

        tracing::info!(path = %cert.display(), "{} certificate generated", description);
        Ok(cert)
    }

    pub fn archive(&self) -> Result<PathBuf, CertOperationError> {
        tracing::info!("Archiving certificates");
        Ok(archive_directory(&self.certs_dir, CERTS_ARCHIVE)?)
    }
}
