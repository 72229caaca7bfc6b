// src/app/manager.rs
use crate::ansible::{AnsibleError, AnsibleGenerator};
use crate::cert::{ApiServerCertGenerator, CertOperationError, CertificateOperations, CertificateVerifier};
use crate::config::ClusterConfig;
use crate::kubeconfig::{verify_kubeconfigs, EncryptionConfigGenerator, EncryptionError, KubeConfigError, KubeConfigGenerator};
use crate::types::{Commands, ExternalTools};
use crate::utils::command::CommandRunner;

use anyhow::Context;
use std::path::PathBuf;

/// Runs the bootstrap stages against one cluster config.
pub struct BootstrapManager {
    config: ClusterConfig,
    tools: ExternalTools,
    runner: Box<dyn CommandRunner>,
}

impl BootstrapManager {
    pub fn new(config: ClusterConfig, tools: ExternalTools, runner: Box<dyn CommandRunner>) -> Self {
        Self { config, tools, runner }
    }

    pub fn run(&mut self, command: Commands) -> anyhow::Result<()> {
        match command {
            Commands::Certs => {
                self.generate_certificates().context("certificate generation failed")?;
            }
            Commands::Kubeconfig => {
                self.generate_kubeconfigs().context("kubeconfig generation failed")?;
            }
            Commands::Encryption => {
                self.generate_encryption_config()
                    .context("encryption config generation failed")?;
            }
            Commands::Ansible => {
                self.generate_ansible_files().context("ansible file generation failed")?;
            }
            Commands::All => {
                for stage in [Commands::Certs, Commands::Kubeconfig, Commands::Encryption, Commands::Ansible] {
                    self.run(stage)?;
                }
                self.run(Commands::Verify)?;
            }
            Commands::Verify => {
                let problems = self.verify()?;
                if !problems.is_empty() {
                    for problem in &problems {
                        tracing::error!("{}", problem);
                    }
                    anyhow::bail!("verification found {} problem(s)", problems.len());
                }
                tracing::info!("All generated files verified");
            }
        }
        Ok(())
    }

    pub fn generate_certificates(&mut self) -> Result<PathBuf, CertOperationError> {
        let mut ops = CertificateOperations::new(
            self.runner.as_mut(),
            &self.tools,
            self.config.templates_path()?,
            self.config.certificates_path()?,
        );
        let archive = ops.generate_all(&self.config)?;
        tracing::info!(path = %archive.display(), "certificates archived");
        Ok(archive)
    }

    pub fn generate_kubeconfigs(&mut self) -> Result<PathBuf, KubeConfigError> {
        let mut generator = KubeConfigGenerator::new(
            self.runner.as_mut(),
            &self.tools,
            self.config.certificates_path()?,
            self.config.k8s_conf_path()?,
        );
        let archive = generator.generate_all_kubeconfigs(&self.config)?;
        tracing::info!(path = %archive.display(), "kubeconfigs archived");
        Ok(archive)
    }

    pub fn generate_encryption_config(&self) -> Result<PathBuf, EncryptionError> {
        EncryptionConfigGenerator::from_config(&self.config)?.generate_config()
    }

    pub fn generate_ansible_files(&self) -> Result<(PathBuf, PathBuf), AnsibleError> {
        AnsibleGenerator::new(&self.config).generate()
    }

    /// Problems found in the generated certificates and kubeconfigs.
    pub fn verify(&self) -> anyhow::Result<Vec<String>> {
        let hostnames =
            ApiServerCertGenerator::new(&self.config.controllers, self.config.static_external_ip()?)
                .hostnames()?;

        let report = CertificateVerifier::new(self.config.certificates_path()?)
            .verify_all(&hostnames)
            .context("certificate verification failed")?;
        tracing::info!(count = report.certificates.len(), "certificates inspected");

        let mut problems = report.problems;
        problems.extend(verify_kubeconfigs(&self.config.k8s_conf_path()?)?);
        Ok(problems)
    }
}
