use super::KubeConfigError;
use crate::config::{ClusterConfig, NodeConfig};
use crate::types::ExternalTools;
use crate::utils::{
    archive::archive_directory,
    command::{CommandRunner, Invocation},
    fs::{remove_if_exists, reset_directory},
};
use std::path::{Path, PathBuf};

pub const CLUSTER_NAME: &str = "kubernetes-the-hard-way";
pub const CONTEXT_NAME: &str = "default";
pub const API_SERVER_PORT: u16 = 6443;
pub const KUBECONFIG_ARCHIVE: &str = "k8s-kubeconfig.tar.gz";

/// One kubeconfig to assemble: who it authenticates as and where it points.
#[derive(Debug, Clone, PartialEq)]
pub struct KubeconfigSpec {
    pub file_stem: String,
    pub user: String,
    pub cert_stem: String,
    pub server: String,
}

impl KubeconfigSpec {
    pub fn worker(name: &str, public_address: &str) -> Self {
        Self {
            file_stem: name.to_string(),
            user: format!("system:node:{}", name),
            cert_stem: name.to_string(),
            server: api_server_url(public_address),
        }
    }

    pub fn kube_proxy(public_address: &str) -> Self {
        Self {
            file_stem: "kube-proxy".to_string(),
            user: "system:kube-proxy".to_string(),
            cert_stem: "kube-proxy".to_string(),
            server: api_server_url(public_address),
        }
    }

    pub fn controller_manager() -> Self {
        Self::local_component("kube-controller-manager")
    }

    pub fn scheduler() -> Self {
        Self::local_component("kube-scheduler")
    }

    pub fn admin() -> Self {
        Self {
            file_stem: "admin".to_string(),
            user: "admin".to_string(),
            cert_stem: "admin".to_string(),
            server: api_server_url("127.0.0.1"),
        }
    }

    // Control-plane components talk to the API server on the same host.
    fn local_component(name: &str) -> Self {
        Self {
            file_stem: name.to_string(),
            user: format!("system:{}", name),
            cert_stem: name.to_string(),
            server: api_server_url("127.0.0.1"),
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.kubeconfig", self.file_stem)
    }
}

fn api_server_url(address: &str) -> String {
    format!("https://{}:{}", address, API_SERVER_PORT)
}

/// Workers first, then kube-proxy, controller-manager, scheduler and admin.
pub fn principals(workers: &[NodeConfig], static_external_ip: &str) -> Vec<KubeconfigSpec> {
    let mut specs: Vec<KubeconfigSpec> = workers
        .iter()
        .map(|w| KubeconfigSpec::worker(&w.name, static_external_ip))
        .collect();
    specs.push(KubeconfigSpec::kube_proxy(static_external_ip));
    specs.push(KubeconfigSpec::controller_manager());
    specs.push(KubeconfigSpec::scheduler());
    specs.push(KubeconfigSpec::admin());
    specs
}

pub struct KubeConfigGenerator<'a> {
    runner: &'a mut dyn CommandRunner,
    kubectl: &'a str,
    certs_dir: PathBuf,
    output_dir: PathBuf,
}

impl<'a> KubeConfigGenerator<'a> {
    pub fn new(
        runner: &'a mut dyn CommandRunner,
        tools: &'a ExternalTools,
        certs_dir: PathBuf,
        output_dir: PathBuf,
    ) -> Self {
        Self {
            runner,
            kubectl: &tools.kubectl,
            certs_dir,
            output_dir,
        }
    }

    /// Wipes the output directory, writes every kubeconfig and archives them.
    pub fn generate_all_kubeconfigs(&mut self, config: &ClusterConfig) -> Result<PathBuf, KubeConfigError> {
        let specs = principals(config.active_workers()?, config.static_external_ip()?);

        tracing::info!(path = %self.output_dir.display(), "Checking kubeconfig directory");
        reset_directory(&self.output_dir)?;

        for spec in &specs {
            self.generate_kubeconfig(spec)?;
        }

        tracing::info!("Archiving kubeconfigs");
        Ok(archive_directory(&self.output_dir, KUBECONFIG_ARCHIVE)?)
    }

    pub fn generate_kubeconfig(&mut self, spec: &KubeconfigSpec) -> Result<PathBuf, KubeConfigError> {
        let kubeconfig = self.output_dir.join(spec.file_name());
        tracing::info!(user = %spec.user, path = %kubeconfig.display(), "Generating kubeconfig");
        remove_if_exists(&kubeconfig)?;

        let kubeconfig_flag = format!("--kubeconfig={}", kubeconfig.display());
        let ca = self.certs_dir.join("ca.pem");

        self.config_step(
            "set-cluster",
            vec![
                CLUSTER_NAME.to_string(),
                format!("--certificate-authority={}", ca.display()),
                "--embed-certs=true".to_string(),
                format!("--server={}", spec.server),
                kubeconfig_flag.clone(),
            ],
            &kubeconfig,
            &[format!("Cluster \"{}\" set.", CLUSTER_NAME)],
        )?;

        if !kubeconfig.exists() {
            return Err(KubeConfigError::MissingOutput(kubeconfig));
        }

        let cert = self.certs_dir.join(format!("{}.pem", spec.cert_stem));
        let key = self.certs_dir.join(format!("{}-key.pem", spec.cert_stem));
        self.config_step(
            "set-credentials",
            vec![
                spec.user.clone(),
                format!("--client-certificate={}", cert.display()),
                format!("--client-key={}", key.display()),
                "--embed-certs=true".to_string(),
                kubeconfig_flag.clone(),
            ],
            &kubeconfig,
            &[format!("User \"{}\" set.", spec.user)],
        )?;

        self.config_step(
            "set-context",
            vec![
                CONTEXT_NAME.to_string(),
                format!("--cluster={}", CLUSTER_NAME),
                format!("--user={}", spec.user),
                kubeconfig_flag.clone(),
            ],
            &kubeconfig,
            &[
                format!("Context \"{}\" created.", CONTEXT_NAME),
                format!("Context \"{}\" modified.", CONTEXT_NAME),
            ],
        )?;

        self.config_step(
            "use-context",
            vec![CONTEXT_NAME.to_string(), kubeconfig_flag],
            &kubeconfig,
            &[format!("Switched to context \"{}\".", CONTEXT_NAME)],
        )?;

        tracing::info!(path = %kubeconfig.display(), "kubeconfig generated");
        Ok(kubeconfig)
    }

    /// Runs `kubectl config <step> <args>` and requires a zero exit plus one
    /// of the `expected` confirmations on stdout.
    fn config_step(
        &mut self,
        step: &'static str,
        args: Vec<String>,
        kubeconfig: &Path,
        expected: &[String],
    ) -> Result<(), KubeConfigError> {
        let invocation = Invocation::new(self.kubectl).args(["config", step]).args(args);
        tracing::debug!(command = %invocation, "running");

        let output = self.runner.run(&invocation)?;
        let confirmed = expected.iter().any(|e| output.stdout.contains(e.as_str()));

        if !output.success || !confirmed {
            return Err(KubeConfigError::UnexpectedOutput {
                step,
                kubeconfig: kubeconfig.to_path_buf(),
                status: output.status_line(),
                output: format!("{}{}", output.stdout, output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}
