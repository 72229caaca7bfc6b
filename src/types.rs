// types.rs
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Generate the bootstrap files of a Kubernetes The Hard Way cluster", long_about = None)]
pub struct Args {
    /// Path to the cluster config JSON file
    #[arg(short, long, env = "KTHW_CONFIG")]
    pub config: PathBuf,

    /// Enable debug output
    #[arg(short, long)]
    pub debug: bool,

    /// Also append log lines to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Do not check that the external tools are installed
    #[arg(long)]
    pub skip_preflight_checks: bool,

    #[arg(long, default_value = "cfssl")]
    pub cfssl: String,

    #[arg(long, default_value = "cfssljson")]
    pub cfssljson: String,

    #[arg(long, default_value = "kubectl")]
    pub kubectl: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Generate the CA and every cluster certificate
    Certs,
    /// Generate the kubeconfig files
    Kubeconfig,
    /// Generate the data encryption config
    Encryption,
    /// Generate the Ansible inventory and playbook
    Ansible,
    /// Run every stage in order, then verify the output
    All,
    /// Inspect generated certificates and kubeconfigs
    Verify,
}

impl Commands {
    pub fn needs_cfssl(self) -> bool {
        matches!(self, Commands::Certs | Commands::All)
    }

    pub fn needs_kubectl(self) -> bool {
        matches!(self, Commands::Kubeconfig | Commands::All)
    }
}

/// Names (or paths) of the external binaries the generators shell out to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalTools {
    pub cfssl: String,
    pub cfssljson: String,
    pub kubectl: String,
}

impl Default for ExternalTools {
    fn default() -> Self {
        Self {
            cfssl: "cfssl".to_string(),
            cfssljson: "cfssljson".to_string(),
            kubectl: "kubectl".to_string(),
        }
    }
}

impl From<&Args> for ExternalTools {
    fn from(args: &Args) -> Self {
        Self {
            cfssl: args.cfssl.clone(),
            cfssljson: args.cfssljson.clone(),
            kubectl: args.kubectl.clone(),
        }
    }
}
