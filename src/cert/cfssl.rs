// src/cert/cfssl.rs
use super::types::{CaFiles, CertificateConfig, SIGNING_PROFILE};
use super::CertOperationError;
use crate::types::ExternalTools;
use crate::utils::command::{CommandRunner, Invocation};
use crate::utils::fs::restrict_permissions;
use std::path::{Path, PathBuf};

pub fn init_ca_invocation(tools: &ExternalTools, csr: &Path) -> Invocation {
    Invocation::new(&tools.cfssl)
        .args(["gencert", "-initca"])
        .arg(csr.display().to_string())
}

pub fn sign_invocation(
    tools: &ExternalTools,
    ca: &CaFiles,
    ca_config: &Path,
    request: &CertificateConfig,
) -> Invocation {
    let mut gencert = Invocation::new(&tools.cfssl).args([
        "gencert".to_string(),
        format!("-ca={}", ca.cert.display()),
        format!("-ca-key={}", ca.key.display()),
        format!("-config={}", ca_config.display()),
    ]);

    if !request.hostnames.is_empty() {
        gencert = gencert.arg(format!("-hostname={}", request.hostnames.join(",")));
    }

    gencert
        .arg(format!("-profile={}", SIGNING_PROFILE))
        .arg(request.csr_path.display().to_string())
}

fn bare_invocation(tools: &ExternalTools, out_prefix: &Path) -> Invocation {
    Invocation::new(&tools.cfssljson)
        .arg("-bare")
        .arg(out_prefix.display().to_string())
}

/// `cfssl gencert -initca <csr> | cfssljson -bare <out_prefix>`
pub fn init_ca(
    runner: &mut dyn CommandRunner,
    tools: &ExternalTools,
    csr: &Path,
    out_prefix: &Path,
) -> Result<PathBuf, CertOperationError> {
    gencert_bare(runner, tools, init_ca_invocation(tools, csr), out_prefix)
}

/// Issues a certificate signed by the cluster CA into `<out_prefix>.pem`.
pub fn sign(
    runner: &mut dyn CommandRunner,
    tools: &ExternalTools,
    ca: &CaFiles,
    ca_config: &Path,
    request: &CertificateConfig,
    out_prefix: &Path,
) -> Result<PathBuf, CertOperationError> {
    for required in [&ca.cert, &ca.key] {
        if !required.exists() {
            return Err(CertOperationError::MissingOutput(required.clone()));
        }
    }

    let gencert = sign_invocation(tools, ca, ca_config, request);
    gencert_bare(runner, tools, gencert, out_prefix)
}

fn gencert_bare(
    runner: &mut dyn CommandRunner,
    tools: &ExternalTools,
    gencert: Invocation,
    out_prefix: &Path,
) -> Result<PathBuf, CertOperationError> {
    let bare = bare_invocation(tools, out_prefix);

    let (gencert_output, bare_output) = runner.pipe(&gencert, &bare)?;
    if !gencert_output.stderr.trim().is_empty() {
        tracing::debug!(stderr = %gencert_output.stderr.trim(), "cfssl output");
    }
    gencert_output.check(&gencert)?;
    bare_output.check(&bare)?;

    let cert = with_suffix(out_prefix, ".pem");
    if !cert.exists() {
        return Err(CertOperationError::MissingOutput(cert));
    }

    let key = with_suffix(out_prefix, "-key.pem");
    if key.exists() {
        restrict_permissions(&key)?;
    }

    Ok(cert)
}

pub fn with_suffix(prefix: &Path, suffix: &str) -> PathBuf {
    let mut name = prefix.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}
