use super::{
    cfssl::init_ca,
    types::{CaFiles, CertificateType, TemplateFiles},
    CertOperationError,
};
use crate::types::ExternalTools;
use crate::utils::command::CommandRunner;
use std::path::Path;

/// Creates the self-signed cluster CA in `certs_dir`.
///
/// The certificate, key and CSR must all be present afterwards.
pub fn generate_ca(
    runner: &mut dyn CommandRunner,
    tools: &ExternalTools,
    templates: &TemplateFiles,
    certs_dir: &Path,
) -> Result<CaFiles, CertOperationError> {
    tracing::info!("Generating certificate authority");

    let csr = templates.csr(&CertificateType::CA);
    init_ca(runner, tools, &csr, &certs_dir.join(CertificateType::CA.file_stem()))?;

    let ca = CaFiles::in_dir(certs_dir);
    for file in [&ca.cert, &ca.key, &ca.csr] {
        if !file.exists() {
            tracing::error!(path = %file.display(), "CA file missing after generation");
            return Err(CertOperationError::MissingOutput(file.clone()));
        }
    }

    tracing::info!(path = %ca.cert.display(), "certificate authority generated");
    Ok(ca)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::command::testing::{succeeded, RecordingRunner};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn ca_csr_file_is_required() {
        let dir = TempDir::new().unwrap();
        let certs = dir.path().to_path_buf();
        let mut runner = RecordingRunner::new(move |inv| {
            if inv.program == "cfssljson" {
                fs::write(certs.join("ca.pem"), "cert").unwrap();
                fs::write(certs.join("ca-key.pem"), "key").unwrap();
            }
            succeeded("")
        });

        let err = generate_ca(
            &mut runner,
            &ExternalTools::default(),
            &TemplateFiles::new(dir.path().join("templates")),
            dir.path(),
        )
        .unwrap_err();

        assert!(matches!(err, CertOperationError::MissingOutput(p) if p.ends_with("ca.csr")));
    }

    #[test]
    fn returns_ca_locations_when_all_files_exist() {
        let dir = TempDir::new().unwrap();
        let certs = dir.path().to_path_buf();
        let mut runner = RecordingRunner::new(move |inv| {
            if inv.program == "cfssljson" {
                for name in ["ca.pem", "ca-key.pem", "ca.csr"] {
                    fs::write(certs.join(name), name).unwrap();
                }
            }
            succeeded("")
        });

        let ca = generate_ca(
            &mut runner,
            &ExternalTools::default(),
            &TemplateFiles::new(dir.path().join("templates")),
            dir.path(),
        )
        .unwrap();

        assert_eq!(ca.key, dir.path().join("ca-key.pem"));
        assert!(runner.calls[0].args.last().unwrap().ends_with("templates/ca-csr.json"));
    }
}
