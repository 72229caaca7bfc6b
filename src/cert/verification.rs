// src/cert/verification.rs
use chrono::{DateTime, TimeZone, Utc};
use glob::{glob, Pattern};
use openssl::{hash::MessageDigest, x509::X509};
use std::{
    fs, io,
    net::IpAddr,
    path::{Path, PathBuf},
};
use thiserror::Error;
use x509_parser::prelude::{FromDer, GeneralName, ParsedExtension, X509Certificate};

use super::types::{CaFiles, CertificateType};

#[derive(Error, Debug)]
pub enum VerifyError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    OpenSsl(#[from] openssl::error::ErrorStack),
    #[error("{}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },
}

#[derive(Debug, Clone)]
pub struct CertificateInfo {
    pub path: PathBuf,
    pub subject: String,
    pub issuer: String,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
    pub serial: String,
    pub fingerprint: String,
    pub is_ca: bool,
    pub dns_names: Vec<String>,
    pub ip_addresses: Vec<IpAddr>,
}

impl CertificateInfo {
    /// Whether `hostname` (a DNS name or an IP literal) is among the SANs.
    pub fn covers(&self, hostname: &str) -> bool {
        match hostname.parse::<IpAddr>() {
            Ok(ip) => self.ip_addresses.contains(&ip),
            Err(_) => self.dns_names.iter().any(|n| n == hostname),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.not_after < Utc::now()
    }
}

pub fn analyze_certificate(path: &Path) -> Result<CertificateInfo, VerifyError> {
    let parse_error = |message: String| VerifyError::Parse {
        path: path.to_path_buf(),
        message,
    };

    let x509 = X509::from_pem(&fs::read(path)?)?;
    let der = x509.to_der()?;
    let (_remainder, cert) =
        X509Certificate::from_der(&der).map_err(|e| parse_error(e.to_string()))?;

    let not_before = Utc
        .timestamp_opt(cert.validity().not_before.timestamp(), 0)
        .single()
        .ok_or_else(|| parse_error("invalid not_before timestamp".to_string()))?;
    let not_after = Utc
        .timestamp_opt(cert.validity().not_after.timestamp(), 0)
        .single()
        .ok_or_else(|| parse_error("invalid not_after timestamp".to_string()))?;

    let mut is_ca = false;
    let mut dns_names = Vec::new();
    let mut ip_addresses = Vec::new();
    for ext in cert.extensions() {
        match ext.parsed_extension() {
            ParsedExtension::BasicConstraints(bc) => is_ca = bc.ca,
            ParsedExtension::SubjectAlternativeName(san) => {
                for name in &san.general_names {
                    match name {
                        GeneralName::DNSName(dns) => dns_names.push(dns.to_string()),
                        GeneralName::IPAddress(bytes) => {
                            if let Some(ip) = ip_from_bytes(bytes) {
                                ip_addresses.push(ip);
                            }
                        }
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }

    let digest = x509.digest(MessageDigest::sha256())?;

    Ok(CertificateInfo {
        path: path.to_path_buf(),
        subject: cert.subject().to_string(),
        issuer: cert.issuer().to_string(),
        not_before,
        not_after,
        serial: hex::encode(cert.raw_serial()),
        fingerprint: hex::encode(&*digest),
        is_ca,
        dns_names,
        ip_addresses,
    })
}

fn ip_from_bytes(bytes: &[u8]) -> Option<IpAddr> {
    if let Ok(v4) = <[u8; 4]>::try_from(bytes) {
        return Some(IpAddr::from(v4));
    }
    <[u8; 16]>::try_from(bytes).ok().map(IpAddr::from)
}

/// Checks the signature of `cert_path` against the public key of `ca_path`.
pub fn is_signed_by(cert_path: &Path, ca_path: &Path) -> Result<bool, VerifyError> {
    let cert = X509::from_pem(&fs::read(cert_path)?)?;
    let ca = X509::from_pem(&fs::read(ca_path)?)?;
    let key = ca.public_key()?;
    Ok(cert.verify(&key)?)
}

#[derive(Debug, Default)]
pub struct VerificationReport {
    pub certificates: Vec<CertificateInfo>,
    pub problems: Vec<String>,
}

pub struct CertificateVerifier {
    certs_dir: PathBuf,
}

impl CertificateVerifier {
    pub fn new(certs_dir: PathBuf) -> Self {
        Self { certs_dir }
    }

    /// Certificate PEMs in the directory; private keys are skipped.
    pub fn certificate_files(&self) -> io::Result<Vec<PathBuf>> {
        let pattern = format!("{}/*.pem", Pattern::escape(&self.certs_dir.display().to_string()));
        let entries = glob(&pattern).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

        let mut files = Vec::new();
        for entry in entries {
            let path = entry.map_err(io::Error::from)?;
            let is_key = path
                .file_name()
                .is_some_and(|n| n.to_string_lossy().ends_with("-key.pem"));
            if !is_key {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    pub fn verify_all(&self, api_server_hostnames: &[String]) -> Result<VerificationReport, VerifyError> {
        let mut report = VerificationReport::default();
        let ca = CaFiles::in_dir(&self.certs_dir);

        if !ca.cert.exists() {
            report
                .problems
                .push(format!("CA certificate not found: {}", ca.cert.display()));
            return Ok(report);
        }

        let api_server_file = format!("{}.pem", CertificateType::APIServer.file_stem());

        for path in self.certificate_files()? {
            let info = match analyze_certificate(&path) {
                Ok(info) => info,
                Err(e) => {
                    report.problems.push(format!("{}: unreadable certificate: {}", path.display(), e));
                    continue;
                }
            };

            tracing::info!(
                path = %info.path.display(),
                subject = %info.subject,
                issuer = %info.issuer,
                serial = %info.serial,
                not_before = %info.not_before,
                not_after = %info.not_after,
                fingerprint = %info.fingerprint,
                "certificate"
            );

            if info.is_expired() {
                report.problems.push(format!("{}: expired on {}", path.display(), info.not_after));
            }

            if path == ca.cert {
                if !info.is_ca {
                    report.problems.push(format!("{}: not a CA certificate", path.display()));
                }
            } else {
                match is_signed_by(&path, &ca.cert) {
                    Ok(true) => {}
                    Ok(false) => report.problems.push(format!("{}: not signed by {}", path.display(), ca.cert.display())),
                    Err(e) => report.problems.push(format!("{}: signature check failed: {}", path.display(), e)),
                }
            }

            if path.file_name().is_some_and(|n| n.to_string_lossy() == api_server_file) {
                let missing: Vec<&str> = api_server_hostnames
                    .iter()
                    .filter(|h| !info.covers(h))
                    .map(String::as_str)
                    .collect();
                if !missing.is_empty() {
                    report.problems.push(format!(
                        "{}: missing subject alternative names: {}",
                        path.display(),
                        missing.join(",")
                    ));
                }
            }

            report.certificates.push(info);
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use openssl::{
        asn1::Asn1Time,
        bn::BigNum,
        ec::{EcGroup, EcKey},
        nid::Nid,
        pkey::{PKey, Private},
        x509::{
            extension::{BasicConstraints, SubjectAlternativeName},
            X509Builder, X509NameBuilder,
        },
    };
    use tempfile::TempDir;

    fn new_key() -> PKey<Private> {
        let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();
        PKey::from_ec_key(EcKey::generate(&group).unwrap()).unwrap()
    }

    fn build_cert(
        common_name: &str,
        key: &PKey<Private>,
        issuer: Option<(&X509, &PKey<Private>)>,
        sans: &[&str],
        days: u32,
    ) -> X509 {
        let mut name = X509NameBuilder::new().unwrap();
        name.append_entry_by_nid(Nid::COMMONNAME, common_name).unwrap();
        let name = name.build();

        let mut builder = X509Builder::new().unwrap();
        builder.set_version(2).unwrap();
        let serial = BigNum::from_u32(7).unwrap().to_asn1_integer().unwrap();
        builder.set_serial_number(&serial).unwrap();
        builder.set_subject_name(&name).unwrap();
        builder.set_pubkey(key).unwrap();
        builder.set_not_before(&Asn1Time::days_from_now(0).unwrap()).unwrap();
        builder.set_not_after(&Asn1Time::days_from_now(days).unwrap()).unwrap();

        match issuer {
            Some((ca, ca_key)) => {
                builder.set_issuer_name(ca.subject_name()).unwrap();
                if !sans.is_empty() {
                    let mut san = SubjectAlternativeName::new();
                    for entry in sans {
                        if entry.parse::<IpAddr>().is_ok() {
                            san.ip(entry);
                        } else {
                            san.dns(entry);
                        }
                    }
                    let ext = san.build(&builder.x509v3_context(Some(&**ca), None)).unwrap();
                    builder.append_extension(ext).unwrap();
                }
                builder.sign(ca_key, MessageDigest::sha256()).unwrap();
            }
            None => {
                builder.set_issuer_name(&name).unwrap();
                builder
                    .append_extension(BasicConstraints::new().critical().ca().build().unwrap())
                    .unwrap();
                builder.sign(key, MessageDigest::sha256()).unwrap();
            }
        }
        builder.build()
    }

    fn write(dir: &Path, name: &str, cert: &X509) {
        fs::write(dir.join(name), cert.to_pem().unwrap()).unwrap();
    }

    #[test]
    fn analyze_reads_subject_and_sans() {
        let dir = TempDir::new().unwrap();
        let ca_key = new_key();
        let ca = build_cert("Kubernetes", &ca_key, None, &[], 30);
        let leaf = build_cert("kubernetes", &new_key(), Some((&ca, &ca_key)), &["kubernetes", "10.32.0.1"], 30);
        write(dir.path(), "kubernetes.pem", &leaf);

        let info = analyze_certificate(&dir.path().join("kubernetes.pem")).unwrap();

        assert!(info.subject.contains("CN=kubernetes"));
        assert!(info.issuer.contains("CN=Kubernetes"));
        assert!(info.covers("kubernetes"));
        assert!(info.covers("10.32.0.1"));
        assert!(!info.covers("127.0.0.1"));
        assert!(!info.is_ca);
        assert_eq!(info.serial, "07");
        assert_eq!(info.fingerprint.len(), 64);
    }

    #[test]
    fn clean_directory_produces_no_problems() {
        let dir = TempDir::new().unwrap();
        let ca_key = new_key();
        let ca = build_cert("Kubernetes", &ca_key, None, &[], 30);
        write(dir.path(), "ca.pem", &ca);
        fs::write(dir.path().join("ca-key.pem"), ca_key.private_key_to_pem_pkcs8().unwrap()).unwrap();
        let admin = build_cert("admin", &new_key(), Some((&ca, &ca_key)), &[], 30);
        write(dir.path(), "admin.pem", &admin);
        let api = build_cert("kubernetes", &new_key(), Some((&ca, &ca_key)), &["kubernetes", "10.32.0.1"], 30);
        write(dir.path(), "kubernetes.pem", &api);

        let verifier = CertificateVerifier::new(dir.path().to_path_buf());
        let report = verifier
            .verify_all(&["10.32.0.1".to_string(), "kubernetes".to_string()])
            .unwrap();

        assert!(report.problems.is_empty(), "{:?}", report.problems);
        assert_eq!(report.certificates.len(), 3);
    }

    #[test]
    fn foreign_signature_and_missing_sans_are_reported() {
        let dir = TempDir::new().unwrap();
        let ca_key = new_key();
        let ca = build_cert("Kubernetes", &ca_key, None, &[], 30);
        write(dir.path(), "ca.pem", &ca);

        let other_key = new_key();
        let other_ca = build_cert("Other", &other_key, None, &[], 30);
        let rogue = build_cert("admin", &new_key(), Some((&other_ca, &other_key)), &[], 30);
        write(dir.path(), "admin.pem", &rogue);
        let api = build_cert("kubernetes", &new_key(), Some((&ca, &ca_key)), &["kubernetes"], 30);
        write(dir.path(), "kubernetes.pem", &api);

        let report = CertificateVerifier::new(dir.path().to_path_buf())
            .verify_all(&["kubernetes".to_string(), "127.0.0.1".to_string()])
            .unwrap();

        assert_eq!(report.problems.len(), 2, "{:?}", report.problems);
        assert!(report.problems.iter().any(|p| p.contains("admin.pem") && p.contains("not signed")));
        assert!(report.problems.iter().any(|p| p.contains("missing subject alternative names: 127.0.0.1")));
    }

    #[test]
    fn signature_check_distinguishes_issuers() {
        let dir = TempDir::new().unwrap();
        let ca_key = new_key();
        let ca = build_cert("Kubernetes", &ca_key, None, &[], 30);
        write(dir.path(), "ca.pem", &ca);
        let other_key = new_key();
        write(dir.path(), "other.pem", &build_cert("Other", &other_key, None, &[], 30));
        write(dir.path(), "leaf.pem", &build_cert("admin", &new_key(), Some((&ca, &ca_key)), &[], 30));

        assert!(is_signed_by(&dir.path().join("leaf.pem"), &dir.path().join("ca.pem")).unwrap());
        assert!(!is_signed_by(&dir.path().join("leaf.pem"), &dir.path().join("other.pem")).unwrap());
    }

    #[test]
    fn missing_ca_is_a_single_problem() {
        let dir = TempDir::new().unwrap();
        let report = CertificateVerifier::new(dir.path().to_path_buf()).verify_all(&[]).unwrap();
        assert_eq!(report.problems.len(), 1);
        assert!(report.certificates.is_empty());
    }

    #[test]
    fn key_files_are_not_treated_as_certificates() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("admin.pem"), "").unwrap();
        fs::write(dir.path().join("admin-key.pem"), "").unwrap();
        let files = CertificateVerifier::new(dir.path().to_path_buf()).certificate_files().unwrap();
        assert_eq!(files, vec![dir.path().join("admin.pem")]);
    }
}
