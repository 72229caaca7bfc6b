use crate::config::{ClusterConfig, ConfigError};
use crate::utils::{
    fs::remove_if_exists,
    template::{Template, TemplateError},
};
use base64::{engine::general_purpose, Engine as _};
use rand::{distributions::Alphanumeric, rngs::OsRng, Rng};
use std::{collections::HashMap, fs, io, path::PathBuf};
use thiserror::Error;

pub const ENCRYPTION_CONFIG: &str = "encryption-config.yaml";
pub const SECRET_LENGTH: usize = 32;

#[derive(Error, Debug)]
pub enum EncryptionError {
    #[error("encryption config IO error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error("encryption config template not found: {}", .0.display())]
    MissingTemplate(PathBuf),
    #[error("encryption config rendered to an empty document")]
    EmptyRender,
}

/// 32 alphanumeric characters from the OS RNG, base64 encoded.
pub fn generate_secret() -> String {
    let raw: String = OsRng
        .sample_iter(&Alphanumeric)
        .take(SECRET_LENGTH)
        .map(char::from)
        .collect();
    general_purpose::STANDARD.encode(raw)
}

pub struct EncryptionConfigGenerator {
    template_path: PathBuf,
    output_path: PathBuf,
}

impl EncryptionConfigGenerator {
    pub fn new(templates_dir: PathBuf, output_dir: PathBuf) -> Self {
        Self {
            template_path: templates_dir.join(ENCRYPTION_CONFIG),
            output_path: output_dir.join(ENCRYPTION_CONFIG),
        }
    }

    pub fn from_config(config: &ClusterConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(config.templates_path()?, config.k8s_conf_path()?))
    }

    pub fn render(&self, secret: &str) -> Result<String, EncryptionError> {
        if !self.template_path.exists() {
            return Err(EncryptionError::MissingTemplate(self.template_path.clone()));
        }
        let template = Template::from_file(&self.template_path)?;
        let rendered = template.substitute(&HashMap::from([("secret", secret.to_string())]))?;

        if rendered.trim().is_empty() {
            return Err(EncryptionError::EmptyRender);
        }
        Ok(rendered)
    }

    /// Writes a fresh encryption config and returns its absolute path.
    pub fn generate_config(&self) -> Result<PathBuf, EncryptionError> {
        tracing::info!("Generating encryption config");
        let rendered = self.render(&generate_secret())?;

        if let Some(parent) = self.output_path.parent() {
            fs::create_dir_all(parent)?;
        }
        remove_if_exists(&self.output_path)?;
        fs::write(&self.output_path, rendered)?;

        let written = fs::canonicalize(&self.output_path)?;
        tracing::info!(path = %written.display(), "encryption config written");
        Ok(written)
    }
}
