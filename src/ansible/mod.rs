// src/ansible/mod.rs
mod inventory;
mod playbook;

pub use inventory::Inventory;
pub use playbook::{playbook_values, PLAYBOOK_TEMPLATE};

use crate::config::{ClusterConfig, ConfigError};
use crate::utils::template::{Template, TemplateError};
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnsibleError {
    #[error("ansible IO error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error("failed to serialise inventory: {0}")]
    Inventory(#[source] serde_yaml::Error),
    #[error("playbook template not found: {}", .0.display())]
    MissingTemplate(PathBuf),
    #[error("rendered playbook is not valid YAML: {0}")]
    InvalidPlaybook(#[source] serde_yaml::Error),
    #[error("failed to create {}", .0.display())]
    NotWritten(PathBuf),
}

pub struct AnsibleGenerator<'a> {
    config: &'a ClusterConfig,
}

impl<'a> AnsibleGenerator<'a> {
    pub fn new(config: &'a ClusterConfig) -> Self {
        Self { config }
    }

    /// Writes the inventory then the playbook; returns both paths.
    pub fn generate(&self) -> Result<(PathBuf, PathBuf), AnsibleError> {
        let inventory = self.write_inventory()?;
        let playbook = self.write_playbook()?;
        Ok((inventory, playbook))
    }

    pub fn write_inventory(&self) -> Result<PathBuf, AnsibleError> {
        tracing::info!("Generating ansible-inventory");
        let path = self.config.ansible_inventory()?;

        // every listed host, whatever the counts say
        let inventory = Inventory::new(&self.config.controllers, &self.config.workers)?;
        let rendered = inventory.render().map_err(AnsibleError::Inventory)?;
        write_output(&path, &rendered)?;

        tracing::info!(path = %path.display(), "ansible-inventory created");
        Ok(path)
    }

    pub fn render_playbook(&self) -> Result<String, AnsibleError> {
        let template_path = self.config.templates_path()?.join(PLAYBOOK_TEMPLATE);
        if !template_path.exists() {
            return Err(AnsibleError::MissingTemplate(template_path));
        }
        tracing::info!(path = %template_path.display(), "template found");

        let values = playbook_values(self.config.ansible_settings()?, self.config.static_external_ip()?);
        let rendered = Template::from_file(&template_path)?.substitute(&values)?;

        serde_yaml::from_str::<serde_yaml::Value>(&rendered).map_err(AnsibleError::InvalidPlaybook)?;
        Ok(rendered)
    }

    pub fn write_playbook(&self) -> Result<PathBuf, AnsibleError> {
        tracing::info!("Generating ansible-playbook");
        let path = self.config.ansible_playbook()?;
        let rendered = self.render_playbook()?;
        write_output(&path, &rendered)?;

        tracing::info!(path = %path.display(), "ansible-playbook created");
        Ok(path)
    }
}

fn write_output(path: &Path, contents: &str) -> Result<(), AnsibleError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)?;
    if !path.exists() {
        return Err(AnsibleError::NotWritten(path.to_path_buf()));
    }
    Ok(())
}
