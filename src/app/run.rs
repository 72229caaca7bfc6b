use super::BootstrapManager;
use crate::config::ClusterConfig;
use crate::preflight::{external_dependency_preflight_check, required_dependencies};
use crate::types::{Args, ExternalTools};
use crate::utils::command::SystemRunner;

use anyhow::Context;

pub fn run(args: &Args) -> anyhow::Result<()> {
    let config = ClusterConfig::load_from_file(&args.config)
        .with_context(|| format!("failed to load {}", args.config.display()))?;
    tracing::debug!(config = %args.config.display(), command = ?args.command, "config loaded");

    let tools = ExternalTools::from(args);
    let mut runner = SystemRunner;

    if args.skip_preflight_checks {
        tracing::warn!("Skipping external dependency checks");
    } else {
        let dependencies = required_dependencies(args.command, &tools);
        external_dependency_preflight_check(&mut runner, &dependencies)?;
    }

    let mut manager = BootstrapManager::new(config, tools, Box::new(runner));
    manager.run(args.command)
}
