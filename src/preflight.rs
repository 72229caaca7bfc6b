use crate::types::{Commands, ExternalTools};
use crate::utils::command::{CommandRunner, Invocation};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalDependency {
    pub binary: String,
    pub install_advice: &'static str,
}

impl ExternalDependency {
    pub fn new(binary: &str, install_advice: &'static str) -> Self {
        Self {
            binary: binary.to_string(),
            install_advice,
        }
    }
}

const CFSSL_ADVICE: &str = "Follow instructions on: https://github.com/cloudflare/cfssl#installation";
const KUBECTL_ADVICE: &str = "Follow instructions on: https://kubernetes.io/docs/tasks/tools/";

/// The binaries a subcommand shells out to.
pub fn required_dependencies(command: Commands, tools: &ExternalTools) -> Vec<ExternalDependency> {
    let mut deps = Vec::new();
    if command.needs_cfssl() {
        deps.push(ExternalDependency::new(&tools.cfssl, CFSSL_ADVICE));
        deps.push(ExternalDependency::new(&tools.cfssljson, CFSSL_ADVICE));
    }
    if command.needs_kubectl() {
        deps.push(ExternalDependency::new(&tools.kubectl, KUBECTL_ADVICE));
    }
    deps
}

pub fn external_dependency_preflight_check(
    runner: &mut dyn CommandRunner,
    dependencies: &[ExternalDependency],
) -> anyhow::Result<()> {
    let mut missing_dependency = false;
    for dep in dependencies {
        let output = runner.run(&Invocation::new("which").arg(&dep.binary))?;

        if output.success {
            tracing::debug!(binary = %dep.binary, path = %output.stdout.trim(), "found");
        } else {
            tracing::error!(
                "Binary '{}' not found or not executable. {}",
                dep.binary,
                dep.install_advice
            );
            missing_dependency = true;
        }
    }

    if missing_dependency {
        anyhow::bail!("One or more missing dependencies found.")
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::command::testing::{failed, succeeded, RecordingRunner};

    #[test]
    fn all_needs_every_tool() {
        let deps = required_dependencies(Commands::All, &ExternalTools::default());
        let binaries: Vec<&str> = deps.iter().map(|d| d.binary.as_str()).collect();
        assert_eq!(binaries, vec!["cfssl", "cfssljson", "kubectl"]);
    }

    #[test]
    fn pure_stages_need_nothing() {
        assert!(required_dependencies(Commands::Ansible, &ExternalTools::default()).is_empty());
        assert!(required_dependencies(Commands::Encryption, &ExternalTools::default()).is_empty());
    }

    #[test]
    fn missing_binary_fails_after_checking_all() {
        let mut runner = RecordingRunner::new(|inv| {
            if inv.args[0] == "cfssljson" {
                failed(1, "")
            } else {
                succeeded("/usr/local/bin/tool\n")
            }
        });

        let deps = required_dependencies(Commands::All, &ExternalTools::default());
        let result = external_dependency_preflight_check(&mut runner, &deps);

        assert!(result.is_err());
        assert_eq!(runner.calls.len(), 3);
        assert!(runner.programs().iter().all(|p| *p == "which"));
    }

    #[test]
    fn present_binaries_pass() {
        let mut runner = RecordingRunner::new(|_| succeeded("/usr/bin/kubectl\n"));
        let deps = required_dependencies(Commands::Kubeconfig, &ExternalTools::default());
        assert!(external_dependency_preflight_check(&mut runner, &deps).is_ok());
    }
}
