//! Dependency installation for `missing_dependency` issues

use camino::Utf8Path;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use pipeforge_config::PackageManager;
use pipeforge_runner::{CommandSpec, ProcessRunner};

/// Bytes of install output kept in the result.
const OUTPUT_TAIL_BYTES: usize = 4 * 1024;

/// Pick a package manager from the project's lockfiles and manifests.
#[must_use]
pub fn detect_package_manager(project: &Utf8Path) -> Option<PackageManager> {
    if project.join("pnpm-lock.yaml").is_file() {
        Some(PackageManager::Pnpm)
    } else if project.join("yarn.lock").is_file() {
        Some(PackageManager::Yarn)
    } else if project.join("package.json").is_file() {
        Some(PackageManager::Npm)
    } else if project.join("requirements.txt").is_file() {
        Some(PackageManager::Pip)
    } else {
        None
    }
}

/// The install command for `manager`, run in `project`.
#[must_use]
pub fn install_command(manager: PackageManager, project: &Utf8Path) -> CommandSpec {
    let spec = match manager {
        PackageManager::Npm => CommandSpec::new("npm").arg("install"),
        PackageManager::Pnpm => CommandSpec::new("pnpm").arg("install"),
        PackageManager::Yarn => CommandSpec::new("yarn").arg("install"),
        PackageManager::Pip => CommandSpec::new("pip").args(["install", "-r", "requirements.txt"]),
    };
    spec.cwd(project.as_std_path())
}

/// Outcome of one install run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallResult {
    pub command: String,
    pub success: bool,
    pub exit_code: Option<i32>,
    pub output_tail: String,
}

/// Run the install and capture its outcome; never fails.
pub fn run_install<R: ProcessRunner>(
    runner: &R,
    manager: PackageManager,
    project: &Utf8Path,
    timeout: Duration,
) -> InstallResult {
    let spec = install_command(manager, project);
    let command = spec.display();
    tracing::info!(command = %command, project = %project, "installing dependencies");

    let result = match runner.run(&spec, timeout) {
        Ok(output) => {
            let combined = format!("{}{}", output.stdout_string(), output.stderr_string());
            InstallResult {
                command,
                success: output.success(),
                exit_code: output.exit_code,
                output_tail: tail(&combined),
            }
        }
        Err(e) => InstallResult {
            command,
            success: false,
            exit_code: None,
            output_tail: e.to_string(),
        },
    };

    if result.success {
        tracing::info!(command = %result.command, "dependency install succeeded");
    } else {
        tracing::warn!(command = %result.command, exit_code = ?result.exit_code, "dependency install failed");
    }
    result
}

fn tail(text: &str) -> String {
    if text.len() <= OUTPUT_TAIL_BYTES {
        return text.to_string();
    }
    let mut start = text.len() - OUTPUT_TAIL_BYTES;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    text[start..].to_string()
}
