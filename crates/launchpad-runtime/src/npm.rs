//! npm/pnpm/yarn install + build steps

use launchpad_core::{BuildStage, Error, Result};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::traits::{CommandSpec, ProcessRunner};

/// Script invoked for the build step
pub const BUILD_SCRIPT: &str = "build";

/// Drives a JavaScript package tool through install and build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageBuilder {
    tool: String,
}

impl PackageBuilder {
    pub fn new(tool: impl Into<String>) -> Self {
        Self { tool: tool.into() }
    }

    pub fn tool(&self) -> &str {
        &self.tool
    }

    /// Verify the tool is installed and the project declares a build script
    pub fn prepare(&self, runner: &dyn ProcessRunner, source_dir: &Path) -> Result<()> {
        let tool_path = runner.locate(&self.tool).ok_or_else(|| Error::BuildFailed {
            stage: BuildStage::Install,
            stderr: format!("{} not found in PATH. Please install {}.", self.tool, self.tool),
        })?;

        let package_json = source_dir.join("package.json");
        if !package_json.exists() {
            return Err(Error::BuildFailed {
                stage: BuildStage::Install,
                stderr: format!("package.json not found in {}", source_dir.display()),
            });
        }

        let content = std::fs::read_to_string(&package_json)?;
        let package: serde_json::Value =
            serde_json::from_str(&content).map_err(|e| Error::BuildFailed {
                stage: BuildStage::Install,
                stderr: format!("Invalid package.json: {}", e),
            })?;

        let has_script = package
            .get("scripts")
            .and_then(|s| s.get(BUILD_SCRIPT))
            .is_some();

        if !has_script {
            return Err(Error::BuildFailed {
                stage: BuildStage::Build,
                stderr: format!(
                    "Script '{}' not found in package.json scripts",
                    BUILD_SCRIPT
                ),
            });
        }

        info!(
            "Using {} at {} to build {}",
            self.tool,
            tool_path.display(),
            source_dir.display()
        );
        Ok(())
    }

    /// Command for a given stage
    pub fn command(&self, stage: BuildStage, source_dir: &Path, timeout: Duration) -> CommandSpec {
        let spec = CommandSpec::new(self.tool.clone(), source_dir, timeout);
        match stage {
            BuildStage::Install => spec.with_args(["install"]),
            BuildStage::Build => spec.with_args(["run", BUILD_SCRIPT]),
        }
    }
}
