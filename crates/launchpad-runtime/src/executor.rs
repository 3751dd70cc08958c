//! Build Executor - install + build with a bounded worker pool

use launchpad_core::{BuildConfig, BuildStage, Error, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::npm::PackageBuilder;
use crate::traits::{CommandOutput, ProcessOutcome, ProcessRunner};

/// Output of a successful build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildArtifact {
    /// First candidate output directory that exists after the build
    pub output_dir: PathBuf,
    /// Captured stdout of the build step
    pub stdout: String,
}

/// Runs external builds for apps whose type requires compilation.
///
/// No retries: the first failing step is surfaced to the caller.
pub struct BuildExecutor {
    runner: Arc<dyn ProcessRunner>,
    builder: PackageBuilder,
    timeout: Duration,
    output_dirs: Vec<String>,
    permits: Arc<Semaphore>,
}

impl BuildExecutor {
    pub fn new(config: &BuildConfig, runner: Arc<dyn ProcessRunner>) -> Self {
        Self {
            runner,
            builder: PackageBuilder::new(config.tool.clone()),
            timeout: config.timeout(),
            output_dirs: config.output_dirs.clone(),
            permits: Arc::new(Semaphore::new(config.max_concurrent.max(1))),
        }
    }

    /// Builds that could start right now without waiting
    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }

    /// Install dependencies, build, and locate the output directory
    pub async fn build(&self, source_dir: &Path) -> Result<BuildArtifact> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| Error::Io(std::io::Error::other(e)))?;

        self.builder.prepare(self.runner.as_ref(), source_dir)?;

        info!("Installing dependencies in {}", source_dir.display());
        self.run_stage(BuildStage::Install, source_dir).await?;

        info!("Building {}", source_dir.display());
        let build = self.run_stage(BuildStage::Build, source_dir).await?;

        let output_dir = self.locate_output(source_dir)?;
        info!("Build output found at {}", output_dir.display());

        Ok(BuildArtifact {
            output_dir,
            stdout: build.stdout,
        })
    }

    async fn run_stage(&self, stage: BuildStage, source_dir: &Path) -> Result<CommandOutput> {
        let spec = self.builder.command(stage, source_dir, self.timeout);

        let outcome = self.runner.run(&spec).await.map_err(|e| Error::BuildFailed {
            stage,
            stderr: format!("Failed to run `{}`: {}", spec.command_string(), e),
        })?;

        match outcome {
            ProcessOutcome::Exited(output) if output.success() => Ok(output),
            ProcessOutcome::Exited(output) => {
                warn!(
                    "`{}` exited with {:?}: {}",
                    spec.command_string(),
                    output.code,
                    output.stderr.trim()
                );
                Err(Error::BuildFailed {
                    stage,
                    stderr: output.stderr,
                })
            }
            ProcessOutcome::TimedOut => Err(Error::BuildTimeout {
                stage,
                secs: self.timeout.as_secs(),
            }),
        }
    }

    /// First candidate output directory present under `source_dir`
    pub fn locate_output(&self, source_dir: &Path) -> Result<PathBuf> {
        self.output_dirs
            .iter()
            .map(|name| source_dir.join(name))
            .find(|candidate| candidate.is_dir())
            .ok_or_else(|| Error::OutputNotFound(self.output_dirs.clone()))
    }
}
