//! Generic command runner backed by tokio processes

use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::traits::{CommandOutput, CommandSpec, ProcessOutcome, ProcessRunner};

/// Runs commands as child processes, killing them when the timeout elapses
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioProcessRunner;

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(&self, spec: &CommandSpec) -> std::io::Result<ProcessOutcome> {
        debug!(
            "Running `{}` in {} (timeout {:?})",
            spec.command_string(),
            spec.cwd.display(),
            spec.timeout
        );

        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .current_dir(&spec.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // Own process group, so a timeout reaches the tool's children too
        #[cfg(unix)]
        cmd.process_group(0);

        let child = cmd.spawn()?;
        let pid = child.id();

        match tokio::time::timeout(spec.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => Ok(ProcessOutcome::Exited(CommandOutput {
                code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            })),
            Ok(Err(e)) => Err(e),
            Err(_) => {
                warn!(
                    "`{}` timed out after {:?}",
                    spec.command_string(),
                    spec.timeout
                );
                kill_process_group(pid);
                Ok(ProcessOutcome::TimedOut)
            }
        }
    }
}

#[cfg(unix)]
fn kill_process_group(pid: Option<u32>) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid as NixPid;

    if let Some(pid) = pid {
        if let Err(e) = killpg(NixPid::from_raw(pid as i32), Signal::SIGKILL) {
            debug!("Process group {} already gone: {}", pid, e);
        }
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: Option<u32>) {}
