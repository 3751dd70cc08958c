//! Process runner trait and common types

use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;

/// One external command invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    pub timeout: Duration,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>, cwd: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.into(),
            timeout,
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Human-readable command line (for logs)
    pub fn command_string(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}

/// Captured output of a process that ran to completion
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code; `None` when the process was terminated by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// How a command invocation ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    Exited(CommandOutput),
    /// The wall-clock limit elapsed and the process was killed
    TimedOut,
}

/// Capability to run external processes
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run the command to completion or until its timeout elapses
    async fn run(&self, spec: &CommandSpec) -> std::io::Result<ProcessOutcome>;

    /// Resolve a program to an executable path, if it is installed
    fn locate(&self, program: &str) -> Option<PathBuf> {
        which::which(program).ok()
    }
}
