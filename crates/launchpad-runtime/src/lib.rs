//! Launchpad Runtime - External process capability and the Build Executor

pub mod cmd;
pub mod executor;
pub mod npm;
pub mod traits;

pub use cmd::TokioProcessRunner;
pub use executor::{BuildArtifact, BuildExecutor};
pub use npm::PackageBuilder;
pub use traits::{CommandOutput, CommandSpec, ProcessOutcome, ProcessRunner};
