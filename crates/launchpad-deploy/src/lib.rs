//! Launchpad Deploy - lifecycle orchestration across the stores

pub mod deployer;
pub mod locks;

pub use deployer::Deployer;
pub use locks::AppLocks;
