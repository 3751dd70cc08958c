//! Launchpad Store - filesystem persistence for app trees and records

pub mod backup;
pub mod publish;
pub mod records;
pub mod serve;
pub mod tree;

pub use backup::BackupManager;
pub use publish::PublicationStore;
pub use records::DeploymentRegistry;
pub use serve::StaticResolver;
pub use tree::{copy_tree, remove_dir_if_exists, validate_file_paths, FileTreeWriter};

use launchpad_core::{LaunchpadConfig, Result};
use tracing::info;

/// Create the store directories under the configured data dir
pub fn ensure_layout(config: &LaunchpadConfig) -> Result<()> {
    for dir in [
        config.apps_dir(),
        config.static_dir(),
        config.backups_dir(),
        config.deployments_dir(),
    ] {
        if !dir.exists() {
            std::fs::create_dir_all(&dir)?;
            info!("Created {}", dir.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_ensure_layout_creates_store_dirs() {
        let dir = tempdir().unwrap();
        let config = LaunchpadConfig::with_data_dir(dir.path().join("data"));

        ensure_layout(&config).unwrap();
        assert!(config.apps_dir().is_dir());
        assert!(config.static_dir().is_dir());
        assert!(config.backups_dir().is_dir());
        assert!(config.deployments_dir().is_dir());

        // Idempotent
        ensure_layout(&config).unwrap();
    }
}
