//! Constants and default values for Launchpad

use std::path::PathBuf;

/// Default Launchpad data directory name (under the user's home)
pub const LAUNCHPAD_DIR: &str = ".launchpad";

/// Source trees, one directory per app id
pub const APPS_DIR: &str = "apps";

/// Published trees, one directory per app id
pub const STATIC_DIR: &str = "static";

/// Backup snapshots
pub const BACKUPS_DIR: &str = "backups";

/// Deployment records, one JSON file per app id
pub const DEPLOYMENTS_DIR: &str = "deployments";

/// Shared domain bindings store
pub const DOMAINS_DB_FILE: &str = "domains.db";

/// Default config file names to search for (in priority order)
pub const CONFIG_FILES: &[&str] = &[
    "launchpad.toml",
    "launchpad.yaml",
    "launchpad.yml",
    "launchpad.json",
];

/// Default base domain for generated subdomains
pub const DEFAULT_BASE_DOMAIN: &str = "launchpad.app";

/// Default HTTP bind address
pub const DEFAULT_BIND: &str = "0.0.0.0:8080";

/// Document served at the root of a published tree and used for SPA fallback
pub const DEFAULT_ROOT_DOCUMENT: &str = "index.html";

/// Wall-clock limit for each build step
pub const DEFAULT_BUILD_TIMEOUT_SECS: u64 = 300;

/// Simultaneous builds allowed across all apps
pub const DEFAULT_MAX_CONCURRENT_BUILDS: usize = 2;

/// Package tool used for compiled apps
pub const DEFAULT_BUILD_TOOL: &str = "npm";

/// Candidate build output directories, in lookup order (CRA, then Vite)
pub const DEFAULT_BUILD_OUTPUT_DIRS: &[&str] = &["build", "dist"];

/// Timestamp layout embedded in backup folder names
pub const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Get the Launchpad home directory
pub fn launchpad_home() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(LAUNCHPAD_DIR))
        .unwrap_or_else(|| PathBuf::from(LAUNCHPAD_DIR))
}
