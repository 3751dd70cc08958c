//! Configuration file parsing for Launchpad
//!
//! Supports multiple configuration file formats:
//! - TOML (.toml)
//! - YAML (.yaml, .yml)
//! - JSON (.json)

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::*;
use crate::error::{Error, Result};
use crate::types::sanitize_relative_path;

/// Package tools the Build Executor knows how to drive
pub const SUPPORTED_BUILD_TOOLS: &[&str] = &["npm", "pnpm", "yarn"];

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Yaml,
    Json,
}

impl ConfigFormat {
    /// Detect format from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(ConfigFormat::Toml),
            "yaml" | "yml" => Some(ConfigFormat::Yaml),
            "json" => Some(ConfigFormat::Json),
            _ => None,
        }
    }

    /// Detect format from file path
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

/// Build section of the config file
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct BuildConfig {
    /// Package tool used for install and build (npm, pnpm, yarn)
    pub tool: String,
    /// Timeout applied to each of the install and build steps
    pub timeout_secs: u64,
    /// Maximum number of builds running at once
    pub max_concurrent: usize,
    /// Output directories probed after a successful build, in order
    pub output_dirs: Vec<String>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            tool: DEFAULT_BUILD_TOOL.to_string(),
            timeout_secs: DEFAULT_BUILD_TIMEOUT_SECS,
            max_concurrent: DEFAULT_MAX_CONCURRENT_BUILDS,
            output_dirs: DEFAULT_BUILD_OUTPUT_DIRS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl BuildConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Daemon configuration (launchpad.toml/yaml/json)
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LaunchpadConfig {
    /// Root directory for every store
    pub data_dir: PathBuf,
    /// Domain under which app subdomains are registered
    pub base_domain: String,
    /// HTTP bind address
    pub bind: String,
    /// Root document of a published tree
    pub root_document: String,
    /// Remove deployment records and domain bindings when an app is deleted
    pub cascade_delete: bool,
    /// Directory for rolling log files; stdout only when unset
    pub log_dir: Option<PathBuf>,
    pub build: BuildConfig,
}

impl Default for LaunchpadConfig {
    fn default() -> Self {
        Self {
            data_dir: launchpad_home(),
            base_domain: DEFAULT_BASE_DOMAIN.to_string(),
            bind: DEFAULT_BIND.to_string(),
            root_document: DEFAULT_ROOT_DOCUMENT.to_string(),
            cascade_delete: true,
            log_dir: None,
            build: BuildConfig::default(),
        }
    }
}

impl LaunchpadConfig {
    /// Config rooted at `data_dir` with every other field defaulted
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Default::default()
        }
    }

    /// Load config from file, automatically detecting format from extension
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ConfigNotFound(path.to_path_buf()));
        }

        let format = ConfigFormat::from_path(path).ok_or_else(|| {
            Error::Config(format!(
                "Unsupported config file extension: {}. Expected .toml, .yaml, .yml, or .json",
                path.display()
            ))
        })?;

        let content = std::fs::read_to_string(path)?;
        Self::parse(&content, format)
    }

    /// Parse config content with specified format
    pub fn parse(content: &str, format: ConfigFormat) -> Result<Self> {
        let config: LaunchpadConfig = match format {
            ConfigFormat::Toml => toml::from_str(content)?,
            ConfigFormat::Yaml => serde_yaml::from_str(content)?,
            ConfigFormat::Json => serde_json::from_str(content)?,
        };
        Ok(config)
    }

    /// Find and load a config file from `dir`, falling back to defaults
    pub fn find_and_load(dir: &Path) -> Result<(Self, Option<PathBuf>)> {
        for name in CONFIG_FILES {
            let path = dir.join(name);
            if path.exists() {
                let config = Self::load(&path)?;
                return Ok((config, Some(path)));
            }
        }
        Ok((Self::default(), None))
    }

    /// Apply `LAUNCHPAD_*` overrides. `lookup` is usually `std::env::var(..).ok()`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("LAUNCHPAD_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(domain) = lookup("LAUNCHPAD_BASE_DOMAIN") {
            self.base_domain = domain;
        }
        if let Some(bind) = lookup("LAUNCHPAD_BIND") {
            self.bind = bind;
        }
        if let Some(secs) = lookup("LAUNCHPAD_BUILD_TIMEOUT_SECS") {
            self.build.timeout_secs = secs.parse().map_err(|_| {
                Error::config(format!("LAUNCHPAD_BUILD_TIMEOUT_SECS is not a number: {}", secs))
            })?;
        }
        Ok(())
    }

    /// Check invariants the rest of the system relies on
    pub fn validate(&self) -> Result<()> {
        if self.base_domain.trim().is_empty() {
            return Err(Error::config("base_domain must not be empty"));
        }
        if sanitize_relative_path(&self.root_document).is_none() {
            return Err(Error::config(format!(
                "root_document must be a relative path: {}",
                self.root_document
            )));
        }
        if !SUPPORTED_BUILD_TOOLS.contains(&self.build.tool.as_str()) {
            return Err(Error::config(format!(
                "Unsupported build tool '{}'. Expected one of {:?}",
                self.build.tool, SUPPORTED_BUILD_TOOLS
            )));
        }
        if self.build.max_concurrent == 0 {
            return Err(Error::config("build.max_concurrent must be at least 1"));
        }
        if self.build.timeout_secs == 0 {
            return Err(Error::config("build.timeout_secs must be at least 1"));
        }
        if self.build.output_dirs.is_empty() {
            return Err(Error::config("build.output_dirs must list at least one directory"));
        }
        Ok(())
    }

    pub fn apps_dir(&self) -> PathBuf {
        self.data_dir.join(APPS_DIR)
    }

    pub fn static_dir(&self) -> PathBuf {
        self.data_dir.join(STATIC_DIR)
    }

    pub fn backups_dir(&self) -> PathBuf {
        self.data_dir.join(BACKUPS_DIR)
    }

    pub fn deployments_dir(&self) -> PathBuf {
        self.data_dir.join(DEPLOYMENTS_DIR)
    }

    pub fn domains_db_path(&self) -> PathBuf {
        self.data_dir.join(DOMAINS_DB_FILE)
    }
}
