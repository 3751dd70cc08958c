//! CLI argument definitions

use clap::Parser;
use launchpad_core::{LaunchpadConfig, Result};
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(name = "launchpadd")]
#[command(version, about = "Deploys static and compiled web apps behind per-app subdomains")]
pub struct Cli {
    /// Config file (.toml, .yaml, .yml or .json). Defaults to launchpad.* in the working directory
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Root directory for apps, published trees, backups and records
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Address for the HTTP API
    #[arg(short, long)]
    pub bind: Option<String>,

    /// Domain under which app subdomains are issued
    #[arg(long)]
    pub base_domain: Option<String>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Config file, then environment, then flags. Returns the file used, if any.
    pub fn resolve_config<F>(&self, cwd: &Path, env: F) -> Result<(LaunchpadConfig, Option<PathBuf>)>
    where
        F: Fn(&str) -> Option<String>,
    {
        let (mut config, source) = match &self.config {
            Some(path) => (LaunchpadConfig::load(path)?, Some(path.clone())),
            None => LaunchpadConfig::find_and_load(cwd)?,
        };

        config.apply_env_overrides(env)?;

        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(bind) = &self.bind {
            config.bind = bind.clone();
        }
        if let Some(domain) = &self.base_domain {
            config.base_domain = domain.clone();
        }

        config.validate()?;
        Ok((config, source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use launchpad_core::Error;
    use tempfile::tempdir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_parse_flags() {
        let cli = Cli::try_parse_from([
            "launchpadd",
            "--data-dir",
            "/srv/launchpad",
            "-b",
            "127.0.0.1:9000",
            "-vv",
        ])
        .unwrap();

        assert_eq!(cli.data_dir, Some(PathBuf::from("/srv/launchpad")));
        assert_eq!(cli.bind.as_deref(), Some("127.0.0.1:9000"));
        assert_eq!(cli.verbose, 2);
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_unknown_flag_rejected() {
        assert!(Cli::try_parse_from(["launchpadd", "--frobnicate"]).is_err());
    }

    #[test]
    fn test_defaults_without_config_file() {
        let dir = tempdir().unwrap();
        let cli = Cli::try_parse_from(["launchpadd"]).unwrap();

        let (config, source) = cli.resolve_config(dir.path(), no_env).unwrap();
        assert!(source.is_none());
        assert_eq!(config.base_domain, "launchpad.app");
        assert_eq!(config.bind, "0.0.0.0:8080");
    }

    #[test]
    fn test_precedence_file_env_flags() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("launchpad.toml"),
            "base_domain = \"file.dev\"\nbind = \"127.0.0.1:1000\"\n\n[build]\ntimeout_secs = 60\n",
        )
        .unwrap();

        let env = |key: &str| match key {
            "LAUNCHPAD_BIND" => Some("127.0.0.1:2000".to_string()),
            "LAUNCHPAD_BASE_DOMAIN" => Some("env.dev".to_string()),
            _ => None,
        };
        let cli = Cli::try_parse_from(["launchpadd", "--base-domain", "flag.dev"]).unwrap();

        let (config, source) = cli.resolve_config(dir.path(), env).unwrap();
        assert_eq!(source, Some(dir.path().join("launchpad.toml")));
        assert_eq!(config.build.timeout_secs, 60);
        assert_eq!(config.bind, "127.0.0.1:2000");
        assert_eq!(config.base_domain, "flag.dev");
    }

    #[test]
    fn test_explicit_config_must_exist() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let cli = Cli::try_parse_from(["launchpadd", "--config", missing.to_str().unwrap()]).unwrap();

        assert!(matches!(
            cli.resolve_config(dir.path(), no_env),
            Err(Error::ConfigNotFound(_))
        ));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("launchpad.yaml"),
            "build:\n  tool: bun\n",
        )
        .unwrap();
        let cli = Cli::try_parse_from(["launchpadd"]).unwrap();

        assert!(matches!(
            cli.resolve_config(dir.path(), no_env),
            Err(Error::Config(_))
        ));
    }
}
