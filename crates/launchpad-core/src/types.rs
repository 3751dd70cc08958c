//! Core types for Launchpad

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use crate::error::{Error, Result};

/// Regex pattern for valid app ids: only alphanumeric, underscore, and hyphen
static APP_ID_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_-]+$").expect("Invalid app id regex"));

/// Validate an app id so it can be used as a directory and file name in every store
pub fn validate_app_id(app_id: &str) -> bool {
    !app_id.is_empty() && APP_ID_REGEX.is_match(app_id)
}

/// Generate a fresh app id
pub fn generate_app_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Normalize a caller-supplied relative path.
///
/// Returns `None` for empty paths and for anything that could escape the
/// directory it is joined onto (absolute paths, drive prefixes, `..`).
pub fn sanitize_relative_path(path: &str) -> Option<PathBuf> {
    let mut clean = PathBuf::new();
    for component in Path::new(path).components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    if clean.as_os_str().is_empty() {
        None
    } else {
        Some(clean)
    }
}

/// Kind of application being deployed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AppType {
    Static,
    SimpleWebsite,
    Spa,
    ReactApp,
    Compiled,
}

impl AppType {
    /// Whether the source tree must go through the Build Executor before publishing
    pub fn requires_build(&self) -> bool {
        matches!(self, AppType::ReactApp | AppType::Compiled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AppType::Static => "static",
            AppType::SimpleWebsite => "simple_website",
            AppType::Spa => "spa",
            AppType::ReactApp => "react_app",
            AppType::Compiled => "compiled",
        }
    }
}

impl Default for AppType {
    fn default() -> Self {
        AppType::Static
    }
}

impl FromStr for AppType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "static" => Ok(AppType::Static),
            "simple_website" => Ok(AppType::SimpleWebsite),
            "spa" => Ok(AppType::Spa),
            "react_app" => Ok(AppType::ReactApp),
            "compiled" => Ok(AppType::Compiled),
            _ => Err(Error::validation(format!("Unknown app_type: {}", s))),
        }
    }
}

impl std::fmt::Display for AppType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Step of the external build that produced an outcome
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BuildStage {
    Install,
    Build,
}

impl BuildStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildStage::Install => "install",
            BuildStage::Build => "build",
        }
    }
}

impl std::fmt::Display for BuildStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Deployment status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentStatus {
    Deployed,
}

/// Persisted metadata describing an application's current published state
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeploymentRecord {
    pub app_id: String,
    pub app_name: String,
    pub app_type: AppType,
    pub source_dir: PathBuf,
    pub published_dir: PathBuf,
    pub deployed_at: DateTime<Utc>,
    pub status: DeploymentStatus,
    pub url: String,
    pub subdomain: String,
    pub files: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_output_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_created: Option<PathBuf>,
}

/// Subdomain and custom-domain binding for one app
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DomainBinding {
    pub app_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subdomain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registered_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_domain_registered_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub custom_domain_verified: bool,
}

/// Result of registering a subdomain
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubdomainRegistration {
    pub domain: String,
    pub subdomain: String,
}

/// DNS record the caller must create for a custom domain
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DnsInstructions {
    #[serde(rename = "type")]
    pub record_type: String,
    pub name: String,
    pub value: String,
}

impl DnsInstructions {
    pub fn cname(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            record_type: "CNAME".to_string(),
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Result of registering a custom domain
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CustomDomainRegistration {
    pub custom_domain: String,
    pub verification_required: bool,
    pub dns_instructions: DnsInstructions,
}

/// Immutable snapshot of an app's source tree
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BackupSnapshot {
    pub app_id: String,
    pub backup_path: PathBuf,
    pub backup_filename: String,
    pub created_at: DateTime<Utc>,
}

/// Deploy or update request as received from the caller
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeployRequest {
    #[serde(default)]
    pub app_id: Option<String>,
    #[serde(default)]
    pub app_name: Option<String>,
    #[serde(default)]
    pub app_type: Option<String>,
    #[serde(default)]
    pub files: BTreeMap<String, String>,
}

impl DeployRequest {
    pub fn new(app_type: AppType) -> Self {
        Self {
            app_type: Some(app_type.as_str().to_string()),
            ..Default::default()
        }
    }

    pub fn with_app_id(mut self, app_id: impl Into<String>) -> Self {
        self.app_id = Some(app_id.into());
        self
    }

    pub fn with_app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = Some(app_name.into());
        self
    }

    pub fn with_file(mut self, path: impl Into<String>, content: impl Into<String>) -> Self {
        self.files.insert(path.into(), content.into());
        self
    }

    /// Resolve the declared app type, defaulting to static
    pub fn resolved_app_type(&self) -> Result<AppType> {
        match self.app_type.as_deref() {
            None | Some("") => Ok(AppType::default()),
            Some(s) => s.parse(),
        }
    }
}

/// Outcome of a successful deploy or update
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeploymentOutcome {
    #[serde(flatten)]
    pub record: DeploymentRecord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

/// Deployment record joined with its domain binding, for info and list views
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeploymentInfo {
    #[serde(flatten)]
    pub record: DeploymentRecord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain_info: Option<DomainBinding>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_type_from_str() {
        assert_eq!("static".parse::<AppType>().unwrap(), AppType::Static);
        assert_eq!("react_app".parse::<AppType>().unwrap(), AppType::ReactApp);
        assert_eq!("SPA".parse::<AppType>().unwrap(), AppType::Spa);
        assert!(matches!(
            "flutter".parse::<AppType>(),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_app_type_requires_build() {
        assert!(AppType::ReactApp.requires_build());
        assert!(AppType::Compiled.requires_build());
        assert!(!AppType::Static.requires_build());
        assert!(!AppType::SimpleWebsite.requires_build());
        assert!(!AppType::Spa.requires_build());
    }

    #[test]
    fn test_validate_app_id() {
        assert!(validate_app_id("x1"));
        assert!(validate_app_id("3f2b-9c_app"));
        assert!(validate_app_id(&generate_app_id()));
        assert!(!validate_app_id(""));
        assert!(!validate_app_id("../etc"));
        assert!(!validate_app_id("a/b"));
        assert!(!validate_app_id("a.b"));
        assert!(!validate_app_id("a b"));
    }

    #[test]
    fn test_sanitize_relative_path() {
        assert_eq!(
            sanitize_relative_path("index.html"),
            Some(PathBuf::from("index.html"))
        );
        assert_eq!(
            sanitize_relative_path("./src/App.js"),
            Some(PathBuf::from("src/App.js"))
        );
        assert_eq!(sanitize_relative_path(""), None);
        assert_eq!(sanitize_relative_path("."), None);
        assert_eq!(sanitize_relative_path("../secret"), None);
        assert_eq!(sanitize_relative_path("a/../../b"), None);
        assert_eq!(sanitize_relative_path("/etc/passwd"), None);
    }

    #[test]
    fn test_deploy_request_defaults_to_static() {
        let req: DeployRequest = serde_json::from_str(r#"{"files": {}}"#).unwrap();
        assert_eq!(req.resolved_app_type().unwrap(), AppType::Static);

        let req = DeployRequest::new(AppType::ReactApp);
        assert_eq!(req.resolved_app_type().unwrap(), AppType::ReactApp);
    }

    #[test]
    fn test_dns_instructions_serialize_type_field() {
        let dns = DnsInstructions::cname("www.example.com", "x1.launchpad.app");
        let json = serde_json::to_value(&dns).unwrap();
        assert_eq!(json["type"], "CNAME");
        assert_eq!(json["name"], "www.example.com");
        assert_eq!(json["value"], "x1.launchpad.app");
    }

    #[test]
    fn test_domain_binding_verified_defaults_false() {
        let binding: DomainBinding =
            serde_json::from_str(r#"{"app_id": "x1", "custom_domain": "a.example.com"}"#).unwrap();
        assert!(!binding.custom_domain_verified);
        assert!(binding.subdomain.is_none());
    }
}
