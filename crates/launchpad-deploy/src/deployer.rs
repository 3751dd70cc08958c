//! Deployer - drives apps through deploy, update, delete and backup

use chrono::Utc;
use launchpad_core::{
    generate_app_id, validate_app_id, AppType, BackupSnapshot, CustomDomainRegistration,
    DeployRequest, DeploymentInfo, DeploymentOutcome, DeploymentRecord, DeploymentStatus,
    DomainBinding, Error, LaunchpadConfig, Result, SubdomainRegistration,
};
use launchpad_db::{Database, DomainRegistry};
use launchpad_runtime::{BuildExecutor, ProcessRunner, TokioProcessRunner};
use launchpad_store::{
    ensure_layout, validate_file_paths, BackupManager, DeploymentRegistry, FileTreeWriter,
    PublicationStore, StaticResolver,
};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::locks::AppLocks;

/// Owns every store and coordinates lifecycle transitions.
///
/// Deploy, update, delete and backup hold the app's lock for their whole
/// duration. Serving never takes a lock.
pub struct Deployer {
    config: LaunchpadConfig,
    db: Database,
    domains: DomainRegistry,
    tree: FileTreeWriter,
    publisher: PublicationStore,
    backups: BackupManager,
    records: DeploymentRegistry,
    resolver: StaticResolver,
    builds: BuildExecutor,
    locks: AppLocks,
}

impl Deployer {
    /// Open the stores under `config.data_dir`, building with real processes
    pub async fn open(config: LaunchpadConfig) -> Result<Self> {
        Self::with_runner(config, Arc::new(TokioProcessRunner)).await
    }

    /// Open the stores with a custom process runner for builds
    pub async fn with_runner(
        config: LaunchpadConfig,
        runner: Arc<dyn ProcessRunner>,
    ) -> Result<Self> {
        config.validate()?;
        ensure_layout(&config)?;

        let db = Database::new(&config.domains_db_path()).await?;
        let domains = db.domains(config.base_domain.clone());

        info!(
            "Deployer ready (data dir {}, base domain {})",
            config.data_dir.display(),
            config.base_domain
        );

        Ok(Self {
            domains,
            tree: FileTreeWriter::new(config.apps_dir()),
            publisher: PublicationStore::new(config.static_dir()),
            backups: BackupManager::new(config.apps_dir(), config.backups_dir()),
            records: DeploymentRegistry::new(config.deployments_dir()),
            resolver: StaticResolver::new(config.static_dir(), config.root_document.clone()),
            builds: BuildExecutor::new(&config.build, runner),
            locks: AppLocks::new(),
            db,
            config,
        })
    }

    pub fn config(&self) -> &LaunchpadConfig {
        &self.config
    }

    /// Deploy (or redeploy) an app from its full file map
    pub async fn deploy(&self, request: DeployRequest) -> Result<DeploymentOutcome> {
        let app_type = request.resolved_app_type()?;
        let app_id = match request.app_id.as_deref().filter(|id| !id.is_empty()) {
            Some(id) => checked_app_id(id)?,
            None => generate_app_id(),
        };
        let app_name = request
            .app_name
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| default_app_name(&app_id));

        info!("Deploying {} ({}) as {}", app_id, app_name, app_type);
        let _guard = self.locks.acquire(&app_id).await;

        let record = self
            .run_pipeline(&app_id, app_name, app_type, request.files)
            .await?;
        self.records.put(&record)?;

        let domain = self.ensure_default_subdomain(&app_id).await;
        info!("Deployed {} to {}", app_id, record.url);
        Ok(DeploymentOutcome { record, domain })
    }

    /// Back up the current source, then redeploy an existing app.
    ///
    /// Missing `app_name`/`app_type` keep the values of the current record.
    pub async fn update(&self, app_id: &str, request: DeployRequest) -> Result<DeploymentOutcome> {
        let app_id = checked_app_id(app_id)?;
        let _guard = self.locks.acquire(&app_id).await;

        let existing = self
            .records
            .get(&app_id)?
            .ok_or_else(|| Error::NotFound(app_id.clone()))?;

        let app_type = match request.app_type.as_deref() {
            None | Some("") => existing.app_type,
            Some(_) => request.resolved_app_type()?,
        };
        let app_name = request
            .app_name
            .filter(|name| !name.is_empty())
            .unwrap_or(existing.app_name);
        validate_file_paths(&request.files)?;

        let snapshot = self.snapshot(&app_id).await?;
        info!("Updating {} (backup at {})", app_id, snapshot.backup_path.display());

        let mut record = self
            .run_pipeline(&app_id, app_name, app_type, request.files)
            .await?;
        record.updated_at = Some(Utc::now());
        record.backup_created = Some(snapshot.backup_path);
        self.records.put(&record)?;

        let domain = self.ensure_default_subdomain(&app_id).await;
        Ok(DeploymentOutcome { record, domain })
    }

    /// Remove the app's source and published trees.
    ///
    /// With `cascade_delete` the deployment record and domain binding go too;
    /// otherwise they are left in place.
    pub async fn delete(&self, app_id: &str) -> Result<()> {
        let app_id = checked_app_id(app_id)?;
        let _guard = self.locks.acquire(&app_id).await;

        let removed_source = self.tree.remove(&app_id)?;
        let removed_published = self.publisher.remove(&app_id)?;
        info!(
            "Deleted {} (source: {}, published: {})",
            app_id, removed_source, removed_published
        );

        if !self.config.cascade_delete {
            return Ok(());
        }

        if let Err(e) = self.records.delete(&app_id) {
            error!("Failed to delete deployment record for {}: {}", app_id, e);
        }
        if let Err(e) = self.domains.delete(&app_id).await {
            error!("Failed to delete domain binding for {}: {}", app_id, e);
        }
        Ok(())
    }

    /// Snapshot the app's current source tree
    pub async fn backup(&self, app_id: &str) -> Result<BackupSnapshot> {
        let app_id = checked_app_id(app_id)?;
        let _guard = self.locks.acquire(&app_id).await;
        self.snapshot(&app_id).await
    }

    /// Deployment record joined with its domain binding
    pub async fn info(&self, app_id: &str) -> Result<DeploymentInfo> {
        if !validate_app_id(app_id) {
            return Err(Error::NotFound(app_id.to_string()));
        }
        let record = self
            .records
            .get(app_id)?
            .ok_or_else(|| Error::NotFound(app_id.to_string()))?;
        self.join_domain(record).await
    }

    /// Every readable deployment, oldest first
    pub async fn list(&self) -> Result<Vec<DeploymentInfo>> {
        let mut infos = Vec::new();
        for record in self.records.list()? {
            infos.push(self.join_domain(record).await?);
        }
        Ok(infos)
    }

    /// Resolve a request path to a published file, with SPA fallback
    pub fn resolve(&self, app_id: &str, path: Option<&str>) -> Result<PathBuf> {
        self.resolver.resolve(app_id, path)
    }

    pub async fn register_subdomain(
        &self,
        app_id: &str,
        subdomain: &str,
    ) -> Result<SubdomainRegistration> {
        self.domains.register_subdomain(app_id, subdomain).await
    }

    pub async fn register_custom_domain(
        &self,
        app_id: &str,
        custom_domain: &str,
    ) -> Result<CustomDomainRegistration> {
        self.domains.register_custom_domain(app_id, custom_domain).await
    }

    pub async fn domain_info(&self, app_id: &str) -> Result<DomainBinding> {
        self.domains
            .get_info(app_id)
            .await?
            .ok_or_else(|| Error::NotFound(app_id.to_string()))
    }

    /// Close the domain database
    pub async fn shutdown(&self) {
        self.db.close().await;
    }

    /// write tree -> build (compiled types only) -> publish
    async fn run_pipeline(
        &self,
        app_id: &str,
        app_name: String,
        app_type: AppType,
        files: BTreeMap<String, String>,
    ) -> Result<DeploymentRecord> {
        let file_list: Vec<String> = files.keys().cloned().collect();

        let tree = self.tree.clone();
        let id = app_id.to_string();
        let source_dir = blocking(move || tree.write(&id, &files)).await?;

        let (publish_from, build_output_dir, build_output) = if app_type.requires_build() {
            let artifact = self.builds.build(&source_dir).await?;
            (
                artifact.output_dir.clone(),
                Some(artifact.output_dir),
                Some(artifact.stdout),
            )
        } else {
            (source_dir.clone(), None, None)
        };

        let publisher = self.publisher.clone();
        let id = app_id.to_string();
        let published_dir = blocking(move || publisher.publish(&id, &publish_from)).await?;

        Ok(DeploymentRecord {
            app_id: app_id.to_string(),
            app_name,
            app_type,
            source_dir,
            published_dir,
            deployed_at: Utc::now(),
            status: DeploymentStatus::Deployed,
            url: format!("https://{}.{}", app_id, self.config.base_domain),
            subdomain: app_id.to_string(),
            files: file_list,
            build_output_dir,
            build_output,
            updated_at: None,
            backup_created: None,
        })
    }

    async fn snapshot(&self, app_id: &str) -> Result<BackupSnapshot> {
        let backups = self.backups.clone();
        let id = app_id.to_string();
        blocking(move || backups.snapshot(&id)).await
    }

    /// Register the app id as subdomain unless the app already has one.
    /// Failures are logged and never fail the deploy.
    async fn ensure_default_subdomain(&self, app_id: &str) -> Option<String> {
        match self.domains.get_info(app_id).await {
            Ok(Some(DomainBinding {
                full_domain: Some(full_domain),
                ..
            })) => return Some(full_domain),
            Ok(_) => {}
            Err(e) => warn!("Failed to look up domain binding for {}: {}", app_id, e),
        }

        match self.domains.register_subdomain(app_id, app_id).await {
            Ok(registration) => Some(registration.domain),
            Err(e) => {
                warn!("Failed to register default subdomain for {}: {}", app_id, e);
                None
            }
        }
    }

    async fn join_domain(&self, record: DeploymentRecord) -> Result<DeploymentInfo> {
        let domain_info = self.domains.get_info(&record.app_id).await?;
        Ok(DeploymentInfo {
            record,
            domain_info,
        })
    }
}

fn checked_app_id(app_id: &str) -> Result<String> {
    if validate_app_id(app_id) {
        Ok(app_id.to_string())
    } else {
        Err(Error::validation(format!("Invalid app_id: {}", app_id)))
    }
}

fn default_app_name(app_id: &str) -> String {
    format!("app-{}", app_id)
}

/// Run filesystem-heavy work off the async workers
async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Error::Io(std::io::Error::other(e)))?
}
