//! Launchpad Database - SQLite persistence for domain bindings

pub mod domains;
pub mod schema;

use launchpad_core::{Error, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::info;

pub use domains::DomainRegistry;

/// Connections kept open for domain lookups; writes are serialized separately
const MAX_CONNECTIONS: u32 = 5;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle to the domain store shared by every request
pub struct Database {
    pool: SqlitePool,
    write_lock: Arc<Mutex<()>>,
}

impl Database {
    /// Open `domains.db` at `path`, creating the file and schema on first use.
    ///
    /// The journal runs in WAL mode so lookups are not blocked by a
    /// registration in progress.
    pub async fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        info!("Opening domain store at {}", path.display());
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await
            .map_err(db_error)?;
        restrict_to_owner(path);

        sqlx::query(schema::SCHEMA)
            .execute(&pool)
            .await
            .map_err(db_error)?;

        Ok(Self {
            pool,
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Domain registry resolving subdomains under `base_domain`
    pub fn domains(&self, base_domain: impl Into<String>) -> DomainRegistry {
        DomainRegistry::new(self.pool.clone(), self.write_lock.clone(), base_domain)
    }

    /// Drain the pool; called once on shutdown
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn db_error(e: sqlx::Error) -> Error {
    Error::db(e.to_string())
}

/// Bindings are operator data; keep the file 0600
#[cfg(unix)]
fn restrict_to_owner(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Err(e) = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)) {
        tracing::warn!("Could not restrict {}: {}", path.display(), e);
    }
}

#[cfg(not(unix))]
fn restrict_to_owner(_path: &Path) {}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_database_creation() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("nested/domains.db");

        let db = Database::new(&db_path).await.unwrap();
        assert!(db_path.exists());

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&db_path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
        db.close().await;
    }

    #[tokio::test]
    async fn test_reopen_keeps_data() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("domains.db");

        let db = Database::new(&db_path).await.unwrap();
        db.domains("launchpad.app")
            .register_subdomain("x1", "shop")
            .await
            .unwrap();
        db.close().await;

        let db = Database::new(&db_path).await.unwrap();
        let binding = db.domains("launchpad.app").get_info("x1").await.unwrap();
        assert_eq!(binding.and_then(|b| b.subdomain).as_deref(), Some("shop"));
    }
}
