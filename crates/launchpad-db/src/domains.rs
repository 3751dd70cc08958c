//! Domain registry - subdomain and custom-domain bindings

use chrono::{DateTime, Utc};
use launchpad_core::{
    validate_app_id, CustomDomainRegistration, DnsInstructions, DomainBinding, Error, Result,
    SubdomainRegistration,
};
use once_cell::sync::Lazy;
use regex::Regex;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

/// Hostname made of dot-separated labels, at least two of them
static HOSTNAME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([a-zA-Z0-9]([a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?\.)+[a-zA-Z0-9]([a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?$")
        .expect("Invalid hostname regex")
});

/// Single DNS label: alphanumeric ends, hyphens inside, at most 63 chars
static SUBDOMAIN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9]([a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?$").expect("Invalid subdomain regex")
});

/// Repository for domain bindings.
///
/// Subdomains are unique across all apps (compared case-sensitively).
/// Custom domains are not checked for uniqueness.
#[derive(Clone)]
pub struct DomainRegistry {
    pool: SqlitePool,
    write_lock: Arc<Mutex<()>>,
    base_domain: String,
}

impl DomainRegistry {
    pub fn new(pool: SqlitePool, write_lock: Arc<Mutex<()>>, base_domain: impl Into<String>) -> Self {
        Self {
            pool,
            write_lock,
            base_domain: base_domain.into(),
        }
    }

    pub fn base_domain(&self) -> &str {
        &self.base_domain
    }

    /// Fully-qualified name for a subdomain
    pub fn full_domain(&self, subdomain: &str) -> String {
        format!("{}.{}", subdomain, self.base_domain)
    }

    /// Bind `subdomain` to `app_id`, replacing any subdomain the app held before.
    /// Fails with `SubdomainTaken` if another app holds it.
    pub async fn register_subdomain(
        &self,
        app_id: &str,
        subdomain: &str,
    ) -> Result<SubdomainRegistration> {
        if !validate_app_id(app_id) {
            return Err(Error::validation(format!("Invalid app_id: {}", app_id)));
        }
        if !SUBDOMAIN_REGEX.is_match(subdomain) {
            return Err(Error::validation(format!("Invalid subdomain: {}", subdomain)));
        }

        let _guard = self.write_lock.lock().await;

        let holder: Option<(String,)> =
            sqlx::query_as("SELECT app_id FROM domains WHERE subdomain = ? AND app_id != ?")
                .bind(subdomain)
                .bind(app_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| Error::db(e.to_string()))?;

        if holder.is_some() {
            return Err(Error::SubdomainTaken(subdomain.to_string()));
        }

        let full_domain = self.full_domain(subdomain);
        sqlx::query(
            r#"
            INSERT INTO domains (app_id, subdomain, full_domain, registered_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(app_id) DO UPDATE SET
                subdomain = excluded.subdomain,
                full_domain = excluded.full_domain,
                registered_at = excluded.registered_at
            "#,
        )
        .bind(app_id)
        .bind(subdomain)
        .bind(&full_domain)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                Error::SubdomainTaken(subdomain.to_string())
            }
            other => Error::db(other.to_string()),
        })?;

        info!("Registered subdomain {} for {}", full_domain, app_id);
        Ok(SubdomainRegistration {
            domain: full_domain,
            subdomain: subdomain.to_string(),
        })
    }

    /// Attach a custom domain to `app_id`. Always resets verification.
    pub async fn register_custom_domain(
        &self,
        app_id: &str,
        custom_domain: &str,
    ) -> Result<CustomDomainRegistration> {
        if !validate_app_id(app_id) {
            return Err(Error::validation(format!("Invalid app_id: {}", app_id)));
        }
        let custom_domain = custom_domain.trim().trim_end_matches('.').to_ascii_lowercase();
        if custom_domain.len() > 253 || !HOSTNAME_REGEX.is_match(&custom_domain) {
            return Err(Error::validation(format!(
                "Invalid custom domain: {}",
                custom_domain
            )));
        }

        let _guard = self.write_lock.lock().await;

        sqlx::query(
            r#"
            INSERT INTO domains (app_id, custom_domain, custom_domain_registered_at, custom_domain_verified)
            VALUES (?, ?, ?, 0)
            ON CONFLICT(app_id) DO UPDATE SET
                custom_domain = excluded.custom_domain,
                custom_domain_registered_at = excluded.custom_domain_registered_at,
                custom_domain_verified = 0
            "#,
        )
        .bind(app_id)
        .bind(&custom_domain)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| Error::db(e.to_string()))?;

        info!("Registered custom domain {} for {}", custom_domain, app_id);
        let target = self.full_domain(app_id);
        Ok(CustomDomainRegistration {
            dns_instructions: DnsInstructions::cname(custom_domain.clone(), target),
            custom_domain,
            verification_required: true,
        })
    }

    /// Binding for an app, if any
    pub async fn get_info(&self, app_id: &str) -> Result<Option<DomainBinding>> {
        let row = sqlx::query(
            r#"
            SELECT app_id, subdomain, full_domain, registered_at, custom_domain,
                   custom_domain_registered_at, custom_domain_verified
            FROM domains WHERE app_id = ?
            "#,
        )
        .bind(app_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Error::db(e.to_string()))?;

        row.as_ref().map(row_to_binding).transpose()
    }

    /// Remove an app's binding. Returns whether one existed.
    pub async fn delete(&self, app_id: &str) -> Result<bool> {
        let _guard = self.write_lock.lock().await;

        let result = sqlx::query("DELETE FROM domains WHERE app_id = ?")
            .bind(app_id)
            .execute(&self.pool)
            .await
            .map_err(|e| Error::db(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}

fn parse_timestamp(value: Option<String>) -> Result<Option<DateTime<Utc>>> {
    value
        .map(|s| {
            DateTime::parse_from_rfc3339(&s)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| Error::db(format!("Invalid timestamp '{}': {}", s, e)))
        })
        .transpose()
}

fn row_to_binding(row: &SqliteRow) -> Result<DomainBinding> {
    Ok(DomainBinding {
        app_id: row.get("app_id"),
        subdomain: row.get("subdomain"),
        full_domain: row.get("full_domain"),
        registered_at: parse_timestamp(row.get("registered_at"))?,
        custom_domain: row.get("custom_domain"),
        custom_domain_registered_at: parse_timestamp(row.get("custom_domain_registered_at"))?,
        custom_domain_verified: row.get("custom_domain_verified"),
    })
}
