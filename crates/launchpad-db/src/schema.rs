//! Database schema for Launchpad

/// SQLite schema initialization
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS domains (
    app_id TEXT PRIMARY KEY NOT NULL,
    subdomain TEXT UNIQUE,
    full_domain TEXT,
    registered_at TEXT,
    custom_domain TEXT,
    custom_domain_registered_at TEXT,
    custom_domain_verified INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_domains_custom_domain ON domains(custom_domain);
"#;
