//! Deployment Registry - one JSON record per app

use launchpad_core::{DeploymentRecord, Error, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Stores `deployments/{app_id}.json`
#[derive(Debug, Clone)]
pub struct DeploymentRegistry {
    dir: PathBuf,
}

impl DeploymentRegistry {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn record_path(&self, app_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", app_id))
    }

    /// Write (fully overwrite) the record for `record.app_id`
    pub fn put(&self, record: &DeploymentRecord) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.record_path(&record.app_id);
        let tmp = self.dir.join(format!(".{}.json.tmp", record.app_id));

        let content = serde_json::to_string_pretty(record)?;
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, &path)?;

        debug!("Saved deployment record {}", path.display());
        Ok(())
    }

    /// Read a record; `Ok(None)` when absent, `CorruptRecord` when unreadable
    pub fn load(&self, app_id: &str) -> Result<Option<DeploymentRecord>> {
        let path = self.record_path(app_id);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::Io(e)),
        };
        parse_record(&path, &bytes).map(Some)
    }

    /// Read a record, treating a corrupt one as absent
    pub fn get(&self, app_id: &str) -> Result<Option<DeploymentRecord>> {
        match self.load(app_id) {
            Err(e @ Error::CorruptRecord { .. }) => {
                warn!("{}", e);
                Ok(None)
            }
            other => other,
        }
    }

    /// All readable records, oldest deployment first. Corrupt files are skipped.
    pub fn list(&self) -> Result<Vec<DeploymentRecord>> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut records = Vec::new();
        for entry in std::fs::read_dir(&self.dir)?.flatten() {
            let path = entry.path();
            let is_record = path.extension().is_some_and(|ext| ext == "json")
                && !path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with('.'));
            if !is_record {
                continue;
            }

            // A record can vanish under a concurrent delete
            let bytes = match std::fs::read(&path) {
                Ok(bytes) => bytes,
                Err(e) => {
                    debug!("Skipping unreadable {}: {}", path.display(), e);
                    continue;
                }
            };
            match parse_record(&path, &bytes) {
                Ok(record) => records.push(record),
                Err(e) => warn!("Skipping {}", e),
            }
        }

        records.sort_by(|a, b| {
            a.deployed_at
                .cmp(&b.deployed_at)
                .then_with(|| a.app_id.cmp(&b.app_id))
        });
        Ok(records)
    }

    /// Remove a record. Returns whether it existed.
    pub fn delete(&self, app_id: &str) -> Result<bool> {
        match std::fs::remove_file(self.record_path(app_id)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::Io(e)),
        }
    }
}

fn parse_record(path: &Path, bytes: &[u8]) -> Result<DeploymentRecord> {
    let corrupt = |reason: String| Error::CorruptRecord {
        path: path.to_path_buf(),
        reason,
    };
    let content = std::str::from_utf8(bytes).map_err(|e| corrupt(e.to_string()))?;
    serde_json::from_str(content).map_err(|e| corrupt(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use launchpad_core::{AppType, DeploymentStatus};
    use tempfile::{tempdir, TempDir};

    fn setup() -> (DeploymentRegistry, TempDir) {
        let dir = tempdir().unwrap();
        (DeploymentRegistry::new(dir.path().join("deployments")), dir)
    }

    fn record(app_id: &str) -> DeploymentRecord {
        DeploymentRecord {
            app_id: app_id.to_string(),
            app_name: format!("app-{}", app_id),
            app_type: AppType::Static,
            source_dir: PathBuf::from(format!("/data/apps/{}", app_id)),
            published_dir: PathBuf::from(format!("/data/static/{}", app_id)),
            deployed_at: Utc::now(),
            status: DeploymentStatus::Deployed,
            url: format!("https://{}.launchpad.app", app_id),
            subdomain: app_id.to_string(),
            files: vec!["index.html".to_string()],
            build_output_dir: None,
            build_output: None,
            updated_at: None,
            backup_created: None,
        }
    }

    #[test]
    fn test_put_and_load() {
        let (registry, _dir) = setup();
        let rec = record("x1");
        registry.put(&rec).unwrap();

        assert_eq!(registry.load("x1").unwrap(), Some(rec));
        assert_eq!(registry.load("x2").unwrap(), None);
    }

    #[test]
    fn test_put_overwrites() {
        let (registry, _dir) = setup();
        let mut rec = record("x1");
        registry.put(&rec).unwrap();

        rec.app_name = "renamed".to_string();
        rec.updated_at = Some(Utc::now());
        registry.put(&rec).unwrap();

        let loaded = registry.get("x1").unwrap().unwrap();
        assert_eq!(loaded.app_name, "renamed");
        assert!(loaded.updated_at.is_some());
        assert_eq!(registry.list().unwrap().len(), 1);
    }

    #[test]
    fn test_corrupt_record() {
        let (registry, dir) = setup();
        registry.put(&record("good")).unwrap();
        std::fs::write(dir.path().join("deployments/bad.json"), "{ not json").unwrap();

        assert!(matches!(
            registry.load("bad"),
            Err(Error::CorruptRecord { .. })
        ));
        assert_eq!(registry.get("bad").unwrap(), None);

        let listed = registry.list().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].app_id, "good");
    }

    #[test]
    fn test_non_utf8_record_is_corrupt() {
        let (registry, dir) = setup();
        registry.put(&record("good")).unwrap();
        std::fs::write(dir.path().join("deployments/bad.json"), [0xff, 0xfe, 0x00]).unwrap();

        assert!(matches!(
            registry.load("bad"),
            Err(Error::CorruptRecord { .. })
        ));
        assert_eq!(registry.get("bad").unwrap(), None);

        let listed = registry.list().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].app_id, "good");
    }

    #[cfg(unix)]
    #[test]
    fn test_list_skips_record_removed_while_listing() {
        let (registry, dir) = setup();
        registry.put(&record("good")).unwrap();
        // Listed by read_dir but gone by the time it is read
        std::os::unix::fs::symlink(
            dir.path().join("deployments/missing-target"),
            dir.path().join("deployments/gone.json"),
        )
        .unwrap();

        let listed = registry.list().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].app_id, "good");
        assert_eq!(registry.get("gone").unwrap(), None);
    }

    #[test]
    fn test_list_ordered_by_deploy_time() {
        let (registry, _dir) = setup();
        let mut newer = record("a-newer");
        newer.deployed_at = Utc::now();
        let mut older = record("z-older");
        older.deployed_at = newer.deployed_at - Duration::minutes(5);
        registry.put(&newer).unwrap();
        registry.put(&older).unwrap();

        let ids: Vec<_> = registry.list().unwrap().into_iter().map(|r| r.app_id).collect();
        assert_eq!(ids, vec!["z-older", "a-newer"]);
    }

    #[test]
    fn test_list_empty_without_dir() {
        let (registry, _dir) = setup();
        assert!(registry.list().unwrap().is_empty());
    }

    #[test]
    fn test_delete() {
        let (registry, _dir) = setup();
        registry.put(&record("x1")).unwrap();

        assert!(registry.delete("x1").unwrap());
        assert!(!registry.delete("x1").unwrap());
        assert_eq!(registry.get("x1").unwrap(), None);
    }
}
