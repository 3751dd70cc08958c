//! Backup Manager - timestamped source tree snapshots

use chrono::Utc;
use launchpad_core::{BackupSnapshot, Error, Result, BACKUP_TIMESTAMP_FORMAT};
use std::path::PathBuf;
use tracing::info;

use crate::tree::copy_tree;

/// Snapshots `apps/{app_id}` into `backups/{app_id}/{app_id}_backup_{timestamp}`.
/// Snapshots are never pruned.
#[derive(Debug, Clone)]
pub struct BackupManager {
    apps_dir: PathBuf,
    backups_dir: PathBuf,
}

impl BackupManager {
    pub fn new(apps_dir: impl Into<PathBuf>, backups_dir: impl Into<PathBuf>) -> Self {
        Self {
            apps_dir: apps_dir.into(),
            backups_dir: backups_dir.into(),
        }
    }

    /// Directory holding every snapshot of one app
    pub fn app_backups_dir(&self, app_id: &str) -> PathBuf {
        self.backups_dir.join(app_id)
    }

    /// Copy the app's current source tree to a new snapshot
    pub fn snapshot(&self, app_id: &str) -> Result<BackupSnapshot> {
        let source = self.apps_dir.join(app_id);
        if !source.is_dir() {
            return Err(Error::NotFound(app_id.to_string()));
        }

        let created_at = Utc::now();
        let base = format!(
            "{}_backup_{}",
            app_id,
            created_at.format(BACKUP_TIMESTAMP_FORMAT)
        );

        let parent = self.app_backups_dir(app_id);
        std::fs::create_dir_all(&parent)?;

        // Two snapshots within the same second get a numeric suffix
        let mut backup_filename = base.clone();
        let mut n = 1;
        while parent.join(&backup_filename).exists() {
            backup_filename = format!("{}_{}", base, n);
            n += 1;
        }

        let backup_path = parent.join(&backup_filename);
        let copied = copy_tree(&source, &backup_path)?;
        info!(
            "Backed up {} ({} files) to {}",
            app_id,
            copied,
            backup_path.display()
        );

        Ok(BackupSnapshot {
            app_id: app_id.to_string(),
            backup_path,
            backup_filename,
            created_at,
        })
    }

    /// Existing snapshot directories for an app, oldest first
    pub fn list(&self, app_id: &str) -> Result<Vec<PathBuf>> {
        let dir = self.app_backups_dir(app_id);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut snapshots = std::fs::read_dir(&dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .collect::<Vec<_>>();
        snapshots.sort();
        Ok(snapshots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn setup() -> (BackupManager, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let manager = BackupManager::new(dir.path().join("apps"), dir.path().join("backups"));
        (manager, dir)
    }

    #[test]
    fn test_snapshot_copies_source() {
        let (manager, dir) = setup();
        let app = dir.path().join("apps/x1");
        std::fs::create_dir_all(app.join("src")).unwrap();
        std::fs::write(app.join("index.html"), "v1").unwrap();
        std::fs::write(app.join("src/main.js"), "main").unwrap();

        let snapshot = manager.snapshot("x1").unwrap();

        assert_eq!(snapshot.app_id, "x1");
        assert!(snapshot.backup_filename.starts_with("x1_backup_"));
        assert_eq!(
            snapshot.backup_path,
            dir.path().join("backups/x1").join(&snapshot.backup_filename)
        );
        assert_eq!(
            std::fs::read_to_string(snapshot.backup_path.join("index.html")).unwrap(),
            "v1"
        );
        assert_eq!(
            std::fs::read_to_string(snapshot.backup_path.join("src/main.js")).unwrap(),
            "main"
        );
    }

    #[test]
    fn test_snapshot_filename_format() {
        let (manager, dir) = setup();
        std::fs::create_dir_all(dir.path().join("apps/x1")).unwrap();

        let snapshot = manager.snapshot("x1").unwrap();
        let stamp = snapshot.backup_filename.trim_start_matches("x1_backup_");
        // YYYYmmdd_HHMMSS
        assert_eq!(stamp.len(), 15);
        assert_eq!(&stamp[8..9], "_");
        assert!(stamp.chars().filter(|c| *c != '_').all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_snapshot_missing_source() {
        let (manager, _dir) = setup();
        let err = manager.snapshot("ghost").unwrap_err();
        assert!(matches!(err, Error::NotFound(ref id) if id == "ghost"));
    }

    #[test]
    fn test_snapshots_accumulate() {
        let (manager, dir) = setup();
        let app = dir.path().join("apps/x1");
        std::fs::create_dir_all(&app).unwrap();
        std::fs::write(app.join("index.html"), "v1").unwrap();

        let first = manager.snapshot("x1").unwrap();
        let second = manager.snapshot("x1").unwrap();

        assert_ne!(first.backup_path, second.backup_path);
        assert_eq!(manager.list("x1").unwrap().len(), 2);
        assert!(manager.list("other").unwrap().is_empty());
    }
}
