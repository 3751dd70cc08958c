//! File Tree Writer and recursive copy helpers

use launchpad_core::{sanitize_relative_path, validate_app_id, Error, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Materializes an app's file map as its source tree
#[derive(Debug, Clone)]
pub struct FileTreeWriter {
    apps_dir: PathBuf,
}

impl FileTreeWriter {
    pub fn new(apps_dir: impl Into<PathBuf>) -> Self {
        Self {
            apps_dir: apps_dir.into(),
        }
    }

    /// Source directory for an app
    pub fn source_dir(&self, app_id: &str) -> PathBuf {
        self.apps_dir.join(app_id)
    }

    /// Replace the app's source tree with exactly `files`.
    ///
    /// Every path is validated before anything is removed. A write failure
    /// part-way leaves the tree partially written.
    pub fn write(&self, app_id: &str, files: &BTreeMap<String, String>) -> Result<PathBuf> {
        if !validate_app_id(app_id) {
            return Err(Error::validation(format!("Invalid app_id: {}", app_id)));
        }

        let entries = checked_entries(files)?;

        let app_dir = self.source_dir(app_id);
        remove_dir_if_exists(&app_dir)?;
        std::fs::create_dir_all(&app_dir)?;

        for (rel, content) in entries {
            let full_path = app_dir.join(&rel);
            if let Some(parent) = full_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&full_path, content)?;
            debug!("Wrote {}", full_path.display());
        }

        info!("Wrote {} files to {}", files.len(), app_dir.display());
        Ok(app_dir)
    }

    /// Remove the app's source tree. Returns whether anything was removed.
    pub fn remove(&self, app_id: &str) -> Result<bool> {
        remove_dir_if_exists(&self.source_dir(app_id))
    }
}

/// Reject any file map containing an absolute or escaping path
pub fn validate_file_paths(files: &BTreeMap<String, String>) -> Result<()> {
    checked_entries(files).map(|_| ())
}

fn checked_entries(files: &BTreeMap<String, String>) -> Result<Vec<(PathBuf, &String)>> {
    files
        .iter()
        .map(|(path, content)| {
            sanitize_relative_path(path)
                .map(|rel| (rel, content))
                .ok_or_else(|| Error::validation(format!("Invalid file path: {}", path)))
        })
        .collect()
}

/// Remove a directory tree if present. Returns whether it existed.
pub fn remove_dir_if_exists(path: &Path) -> Result<bool> {
    match std::fs::remove_dir_all(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(Error::Io(e)),
    }
}

/// Recursively copy `src` into `dst` (created if missing). Returns the number of files copied.
pub fn copy_tree(src: &Path, dst: &Path) -> Result<u64> {
    std::fs::create_dir_all(dst)?;
    let mut copied = 0;

    for entry in WalkDir::new(src).min_depth(1).follow_links(false) {
        let entry = entry.map_err(std::io::Error::from)?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(std::io::Error::other)?;
        let target = dst.join(rel);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            std::fs::create_dir_all(&target)?;
        } else if file_type.is_symlink() {
            copy_symlink(entry.path(), &target)?;
        } else {
            std::fs::copy(entry.path(), &target)?;
            copied += 1;
        }
    }

    Ok(copied)
}

#[cfg(unix)]
fn copy_symlink(src: &Path, dst: &Path) -> Result<()> {
    let link = std::fs::read_link(src)?;
    std::os::unix::fs::symlink(link, dst)?;
    Ok(())
}

#[cfg(not(unix))]
fn copy_symlink(src: &Path, dst: &Path) -> Result<()> {
    if src.is_file() {
        std::fs::copy(src, dst)?;
    }
    Ok(())
}
