//! Publication Store - per-app publicly servable trees

use launchpad_core::{validate_app_id, Error, Result};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::tree::{copy_tree, remove_dir_if_exists};

/// Owns `static/{app_id}` for every deployed app
#[derive(Debug, Clone)]
pub struct PublicationStore {
    static_dir: PathBuf,
}

impl PublicationStore {
    pub fn new(static_dir: impl Into<PathBuf>) -> Self {
        Self {
            static_dir: static_dir.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.static_dir
    }

    /// Published directory for an app
    pub fn published_dir(&self, app_id: &str) -> PathBuf {
        self.static_dir.join(app_id)
    }

    pub fn is_published(&self, app_id: &str) -> bool {
        self.published_dir(app_id).is_dir()
    }

    /// Replace the app's published tree with a full copy of `source`.
    ///
    /// The copy is staged next to the live tree and swapped in by rename,
    /// so readers see either the old tree or the new one for all but the
    /// instant between the two renames.
    pub fn publish(&self, app_id: &str, source: &Path) -> Result<PathBuf> {
        if !validate_app_id(app_id) {
            return Err(Error::validation(format!("Invalid app_id: {}", app_id)));
        }

        std::fs::create_dir_all(&self.static_dir)?;
        let token = uuid::Uuid::new_v4().simple().to_string();
        let staging = self.static_dir.join(format!(".{}.staging-{}", app_id, token));
        let retired = self.static_dir.join(format!(".{}.retired-{}", app_id, token));

        if let Err(e) = copy_tree(source, &staging) {
            let _ = remove_dir_if_exists(&staging);
            return Err(e);
        }

        let target = self.published_dir(app_id);
        let had_previous = match std::fs::rename(&target, &retired) {
            Ok(()) => true,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => {
                let _ = remove_dir_if_exists(&staging);
                return Err(Error::Io(e));
            }
        };

        if let Err(e) = std::fs::rename(&staging, &target) {
            if had_previous {
                let _ = std::fs::rename(&retired, &target);
            }
            let _ = remove_dir_if_exists(&staging);
            return Err(Error::Io(e));
        }

        if had_previous {
            if let Err(e) = remove_dir_if_exists(&retired) {
                warn!("Failed to remove retired tree {}: {}", retired.display(), e);
            }
        }

        info!("Published {} from {}", app_id, source.display());
        Ok(target)
    }

    /// Remove the app's published tree. Returns whether anything was removed.
    pub fn remove(&self, app_id: &str) -> Result<bool> {
        remove_dir_if_exists(&self.published_dir(app_id))
    }
}
