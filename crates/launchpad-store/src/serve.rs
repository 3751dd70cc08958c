//! Static file resolution with SPA fallback

use launchpad_core::{sanitize_relative_path, validate_app_id, Error, Result};
use std::path::PathBuf;

/// Maps `(app_id, path)` to a file inside the app's published tree.
///
/// A path that does not name an existing file falls back to the root
/// document so client-side routers can handle it.
#[derive(Debug, Clone)]
pub struct StaticResolver {
    static_dir: PathBuf,
    root_document: String,
}

impl StaticResolver {
    pub fn new(static_dir: impl Into<PathBuf>, root_document: impl Into<String>) -> Self {
        Self {
            static_dir: static_dir.into(),
            root_document: root_document.into(),
        }
    }

    pub fn root_document(&self) -> &str {
        &self.root_document
    }

    pub fn resolve(&self, app_id: &str, path: Option<&str>) -> Result<PathBuf> {
        if !validate_app_id(app_id) {
            return Err(Error::AppNotFound(app_id.to_string()));
        }

        let app_dir = self.static_dir.join(app_id);
        if !app_dir.is_dir() {
            return Err(Error::AppNotFound(app_id.to_string()));
        }

        let root = app_dir.join(&self.root_document);
        let requested = path
            .map(|p| p.trim().trim_start_matches('/'))
            .filter(|p| !p.is_empty());

        let Some(requested) = requested else {
            return if root.is_file() {
                Ok(root)
            } else {
                Err(Error::FileNotFound(self.root_document.clone()))
            };
        };

        // Paths escaping the app root never resolve
        let rel = sanitize_relative_path(requested)
            .ok_or_else(|| Error::FileNotFound(requested.to_string()))?;

        let candidate = app_dir.join(rel);
        if candidate.is_file() {
            Ok(candidate)
        } else if root.is_file() {
            Ok(root)
        } else {
            Err(Error::FileNotFound(requested.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{tempdir, TempDir};

    fn published(files: &[(&str, &str)]) -> (StaticResolver, TempDir) {
        let dir = tempdir().unwrap();
        let app = dir.path().join("x1");
        std::fs::create_dir_all(&app).unwrap();
        for (path, content) in files {
            let full = app.join(path);
            std::fs::create_dir_all(full.parent().unwrap()).unwrap();
            std::fs::write(full, content).unwrap();
        }
        (StaticResolver::new(dir.path(), "index.html"), dir)
    }

    #[test]
    fn test_resolve_root() {
        let (resolver, dir) = published(&[("index.html", "<h1>Hi</h1>")]);
        let expected = dir.path().join("x1/index.html");

        assert_eq!(resolver.resolve("x1", None).unwrap(), expected);
        assert_eq!(resolver.resolve("x1", Some("")).unwrap(), expected);
        assert_eq!(resolver.resolve("x1", Some("/")).unwrap(), expected);
    }

    #[test]
    fn test_resolve_existing_file() {
        let (resolver, dir) = published(&[("index.html", "root"), ("static/js/main.js", "js")]);
        assert_eq!(
            resolver.resolve("x1", Some("static/js/main.js")).unwrap(),
            dir.path().join("x1/static/js/main.js")
        );
        assert_eq!(
            resolver.resolve("x1", Some("/static/js/main.js")).unwrap(),
            dir.path().join("x1/static/js/main.js")
        );
    }

    #[test]
    fn test_spa_fallback() {
        let (resolver, dir) = published(&[("index.html", "root")]);
        assert_eq!(
            resolver.resolve("x1", Some("dashboard/settings")).unwrap(),
            dir.path().join("x1/index.html")
        );
    }

    #[test]
    fn test_directory_falls_back_to_root() {
        let (resolver, dir) = published(&[("index.html", "root"), ("assets/logo.svg", "svg")]);
        assert_eq!(
            resolver.resolve("x1", Some("assets")).unwrap(),
            dir.path().join("x1/index.html")
        );
    }

    #[test]
    fn test_missing_file_without_root_document() {
        let (resolver, _dir) = published(&[("about.html", "about")]);
        assert!(matches!(
            resolver.resolve("x1", Some("nope.css")),
            Err(Error::FileNotFound(_))
        ));
        assert!(matches!(
            resolver.resolve("x1", None),
            Err(Error::FileNotFound(_))
        ));
    }

    #[test]
    fn test_unknown_app() {
        let (resolver, _dir) = published(&[("index.html", "root")]);
        assert!(matches!(
            resolver.resolve("ghost", None),
            Err(Error::AppNotFound(_))
        ));
        assert!(matches!(
            resolver.resolve("..", None),
            Err(Error::AppNotFound(_))
        ));
    }

    #[test]
    fn test_traversal_does_not_escape() {
        let (resolver, dir) = published(&[("index.html", "root")]);
        std::fs::write(dir.path().join("secret.txt"), "secret").unwrap();

        assert!(matches!(
            resolver.resolve("x1", Some("../secret.txt")),
            Err(Error::FileNotFound(_))
        ));
    }
}
