//! Bundled asset collaborator for same-origin requests.

use crate::error::AppResult;
use crate::router::content_type;
use async_trait::async_trait;
use log::{debug, warn};
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    /// Type reported by the asset source, if it reports one
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AssetSource: Send + Sync {
    /// `path` is the URL path under the synthetic origin, e.g. `/index.html`.
    async fn resolve(&self, path: &str) -> AppResult<Option<Asset>>;
}

/// Serves files below a root directory, `/` mapping to the root itself.
/// The reported type is guessed from the resolved file name.
pub struct DirectoryAssets {
    root: PathBuf,
    index_file: String,
}

impl DirectoryAssets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            index_file: "index.html".to_string(),
        }
    }

    /// `None` for paths that would escape the root.
    fn local_path(&self, path: &str) -> Option<PathBuf> {
        let relative = Path::new(path.trim_start_matches('/'));
        let mut resolved = self.root.clone();
        for component in relative.components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                _ => return None,
            }
        }
        if path.is_empty() || path.ends_with('/') {
            resolved.push(&self.index_file);
        }
        Some(resolved)
    }
}

#[async_trait]
impl AssetSource for DirectoryAssets {
    async fn resolve(&self, path: &str) -> AppResult<Option<Asset>> {
        let Some(local) = self.local_path(path) else {
            warn!("[Router] Rejected asset path outside root: {}", path);
            return Ok(None);
        };

        match tokio::fs::read(&local).await {
            Ok(body) => {
                debug!("[Router] Serving asset {:?}", local);
                Ok(Some(Asset {
                    content_type: content_type::sniff(&local.to_string_lossy()),
                    body,
                }))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn asset_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("index.html"), "<html></html>").unwrap();
        std::fs::create_dir(dir.path().join("js")).unwrap();
        std::fs::write(dir.path().join("js").join("app.js"), "export {}").unwrap();
        dir
    }

    #[tokio::test]
    async fn test_resolves_nested_file() {
        let dir = asset_dir();
        let assets = DirectoryAssets::new(dir.path());
        let asset = assets.resolve("/js/app.js").await.unwrap().unwrap();
        assert_eq!(asset.body, b"export {}");
    }

    #[tokio::test]
    async fn test_root_serves_index() {
        let dir = asset_dir();
        let assets = DirectoryAssets::new(dir.path());
        let asset = assets.resolve("/").await.unwrap().unwrap();
        assert_eq!(asset.body, b"<html></html>");
        assert_eq!(asset.content_type.as_deref(), Some("text/html"));
    }

    #[tokio::test]
    async fn test_missing_file_is_none() {
        let dir = asset_dir();
        let assets = DirectoryAssets::new(dir.path());
        assert!(assets.resolve("/missing.css").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rejects_traversal() {
        let dir = asset_dir();
        let assets = DirectoryAssets::new(dir.path().join("js"));
        assert!(assets.resolve("/../index.html").await.unwrap().is_none());
    }
}
