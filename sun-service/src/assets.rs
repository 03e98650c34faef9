use common::errors::AppError;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

/// Static files of the installable app, snapshotted per build version
pub const APP_ASSETS: &[&str] = &[
    "./",
    "./index.html",
    "./style.css",
    "./main.js",
    "./manifest.json",
    "./icons/sun-192.png",
    "./icons/sun-512.png",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Served {
    Snapshot,
    Origin,
}

#[derive(Debug, Clone)]
pub struct Asset {
    pub body: Vec<u8>,
    pub content_type: &'static str,
    pub served: Served,
}

/// Versioned snapshots of the app shell, falling back to the asset
/// directory for anything not snapshotted.
pub struct OfflineAssetStore {
    root: PathBuf,
    current_version: String,
    snapshots: RwLock<HashMap<String, HashMap<String, Vec<u8>>>>,
}

impl OfflineAssetStore {
    pub fn new(root: PathBuf, current_version: String) -> Self {
        Self {
            root,
            current_version,
            snapshots: RwLock::new(HashMap::new()),
        }
    }

    pub fn current_version(&self) -> &str {
        &self.current_version
    }

    pub async fn install(&self) -> Result<usize, AppError> {
        self.install_version(&self.current_version).await
    }

    /// Snapshots every app asset under `version`. Nothing is stored unless
    /// all assets could be read.
    #[instrument(skip(self))]
    pub async fn install_version(&self, version: &str) -> Result<usize, AppError> {
        let mut snapshot = HashMap::with_capacity(APP_ASSETS.len());
        for asset in APP_ASSETS {
            let key = normalize(asset)?;
            let body = self.read_origin(&key).await?;
            snapshot.insert(key, body);
        }

        let count = snapshot.len();
        self.snapshots
            .write()
            .await
            .insert(version.to_string(), snapshot);
        info!(version = %version, count, "Asset snapshot installed");
        Ok(count)
    }

    /// Drops every snapshot that does not belong to the current version.
    pub async fn activate(&self) -> Vec<String> {
        let mut snapshots = self.snapshots.write().await;
        let mut removed: Vec<String> = snapshots
            .keys()
            .filter(|version| **version != self.current_version)
            .cloned()
            .collect();
        removed.sort();

        for version in &removed {
            snapshots.remove(version);
            info!(version = %version, "Deleted stale asset snapshot");
        }
        removed
    }

    pub async fn versions(&self) -> Vec<String> {
        let mut versions: Vec<String> = self.snapshots.read().await.keys().cloned().collect();
        versions.sort();
        versions
    }

    pub async fn fetch(&self, path: &str) -> Result<Asset, AppError> {
        let key = normalize(path)?;
        let content_type = content_type(&key);

        let cached = self
            .snapshots
            .read()
            .await
            .get(&self.current_version)
            .and_then(|snapshot| snapshot.get(&key).cloned());

        if let Some(body) = cached {
            debug!(path = %key, "Serving asset from snapshot");
            return Ok(Asset {
                body,
                content_type,
                served: Served::Snapshot,
            });
        }

        let body = self.read_origin(&key).await?;
        Ok(Asset {
            body,
            content_type,
            served: Served::Origin,
        })
    }

    async fn read_origin(&self, key: &str) -> Result<Vec<u8>, AppError> {
        tokio::fs::read(self.root.join(key))
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => AppError::http(404, format!("Asset not found: {}", key)),
                _ => AppError::internal(format!("Failed to read asset {}: {}", key, e)),
            })
    }
}

/// Maps `./`, `/` and `./x` style request paths to a relative file path.
fn normalize(path: &str) -> Result<String, AppError> {
    let trimmed = path.trim_start_matches("./").trim_start_matches('/');
    let trimmed = if trimmed.is_empty() || trimmed == "." {
        "index.html"
    } else {
        trimmed
    };

    let escapes = Path::new(trimmed)
        .components()
        .any(|c| !matches!(c, Component::Normal(_)));
    if escapes {
        return Err(AppError::validation(format!("Invalid asset path: {}", path)));
    }
    Ok(trimmed.to_string())
}

fn content_type(path: &str) -> &'static str {
    match Path::new(path).extension().and_then(|e| e.to_str()) {
        Some("html") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js") => "text/javascript; charset=utf-8",
        Some("json") => "application/manifest+json",
        Some("png") => "image/png",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}
