use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info};

use super::AssetSource;

/// Cache name; bump it to start from an empty cache.
pub const CACHE_NAME: &str = "find-warranty-v1";

/// Assets installed into the cache.
pub const ASSETS: &[&str] = &["/", "/index.html", "/manifest.json", "/vite.svg"];

pub struct AssetCache {
    dir: PathBuf,
}

impl AssetCache {
    /// Open the cache named [`CACHE_NAME`] under `cache_root`.
    pub fn new(cache_root: &Path) -> Self {
        Self::named(cache_root, CACHE_NAME)
    }

    pub fn named(cache_root: &Path, name: &str) -> Self {
        Self {
            dir: cache_root.join(name),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File name for an asset path. `%` and `_` are escaped before `/`
    /// becomes `_`, so distinct paths never share a file.
    fn entry_name(path: &str) -> String {
        path.replace('%', "%25").replace('_', "%5F").replace('/', "_")
    }

    fn entry_path(&self, path: &str) -> PathBuf {
        self.dir.join(Self::entry_name(path))
    }

    /// Fetch every asset in [`ASSETS`] and store them. All or nothing: if
    /// any asset cannot be fetched or written, the cache is left as it was.
    pub async fn install(&self, source: &dyn AssetSource) -> Result<usize> {
        let mut fetched = Vec::with_capacity(ASSETS.len());
        for path in ASSETS {
            let bytes = source.fetch(path).await?;
            debug!(asset = path, size = bytes.len(), "Fetched asset");
            fetched.push((*path, bytes));
        }

        let mut staging = self.dir.clone().into_os_string();
        staging.push(".installing");
        let staging = PathBuf::from(staging);
        if staging.exists() {
            std::fs::remove_dir_all(&staging)
                .with_context(|| format!("Failed to remove {}", staging.display()))?;
        }
        std::fs::create_dir_all(&staging)
            .with_context(|| format!("Failed to create {}", staging.display()))?;
        for (path, bytes) in &fetched {
            let entry = staging.join(Self::entry_name(path));
            if let Err(e) = std::fs::write(&entry, bytes) {
                let _ = std::fs::remove_dir_all(&staging);
                return Err(e)
                    .with_context(|| format!("Failed to write cache entry {}", entry.display()));
            }
        }

        if self.dir.exists() {
            std::fs::remove_dir_all(&self.dir)
                .with_context(|| format!("Failed to replace {}", self.dir.display()))?;
        }
        std::fs::rename(&staging, &self.dir)
            .with_context(|| format!("Failed to move cache into {}", self.dir.display()))?;

        info!(cache = %self.dir.display(), count = fetched.len(), "Asset cache installed");
        Ok(fetched.len())
    }

    pub fn put(&self, path: &str, bytes: &[u8]) -> Result<()> {
        let entry = self.entry_path(path);
        std::fs::write(&entry, bytes)
            .with_context(|| format!("Failed to write cache entry {}", entry.display()))
    }

    pub fn get(&self, path: &str) -> Result<Option<Vec<u8>>> {
        let entry = self.entry_path(path);
        if !entry.exists() {
            return Ok(None);
        }
        let bytes = std::fs::read(&entry)
            .with_context(|| format!("Failed to read cache entry {}", entry.display()))?;
        Ok(Some(bytes))
    }

    /// Serve `path` from the cache when present, otherwise from `source`.
    /// Network responses are not added to the cache.
    pub async fn respond(&self, path: &str, source: &dyn AssetSource) -> Result<Vec<u8>> {
        if let Some(bytes) = self.get(path)? {
            debug!(asset = path, "Serving asset from cache");
            return Ok(bytes);
        }
        debug!(asset = path, "Asset not cached, fetching");
        source.fetch(path).await
    }
}
