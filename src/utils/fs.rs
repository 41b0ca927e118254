//! Filesystem access used by the pipeline: photo reads and audit writes.

use async_trait::async_trait;
use std::path::Path;
use tokio::fs;

#[async_trait]
pub trait FileStore: Send + Sync {
    async fn exists(&self, path: &Path) -> bool;

    async fn read(&self, path: &Path) -> std::io::Result<Vec<u8>>;

    /// Write `data`, creating parent directories as needed.
    async fn write(&self, path: &Path, data: &[u8]) -> std::io::Result<()>;

    /// Delete `path`; a file that is already gone is not an error.
    async fn remove(&self, path: &Path) -> std::io::Result<()>;
}

/// [`FileStore`] backed by the local disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileStore;

#[async_trait]
impl FileStore for LocalFileStore {
    async fn exists(&self, path: &Path) -> bool {
        fs::try_exists(path).await.unwrap_or(false)
    }

    async fn read(&self, path: &Path) -> std::io::Result<Vec<u8>> {
        fs::read(path).await
    }

    async fn write(&self, path: &Path, data: &[u8]) -> std::io::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        fs::write(path, data).await
    }

    async fn remove(&self, path: &Path) -> std::io::Result<()> {
        match fs::remove_file(path).await {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}
