mod local;
mod s3;

pub use local::LocalStore;
pub use s3::S3Store;

use async_trait::async_trait;
use bytes::Bytes;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ObjectStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Object not found: {0}")]
    NotFound(String),
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Abstraction over object storage backends.
///
/// Each backend is bound to one bucket (or directory) at construction, so
/// callers address objects by key alone. Overwrites are whole-object: a
/// reader sees either the previous bytes or the new ones, never a mix, as far
/// as the backend guarantees it.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Bytes, ObjectStoreError>;
    async fn put(&self, key: &str, data: Bytes) -> Result<(), ObjectStoreError>;
    /// Copy the object's bytes to a local file, replacing it atomically.
    /// Nothing is written locally, and no directory is created, when the
    /// object cannot be fetched.
    async fn copy_to_local(&self, key: &str, path: &Path) -> Result<(), ObjectStoreError>;
}

/// Write `data` to a local file through a uniquely named staging file in the
/// same directory, so concurrent writers and readers of `path` only ever see
/// a complete file. Missing parent directories are created.
pub(crate) async fn write_local_file(path: &Path, data: &[u8]) -> Result<(), ObjectStoreError> {
    let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
    if let Some(parent) = parent {
        tokio::fs::create_dir_all(parent).await?;
    }

    let file_name = path
        .file_name()
        .ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("not a file path: {}", path.display()),
            )
        })?
        .to_string_lossy();
    let staging_name = format!(".{file_name}.{}.tmp", uuid::Uuid::new_v4().simple());
    let staging = match parent {
        Some(parent) => parent.join(staging_name),
        None => std::path::PathBuf::from(staging_name),
    };

    if let Err(e) = tokio::fs::write(&staging, data).await {
        let _ = tokio::fs::remove_file(&staging).await;
        return Err(e.into());
    }
    if let Err(e) = tokio::fs::rename(&staging, path).await {
        let _ = tokio::fs::remove_file(&staging).await;
        return Err(e.into());
    }
    Ok(())
}
