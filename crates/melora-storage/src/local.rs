use crate::traits::{ByteStream, Storage, StorageError, StorageResult};
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use melora_core::{BackendKind, SignedAccessGrant, StorageLocation};
use std::io::SeekFrom;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tokio_util::io::ReaderStream;
use uuid::Uuid;

/// Local filesystem storage implementation
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    chunk_size: usize,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at `base_path`.
    ///
    /// `chunk_size` bounds every read chunk handed to streams; large files
    /// never require proportional memory.
    pub async fn new(base_path: impl Into<PathBuf>, chunk_size: usize) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            base_path,
            chunk_size,
        })
    }

    /// Convert a storage key to a filesystem path, rejecting anything that
    /// could escape the base directory.
    fn key_to_path(&self, key: &str) -> StorageResult<PathBuf> {
        let rel = Path::new(key);
        let escapes = rel.components().any(|c| {
            !matches!(c, Component::Normal(_) | Component::CurDir)
        });
        if key.is_empty() || escapes {
            return Err(StorageError::InvalidKey(format!(
                "key {:?} resolves outside the storage directory",
                key
            )));
        }
        Ok(self.base_path.join(rel))
    }

    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for LocalStorage {
    fn backend_kind(&self) -> BackendKind {
        BackendKind::Local
    }

    fn location(&self, key: &str) -> StorageLocation {
        StorageLocation::Local {
            relative_path: key.to_string(),
        }
    }

    fn local_path(&self, location: &StorageLocation) -> Option<PathBuf> {
        self.key_to_path(location.key()).ok()
    }

    async fn exists(&self, location: &StorageLocation) -> StorageResult<bool> {
        let path = self.key_to_path(location.key())?;
        Ok(fs::try_exists(&path).await.unwrap_or(false))
    }

    async fn content_length(&self, location: &StorageLocation) -> StorageResult<u64> {
        let path = self.key_to_path(location.key())?;
        match fs::metadata(&path).await {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(location.key().to_string()))
            }
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }

    async fn write(&self, location: &StorageLocation, data: Bytes) -> StorageResult<()> {
        let path = self.key_to_path(location.key())?;
        let size = data.len();

        self.ensure_parent_dir(&path).await?;

        // Write under a scratch name and rename into place so no reader ever
        // observes a partially written file at the final key.
        let scratch = path.with_extension(format!("part-{}", Uuid::new_v4()));
        let start = std::time::Instant::now();

        let result: StorageResult<()> = async {
            let mut file = fs::File::create(&scratch).await.map_err(|e| {
                StorageError::WriteFailed(format!(
                    "Failed to create file {}: {}",
                    scratch.display(),
                    e
                ))
            })?;
            file.write_all(&data).await.map_err(|e| {
                StorageError::WriteFailed(format!(
                    "Failed to write file {}: {}",
                    scratch.display(),
                    e
                ))
            })?;
            file.sync_all().await.map_err(|e| {
                StorageError::WriteFailed(format!("Failed to sync file {}: {}", scratch.display(), e))
            })?;
            fs::rename(&scratch, &path).await.map_err(|e| {
                StorageError::WriteFailed(format!(
                    "Failed to move file into place at {}: {}",
                    path.display(),
                    e
                ))
            })?;
            Ok(())
        }
        .await;

        if result.is_err() {
            let _ = fs::remove_file(&scratch).await;
            return result;
        }

        tracing::info!(
            path = %path.display(),
            key = %location.key(),
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage write successful"
        );

        Ok(())
    }

    async fn download_stream(&self, location: &StorageLocation) -> StorageResult<ByteStream> {
        let len = self.content_length(location).await?;
        self.read_range(location, 0, len).await
    }

    async fn read_range(
        &self,
        location: &StorageLocation,
        offset: u64,
        length: u64,
    ) -> StorageResult<ByteStream> {
        let path = self.key_to_path(location.key())?;

        let mut file = match fs::File::open(&path).await {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(location.key().to_string()));
            }
            Err(e) => {
                return Err(StorageError::ReadFailed(format!(
                    "Failed to open file {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        file.seek(SeekFrom::Start(offset)).await.map_err(|e| {
            StorageError::ReadFailed(format!("Failed to seek {}: {}", path.display(), e))
        })?;

        let key = location.key().to_string();
        let reader = ReaderStream::with_capacity(file.take(length), self.chunk_size);
        let stream = reader.map(move |result| {
            result.map_err(|e| {
                tracing::error!(key = %key, error = %e, "Local storage stream read error");
                StorageError::ReadFailed(format!("Failed to read chunk: {}", e))
            })
        });

        Ok(Box::pin(stream))
    }

    async fn delete(&self, location: &StorageLocation) -> StorageResult<()> {
        let path = self.key_to_path(location.key())?;

        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(key = %location.key(), "Local storage delete successful");
                Ok(())
            }
            // Idempotent: deleting an absent location is not an error.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::DeleteFailed(format!(
                "Failed to delete file {}: {}",
                path.display(),
                e
            ))),
        }
    }

    async fn rename(
        &self,
        from: &StorageLocation,
        to: &StorageLocation,
    ) -> StorageResult<()> {
        let from_path = self.key_to_path(from.key())?;
        let to_path = self.key_to_path(to.key())?;

        if !fs::try_exists(&from_path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(from.key().to_string()));
        }

        self.ensure_parent_dir(&to_path).await?;

        fs::rename(&from_path, &to_path).await.map_err(|e| {
            StorageError::BackendError(format!(
                "Failed to rename {} to {}: {}",
                from_path.display(),
                to_path.display(),
                e
            ))
        })?;

        tracing::info!(
            from_key = %from.key(),
            to_key = %to.key(),
            "Local storage rename successful"
        );

        Ok(())
    }

    async fn signed_url(
        &self,
        location: &StorageLocation,
        _ttl: Duration,
    ) -> StorageResult<SignedAccessGrant> {
        Err(StorageError::Unsupported(format!(
            "local backend cannot sign URLs (key {})",
            location.key()
        )))
    }
}
