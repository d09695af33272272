//! Storage reclamation for deleted catalog records.
//!
//! The catalog layer invokes this handler as an explicit post-commit
//! callback after a delete transaction commits; ordering and failure handling
//! stay visible instead of hiding behind an implicit framework event.

use melora_core::catalog::DeletedSong;
use melora_core::StorageLocation;
use melora_storage::{Storage, StorageResult};
use std::sync::Arc;

pub struct RetentionHandler {
    storage: Arc<dyn Storage>,
}

impl RetentionHandler {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        RetentionHandler { storage }
    }

    /// Reclaim everything a deleted song record owned: the primary file, its
    /// thumbnail, and the album cover when the orphan cascade removed the
    /// album. Individual failures are logged and do not stop the rest; the
    /// leftover bytes are orphaned storage, which reconciliation owns.
    pub async fn on_song_deleted(&self, deleted: &DeletedSong) {
        for location in [&deleted.file, &deleted.thumbnail, &deleted.album_cover]
            .into_iter()
            .flatten()
        {
            if let Err(e) = self.reclaim(location).await {
                tracing::warn!(
                    location = %location,
                    error = %e,
                    "Failed to reclaim storage for deleted record"
                );
            }
        }
    }

    /// Idempotent delete of one storage location; reclaiming an already
    /// absent location succeeds.
    pub async fn reclaim(&self, location: &StorageLocation) -> StorageResult<()> {
        self.storage.delete(location).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use melora_storage::LocalStorage;

    #[tokio::test]
    async fn on_song_deleted_reclaims_all_locations() {
        let dir = tempfile::tempdir().unwrap();
        let storage: Arc<dyn Storage> =
            Arc::new(LocalStorage::new(dir.path(), 4096).await.unwrap());

        let file = storage.location("songs/a.mp3");
        let thumb = storage.location("thumbnails/a.jpg");
        storage.write(&file, Bytes::from_static(b"song")).await.unwrap();
        storage.write(&thumb, Bytes::from_static(b"jpg")).await.unwrap();

        let handler = RetentionHandler::new(Arc::clone(&storage));
        handler
            .on_song_deleted(&DeletedSong {
                file: Some(file.clone()),
                thumbnail: Some(thumb.clone()),
                album_cover: None,
            })
            .await;

        assert!(!storage.exists(&file).await.unwrap());
        assert!(!storage.exists(&thumb).await.unwrap());
    }

    #[tokio::test]
    async fn reclaim_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let storage: Arc<dyn Storage> =
            Arc::new(LocalStorage::new(dir.path(), 4096).await.unwrap());
        let handler = RetentionHandler::new(Arc::clone(&storage));

        let location = storage.location("songs/ghost.mp3");
        handler.reclaim(&location).await.unwrap();
        handler.reclaim(&location).await.unwrap();
    }
}
