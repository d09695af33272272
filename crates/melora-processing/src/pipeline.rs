//! Upload pipeline: stage → extract → resolve identities → commit → derive.
//!
//! A single synchronous call per upload with no partial results visible to
//! callers. The staged copy lives under the reserved `tmp/` namespace and is
//! deleted on every failure path before the error surfaces; the
//! `Storage::rename` into `songs/` is the commit point, after which the bytes
//! are durable. Failures after the commit point leave orphaned storage, which
//! is logged rather than raised.

use crate::extract;
use crate::thumbnail::ThumbnailDeriver;
use bytes::Bytes;
use futures::StreamExt;
use melora_core::catalog::{AlbumRef, ArtistRef, NewSong};
use melora_core::{AppError, AppResult, Catalog, CatalogError, CommittedMedia, StorageLocation};
use melora_storage::{keys, Storage};
use std::path::Path;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

const UNKNOWN_ARTIST: &str = "Unknown Artist";
const FALLBACK_MIME: &str = "application/octet-stream";

pub struct UploadPipeline {
    storage: Arc<dyn Storage>,
    catalog: Arc<dyn Catalog>,
    thumbnails: ThumbnailDeriver,
}

impl UploadPipeline {
    pub fn new(
        storage: Arc<dyn Storage>,
        catalog: Arc<dyn Catalog>,
        thumbnails: ThumbnailDeriver,
    ) -> Self {
        UploadPipeline {
            storage,
            catalog,
            thumbnails,
        }
    }

    /// Run the full upload pipeline for one file.
    ///
    /// The final storage key is derived from a fresh UUID, never from the
    /// user-supplied filename; the filename contributes only a sanitized
    /// extension and the fallback title.
    #[tracing::instrument(
        skip(self, data),
        fields(filename = %original_filename, owner_id = %owner_id, size_bytes = data.len())
    )]
    pub async fn upload_song(
        &self,
        data: Bytes,
        original_filename: &str,
        owner_id: Uuid,
    ) -> AppResult<CommittedMedia> {
        let extension = keys::sanitize_extension(original_filename);
        let size_bytes = data.len() as u64;

        // Step 1: stage. Failure here aborts with no side effects.
        let staged = self.storage.location(&keys::staging_key(&extension));
        self.storage.write(&staged, data).await?;

        match self
            .run_staged(&staged, &extension, size_bytes, original_filename, owner_id)
            .await
        {
            Ok(committed) => Ok(committed),
            Err(err) => {
                // The staged copy must not outlive this invocation.
                if let Err(cleanup) = self.storage.delete(&staged).await {
                    tracing::warn!(
                        staged = %staged,
                        error = %cleanup,
                        "Failed to clean up staged upload"
                    );
                }
                Err(err)
            }
        }
    }

    async fn run_staged(
        &self,
        staged: &StorageLocation,
        extension: &str,
        size_bytes: u64,
        original_filename: &str,
        owner_id: Uuid,
    ) -> AppResult<CommittedMedia> {
        // Steps 2-3: metadata extraction against a local path.
        let metadata = self.extract_from_staged(staged, extension).await?;

        let title = metadata
            .title
            .clone()
            .unwrap_or_else(|| filename_stem(original_filename));
        let artist_name = metadata
            .artist
            .clone()
            .unwrap_or_else(|| UNKNOWN_ARTIST.to_string());

        // Step 4: resolve owning identities; a lost creation race is
        // retried once before surfacing.
        let artist = self.find_or_create_artist(&artist_name, owner_id).await?;
        let album = match metadata.album.as_deref() {
            Some(album_title) => Some(
                self.find_or_create_album(&artist, album_title, owner_id)
                    .await?,
            ),
            None => None,
        };

        // Steps 5-6: fresh identifier, then the commit point.
        let id = Uuid::new_v4();
        let final_location = self.storage.location(&keys::song_key(id, extension));
        self.storage.rename(staged, &final_location).await?;

        // Step 7: best-effort thumbnail; never fails the upload.
        let thumbnail = self.thumbnails.derive(metadata.artwork.as_deref()).await;

        let mime_type = metadata
            .mime_type
            .clone()
            .unwrap_or_else(|| FALLBACK_MIME.to_string());

        // Step 8: persist the record. The file is already durable; a failure
        // here orphans it, which is logged rather than rolled back.
        let record = NewSong {
            id,
            title: title.clone(),
            location: final_location.clone(),
            size_bytes,
            mime_type: mime_type.clone(),
            duration_secs: metadata.duration_secs,
            thumbnail: thumbnail.clone(),
            artist_id: artist.id,
            album_id: album.as_ref().map(|a| a.id),
            owner_id,
        };
        if let Err(e) = self.catalog.create_song(record).await {
            tracing::warn!(
                location = %final_location,
                error = %e,
                "Catalog record creation failed after commit; storage object is orphaned"
            );
            return Err(e.into());
        }

        if let (Some(album), Some(thumb)) = (&album, &thumbnail) {
            if let Err(e) = self
                .catalog
                .set_album_cover_if_missing(album.id, thumb)
                .await
            {
                tracing::warn!(album_id = %album.id, error = %e, "Failed to backfill album cover");
            }
        }

        tracing::info!(
            song_id = %id,
            location = %final_location,
            size_bytes,
            duration_secs = metadata.duration_secs,
            has_thumbnail = thumbnail.is_some(),
            "Upload committed"
        );

        Ok(CommittedMedia {
            id,
            title,
            location: final_location,
            size_bytes,
            mime_type,
            duration_secs: metadata.duration_secs,
            thumbnail,
        })
    }

    /// Run the extractor against the staged bytes.
    ///
    /// On the local backend the staged file already has a path. Otherwise a
    /// scoped temporary local copy is materialized; the handle deletes it on
    /// drop, on every exit path.
    async fn extract_from_staged(
        &self,
        staged: &StorageLocation,
        extension: &str,
    ) -> AppResult<melora_core::ExtractedMetadata> {
        if let Some(path) = self.storage.local_path(staged) {
            return run_extract(path).await;
        }

        let tmp = tempfile::Builder::new()
            .prefix("melora-extract-")
            .suffix(extension)
            .tempfile()
            .map_err(|e| AppError::Internal(format!("failed to create temp file: {}", e)))?;

        let std_file = tmp
            .reopen()
            .map_err(|e| AppError::Internal(format!("failed to reopen temp file: {}", e)))?;
        let mut file = tokio::fs::File::from_std(std_file);

        let mut stream = self.storage.download_stream(staged).await?;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(AppError::from)?;
            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        // `tmp` stays alive until the parse finishes; the handle deletes the
        // file on drop.
        run_extract(tmp.path().to_path_buf()).await
    }

    async fn find_or_create_artist(&self, name: &str, owner_id: Uuid) -> AppResult<ArtistRef> {
        match self.catalog.find_or_create_artist(name, owner_id).await {
            Err(CatalogError::Conflict(_)) => {
                tracing::debug!(artist = %name, "Identity creation raced; retrying lookup once");
                self.catalog
                    .find_or_create_artist(name, owner_id)
                    .await
                    .map_err(Into::into)
            }
            other => other.map_err(Into::into),
        }
    }

    async fn find_or_create_album(
        &self,
        artist: &ArtistRef,
        title: &str,
        owner_id: Uuid,
    ) -> AppResult<AlbumRef> {
        match self.catalog.find_or_create_album(artist, title, owner_id).await {
            Err(CatalogError::Conflict(_)) => {
                tracing::debug!(album = %title, "Identity creation raced; retrying lookup once");
                self.catalog
                    .find_or_create_album(artist, title, owner_id)
                    .await
                    .map_err(Into::into)
            }
            other => other.map_err(Into::into),
        }
    }
}

/// Parse on a blocking thread; lofty does synchronous file I/O and a large
/// or adversarial container must not stall the request executor.
async fn run_extract(path: std::path::PathBuf) -> AppResult<melora_core::ExtractedMetadata> {
    let metadata = tokio::task::spawn_blocking(move || extract::extract(&path))
        .await
        .map_err(|e| AppError::Internal(format!("metadata extraction task failed: {}", e)))??;
    Ok(metadata)
}

/// Title fallback when the file carries no title tag: the filename without
/// its extension.
fn filename_stem(filename: &str) -> String {
    Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("Untitled")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_stem_strips_extension_and_directories() {
        assert_eq!(filename_stem("track.mp3"), "track");
        assert_eq!(filename_stem("a/b/track.flac"), "track");
        assert_eq!(filename_stem("noext"), "noext");
        assert_eq!(filename_stem(""), "Untitled");
    }
}
