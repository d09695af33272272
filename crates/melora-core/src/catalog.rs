//! Catalog collaborator traits
//!
//! The structured catalog (songs, albums, artists) is an external collaborator
//! of the media core; this module specifies the interface the upload pipeline
//! and the retention layer depend on, without coupling to any particular
//! database. `MemoryCatalog` is the in-process implementation used by tests
//! and standalone runs.
//!
//! Artist and album resolution is find-or-create by **case-insensitive** name,
//! scoped to the uploading user. Two concurrent uploads racing to create the
//! same identity must end up with one row; the loser sees
//! `CatalogError::Conflict`, which callers treat as retryable.

use crate::config::OrphanPolicy;
use crate::models::StorageLocation;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Concurrent identity creation race; safe to retry the lookup.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("catalog backend error: {0}")]
    Backend(String),
}

#[derive(Debug, Clone)]
pub struct ArtistRef {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct AlbumRef {
    pub id: Uuid,
    pub title: String,
    pub artist_id: Uuid,
}

/// Everything the catalog needs to persist a committed upload.
#[derive(Debug, Clone)]
pub struct NewSong {
    pub id: Uuid,
    pub title: String,
    pub location: StorageLocation,
    pub size_bytes: u64,
    pub mime_type: String,
    pub duration_secs: u64,
    pub thumbnail: Option<StorageLocation>,
    pub artist_id: Uuid,
    pub album_id: Option<Uuid>,
    pub owner_id: Uuid,
}

/// Resolution of a song id to the data the streaming layer needs.
#[derive(Debug, Clone)]
pub struct SongSource {
    pub location: StorageLocation,
    pub mime_type: String,
}

/// Storage locations freed up by deleting a song, for the retention layer to
/// reclaim. `album_cover` is set when the orphan cascade removed an album
/// that owned a cover image.
#[derive(Debug, Clone, Default)]
pub struct DeletedSong {
    pub file: Option<StorageLocation>,
    pub thumbnail: Option<StorageLocation>,
    pub album_cover: Option<StorageLocation>,
}

#[async_trait]
pub trait Catalog: Send + Sync {
    /// Find an artist by case-insensitive name for this owner, creating it
    /// with the given name if absent.
    async fn find_or_create_artist(
        &self,
        name: &str,
        owner_id: Uuid,
    ) -> Result<ArtistRef, CatalogError>;

    /// Find an album by case-insensitive title under this artist and owner,
    /// creating it if absent.
    async fn find_or_create_album(
        &self,
        artist: &ArtistRef,
        title: &str,
        owner_id: Uuid,
    ) -> Result<AlbumRef, CatalogError>;

    /// Persist the song record inside one transaction boundary.
    async fn create_song(&self, song: NewSong) -> Result<Uuid, CatalogError>;

    /// Backfill the album cover from a song thumbnail when the album has none.
    async fn set_album_cover_if_missing(
        &self,
        album_id: Uuid,
        cover: &StorageLocation,
    ) -> Result<(), CatalogError>;

    /// Resolve a song id to its storage location and MIME type.
    async fn song_source(&self, song_id: Uuid) -> Result<Option<SongSource>, CatalogError>;

    /// Delete a song record, cascading orphaned artists/albums per policy.
    /// Returns the storage locations the retention layer must reclaim, or
    /// `None` when the song did not exist.
    async fn delete_song(&self, song_id: Uuid) -> Result<Option<DeletedSong>, CatalogError>;
}

// ----- In-memory implementation -----

#[derive(Debug, Clone)]
struct SongRow {
    location: StorageLocation,
    mime_type: String,
    thumbnail: Option<StorageLocation>,
    artist_id: Uuid,
    album_id: Option<Uuid>,
}

#[derive(Debug, Clone)]
struct AlbumRow {
    id: Uuid,
    title: String,
    artist_id: Uuid,
    owner_id: Uuid,
    cover: Option<StorageLocation>,
}

#[derive(Debug, Clone)]
struct ArtistRow {
    id: Uuid,
    name: String,
    owner_id: Uuid,
}

#[derive(Default)]
struct CatalogState {
    artists: Vec<ArtistRow>,
    albums: Vec<AlbumRow>,
    songs: HashMap<Uuid, SongRow>,
}

/// In-memory catalog. Identity creation is serialized through one lock, which
/// is the dedup strategy a database would get from a uniqueness constraint.
pub struct MemoryCatalog {
    state: Mutex<CatalogState>,
    orphan_policy: OrphanPolicy,
}

impl MemoryCatalog {
    pub fn new(orphan_policy: OrphanPolicy) -> Self {
        MemoryCatalog {
            state: Mutex::new(CatalogState::default()),
            orphan_policy,
        }
    }
}

impl Default for MemoryCatalog {
    fn default() -> Self {
        Self::new(OrphanPolicy::Cascade)
    }
}

#[async_trait]
impl Catalog for MemoryCatalog {
    async fn find_or_create_artist(
        &self,
        name: &str,
        owner_id: Uuid,
    ) -> Result<ArtistRef, CatalogError> {
        let mut state = self.state.lock().await;
        let needle = name.to_lowercase();
        if let Some(row) = state
            .artists
            .iter()
            .find(|a| a.owner_id == owner_id && a.name.to_lowercase() == needle)
        {
            return Ok(ArtistRef {
                id: row.id,
                name: row.name.clone(),
            });
        }

        let row = ArtistRow {
            id: Uuid::new_v4(),
            name: name.to_string(),
            owner_id,
        };
        let artist = ArtistRef {
            id: row.id,
            name: row.name.clone(),
        };
        state.artists.push(row);
        Ok(artist)
    }

    async fn find_or_create_album(
        &self,
        artist: &ArtistRef,
        title: &str,
        owner_id: Uuid,
    ) -> Result<AlbumRef, CatalogError> {
        let mut state = self.state.lock().await;
        let needle = title.to_lowercase();
        if let Some(row) = state.albums.iter().find(|a| {
            a.artist_id == artist.id && a.owner_id == owner_id && a.title.to_lowercase() == needle
        }) {
            return Ok(AlbumRef {
                id: row.id,
                title: row.title.clone(),
                artist_id: row.artist_id,
            });
        }

        let row = AlbumRow {
            id: Uuid::new_v4(),
            title: title.to_string(),
            artist_id: artist.id,
            owner_id,
            cover: None,
        };
        let album = AlbumRef {
            id: row.id,
            title: row.title.clone(),
            artist_id: row.artist_id,
        };
        state.albums.push(row);
        Ok(album)
    }

    async fn create_song(&self, song: NewSong) -> Result<Uuid, CatalogError> {
        let mut state = self.state.lock().await;
        state.songs.insert(
            song.id,
            SongRow {
                location: song.location,
                mime_type: song.mime_type,
                thumbnail: song.thumbnail,
                artist_id: song.artist_id,
                album_id: song.album_id,
            },
        );
        Ok(song.id)
    }

    async fn set_album_cover_if_missing(
        &self,
        album_id: Uuid,
        cover: &StorageLocation,
    ) -> Result<(), CatalogError> {
        let mut state = self.state.lock().await;
        if let Some(album) = state.albums.iter_mut().find(|a| a.id == album_id) {
            if album.cover.is_none() {
                album.cover = Some(cover.clone());
            }
        }
        Ok(())
    }

    async fn song_source(&self, song_id: Uuid) -> Result<Option<SongSource>, CatalogError> {
        let state = self.state.lock().await;
        Ok(state.songs.get(&song_id).map(|row| SongSource {
            location: row.location.clone(),
            mime_type: row.mime_type.clone(),
        }))
    }

    async fn delete_song(&self, song_id: Uuid) -> Result<Option<DeletedSong>, CatalogError> {
        let mut state = self.state.lock().await;
        let Some(row) = state.songs.remove(&song_id) else {
            return Ok(None);
        };

        let mut deleted = DeletedSong {
            file: Some(row.location.clone()),
            thumbnail: row.thumbnail.clone(),
            album_cover: None,
        };

        if self.orphan_policy == OrphanPolicy::Cascade {
            if let Some(album_id) = row.album_id {
                let album_in_use = state.songs.values().any(|s| s.album_id == Some(album_id));
                if !album_in_use {
                    if let Some(pos) = state.albums.iter().position(|a| a.id == album_id) {
                        let album = state.albums.remove(pos);
                        deleted.album_cover = album.cover;
                    }
                }
            }
            let artist_in_use = state.songs.values().any(|s| s.artist_id == row.artist_id);
            if !artist_in_use {
                state.artists.retain(|a| a.id != row.artist_id);
            }
        }

        Ok(Some(deleted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn local(path: &str) -> StorageLocation {
        StorageLocation::Local {
            relative_path: path.to_string(),
        }
    }

    #[tokio::test]
    async fn find_or_create_artist_is_case_insensitive_per_owner() {
        let catalog = MemoryCatalog::default();
        let owner = Uuid::new_v4();
        let other = Uuid::new_v4();

        let a = catalog.find_or_create_artist("Daft Punk", owner).await.unwrap();
        let b = catalog.find_or_create_artist("daft punk", owner).await.unwrap();
        let c = catalog.find_or_create_artist("Daft Punk", other).await.unwrap();

        assert_eq!(a.id, b.id);
        assert_ne!(a.id, c.id);
        assert_eq!(b.name, "Daft Punk");
    }

    #[tokio::test]
    async fn concurrent_find_or_create_produces_one_artist() {
        let catalog = Arc::new(MemoryCatalog::default());
        let owner = Uuid::new_v4();

        let c1 = Arc::clone(&catalog);
        let c2 = Arc::clone(&catalog);
        let (a, b) = tokio::join!(
            tokio::spawn(async move { c1.find_or_create_artist("New Artist", owner).await }),
            tokio::spawn(async move { c2.find_or_create_artist("new artist", owner).await }),
        );

        let a = a.unwrap().unwrap();
        let b = b.unwrap().unwrap();
        assert_eq!(a.id, b.id);
    }

    #[tokio::test]
    async fn delete_song_cascades_orphans() {
        let catalog = MemoryCatalog::new(OrphanPolicy::Cascade);
        let owner = Uuid::new_v4();
        let artist = catalog.find_or_create_artist("Solo", owner).await.unwrap();
        let album = catalog
            .find_or_create_album(&artist, "Only Album", owner)
            .await
            .unwrap();
        let song_id = Uuid::new_v4();
        catalog
            .create_song(NewSong {
                id: song_id,
                title: "Track".into(),
                location: local("songs/a.mp3"),
                size_bytes: 10,
                mime_type: "audio/mpeg".into(),
                duration_secs: 1,
                thumbnail: Some(local("thumbnails/a.jpg")),
                artist_id: artist.id,
                album_id: Some(album.id),
                owner_id: owner,
            })
            .await
            .unwrap();
        catalog
            .set_album_cover_if_missing(album.id, &local("thumbnails/a.jpg"))
            .await
            .unwrap();

        let deleted = catalog.delete_song(song_id).await.unwrap().unwrap();
        assert_eq!(deleted.file, Some(local("songs/a.mp3")));
        assert_eq!(deleted.thumbnail, Some(local("thumbnails/a.jpg")));
        assert_eq!(deleted.album_cover, Some(local("thumbnails/a.jpg")));

        // Artist and album rows are gone; a new lookup recreates them.
        let again = catalog.find_or_create_artist("Solo", owner).await.unwrap();
        assert_ne!(again.id, artist.id);
    }

    #[tokio::test]
    async fn delete_song_retains_orphans_when_configured() {
        let catalog = MemoryCatalog::new(OrphanPolicy::Retain);
        let owner = Uuid::new_v4();
        let artist = catalog.find_or_create_artist("Keeper", owner).await.unwrap();
        let song_id = Uuid::new_v4();
        catalog
            .create_song(NewSong {
                id: song_id,
                title: "Track".into(),
                location: local("songs/b.mp3"),
                size_bytes: 10,
                mime_type: "audio/mpeg".into(),
                duration_secs: 1,
                thumbnail: None,
                artist_id: artist.id,
                album_id: None,
                owner_id: owner,
            })
            .await
            .unwrap();

        catalog.delete_song(song_id).await.unwrap().unwrap();

        let again = catalog.find_or_create_artist("Keeper", owner).await.unwrap();
        assert_eq!(again.id, artist.id);
    }

    #[tokio::test]
    async fn delete_missing_song_is_none() {
        let catalog = MemoryCatalog::default();
        assert!(catalog.delete_song(Uuid::new_v4()).await.unwrap().is_none());
    }
}
