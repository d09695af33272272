//! Test helpers: build the router over local storage and an in-memory
//! catalog, plus audio fixtures.
//!
//! Not every test binary uses every helper.
#![allow(dead_code)]

use axum_test::TestServer;
use melora_api::{build_router, AppState};
use melora_core::catalog::{Catalog, NewSong};
use melora_core::{Config, MemoryCatalog, StorageLocation};
use melora_storage::{LocalStorage, Storage};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use uuid::Uuid;

pub struct TestApp {
    pub server: TestServer,
    pub storage: Arc<dyn Storage>,
    pub catalog: Arc<MemoryCatalog>,
    pub base: PathBuf,
    _dir: TempDir,
}

pub async fn setup_test_app() -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().to_path_buf();
    let config = Config::for_local_testing(base.to_string_lossy());

    let storage: Arc<dyn Storage> = Arc::new(
        LocalStorage::new(dir.path(), config.stream_chunk_size)
            .await
            .unwrap(),
    );
    let catalog = Arc::new(MemoryCatalog::default());

    let state = Arc::new(AppState::new(
        config,
        Arc::clone(&storage),
        Arc::clone(&catalog) as Arc<dyn Catalog>,
    ));
    let server = TestServer::new(build_router(state)).unwrap();

    TestApp {
        server,
        storage,
        catalog,
        base,
        _dir: dir,
    }
}

impl TestApp {
    /// Insert a committed song directly, bypassing the upload pipeline.
    /// Useful when a test needs exact byte content in storage.
    pub async fn seed_song(&self, data: &[u8], mime_type: &str) -> (Uuid, StorageLocation) {
        let owner = Uuid::new_v4();
        let artist = self
            .catalog
            .find_or_create_artist("Seeded Artist", owner)
            .await
            .unwrap();

        let id = Uuid::new_v4();
        let location = self.storage.location(&format!("songs/{id}.bin"));
        self.storage
            .write(&location, bytes::Bytes::copy_from_slice(data))
            .await
            .unwrap();

        let song_id = self
            .catalog
            .create_song(NewSong {
                id,
                title: "Seeded".to_string(),
                location: location.clone(),
                size_bytes: data.len() as u64,
                mime_type: mime_type.to_string(),
                duration_secs: 0,
                thumbnail: None,
                artist_id: artist.id,
                album_id: None,
                owner_id: owner,
            })
            .await
            .unwrap();

        (song_id, location)
    }
}

/// Minimal canonical PCM WAV: 8-bit mono at 8 kHz, silence.
pub fn pcm_wav(seconds: u32) -> Vec<u8> {
    let sample_rate = 8000u32;
    let data_len = sample_rate * seconds;
    let mut v = Vec::with_capacity(44 + data_len as usize);
    v.extend_from_slice(b"RIFF");
    v.extend_from_slice(&(36 + data_len).to_le_bytes());
    v.extend_from_slice(b"WAVE");
    v.extend_from_slice(b"fmt ");
    v.extend_from_slice(&16u32.to_le_bytes());
    v.extend_from_slice(&1u16.to_le_bytes()); // PCM
    v.extend_from_slice(&1u16.to_le_bytes()); // mono
    v.extend_from_slice(&sample_rate.to_le_bytes());
    v.extend_from_slice(&sample_rate.to_le_bytes()); // byte rate
    v.extend_from_slice(&1u16.to_le_bytes()); // block align
    v.extend_from_slice(&8u16.to_le_bytes()); // bits per sample
    v.extend_from_slice(b"data");
    v.extend_from_slice(&data_len.to_le_bytes());
    v.resize(v.len() + data_len as usize, 0x80);
    v
}

/// WAV bytes with ID3v2 tags written by lofty.
pub fn tagged_wav(title: &str, artist: &str, album: Option<&str>) -> Vec<u8> {
    use lofty::config::WriteOptions;
    use lofty::tag::{Accessor, Tag, TagExt, TagType};

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fixture.wav");
    std::fs::write(&path, pcm_wav(2)).unwrap();

    let mut tag = Tag::new(TagType::Id3v2);
    tag.set_title(title.to_string());
    tag.set_artist(artist.to_string());
    if let Some(album) = album {
        tag.set_album(album.to_string());
    }
    tag.save_to_path(&path, WriteOptions::default()).unwrap();

    std::fs::read(&path).unwrap()
}
