//! Thumbnail derivation from embedded artwork.
//!
//! Decode, flatten to RGB, proportionally resize, re-encode as JPEG, persist
//! under `thumbnails/`. Strictly best-effort: any decode/encode/persist
//! failure degrades to "no thumbnail" with a warning and never aborts the
//! caller's upload.

use image::codecs::jpeg::JpegEncoder;
use melora_core::StorageLocation;
use melora_storage::{keys, Storage};
use std::sync::Arc;

const JPEG_QUALITY: u8 = 85;

pub struct ThumbnailDeriver {
    storage: Arc<dyn Storage>,
    max_width: u32,
    max_height: u32,
}

impl ThumbnailDeriver {
    pub fn new(storage: Arc<dyn Storage>, max_width: u32, max_height: u32) -> Self {
        ThumbnailDeriver {
            storage,
            max_width,
            max_height,
        }
    }

    /// Derive and persist a thumbnail from raw artwork bytes.
    ///
    /// `None` input is a no-op, not an error. Returns the location of the
    /// stored thumbnail, or `None` on any failure.
    pub async fn derive(&self, artwork: Option<&[u8]>) -> Option<StorageLocation> {
        let bytes = artwork?;
        match self.derive_inner(bytes).await {
            Ok(location) => Some(location),
            Err(e) => {
                tracing::warn!(error = %e, "Thumbnail derivation failed; continuing without artwork");
                None
            }
        }
    }

    async fn derive_inner(&self, bytes: &[u8]) -> anyhow::Result<StorageLocation> {
        let img = image::load_from_memory(bytes)?;
        // to_rgb8 flattens any alpha channel; JPEG has no transparency.
        let resized = img.thumbnail(self.max_width, self.max_height).to_rgb8();

        let mut encoded = Vec::new();
        JpegEncoder::new_with_quality(&mut encoded, JPEG_QUALITY).encode_image(&resized)?;

        let location = self.storage.location(&keys::thumbnail_key());
        self.storage.write(&location, encoded.into()).await?;

        tracing::debug!(
            location = %location,
            width = resized.width(),
            height = resized.height(),
            "Stored derived thumbnail"
        );

        Ok(location)
    }
}
