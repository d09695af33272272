//! Audio metadata extraction.
//!
//! Uses lofty for format-independent tag access: MP4 ilst atoms, ID3v2
//! frames, Vorbis comments, and RIFF INFO all come out through the same tag
//! abstraction. Only a fully unparseable container is an error; tags that are
//! present but missing the fields we want fall back to `None`.
//!
//! The extractor operates on a local path only. Callers whose storage backend
//! has no local paths materialize a scoped temporary copy first (see the
//! upload pipeline).

use lofty::file::{AudioFile, FileType, TaggedFileExt};
use lofty::probe::Probe;
use lofty::tag::Accessor;
use melora_core::{AppError, ExtractedMetadata};
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("unsupported or corrupted audio file: {0}")]
    Unsupported(String),
}

impl From<ExtractError> for AppError {
    fn from(err: ExtractError) -> Self {
        match err {
            ExtractError::Unsupported(msg) => AppError::UnsupportedFormat(msg),
        }
    }
}

/// MIME type for a probed container format. Resolved once after parsing;
/// formats we do not recognize fall through to `None` and keep the generic
/// duration-only result.
fn mime_for(file_type: FileType) -> Option<&'static str> {
    match file_type {
        FileType::Mp4 => Some("audio/mp4"),
        FileType::Mpeg => Some("audio/mpeg"),
        FileType::Flac => Some("audio/flac"),
        FileType::Wav => Some("audio/wav"),
        FileType::Vorbis | FileType::Opus | FileType::Speex => Some("audio/ogg"),
        FileType::Aiff => Some("audio/aiff"),
        FileType::Aac => Some("audio/aac"),
        _ => None,
    }
}

/// Extract tag and stream metadata from an audio file.
///
/// Fails with `Unsupported` only when the container cannot be parsed at all.
/// Duration always comes from the stream properties; artwork is the first
/// embedded picture, best-effort.
pub fn extract(path: &Path) -> Result<ExtractedMetadata, ExtractError> {
    let tagged_file = Probe::open(path)
        .map_err(|e| ExtractError::Unsupported(e.to_string()))?
        .read()
        .map_err(|e| ExtractError::Unsupported(e.to_string()))?;

    let tag = tagged_file.primary_tag().or_else(|| tagged_file.first_tag());

    let title = tag.and_then(|t| t.title().map(|s| s.to_string()));
    let artist = tag.and_then(|t| t.artist().map(|s| s.to_string()));
    let album = tag.and_then(|t| t.album().map(|s| s.to_string()));
    let artwork = tag.and_then(|t| t.pictures().first().map(|p| p.data().to_vec()));

    let duration_secs = tagged_file.properties().duration().as_secs();
    let mime_type = mime_for(tagged_file.file_type()).map(str::to_string);

    tracing::debug!(
        path = %path.display(),
        file_type = ?tagged_file.file_type(),
        duration_secs,
        has_artwork = artwork.is_some(),
        "Extracted audio metadata"
    );

    Ok(ExtractedMetadata {
        title,
        artist,
        album,
        duration_secs,
        mime_type,
        artwork,
    })
}
