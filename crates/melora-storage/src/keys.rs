//! Shared key generation for storage backends.
//!
//! Final keys are always derived from a freshly generated UUID, never from a
//! user-supplied filename: that guarantees global uniqueness (a collision
//! would silently corrupt an unrelated file) and closes off path injection.
//! The only thing taken from the original name is a sanitized extension.

use uuid::Uuid;

/// Reserved namespace for staged uploads. Nothing under this prefix is ever
/// referenced by a persisted record.
pub const STAGING_PREFIX: &str = "tmp";

/// Namespace for committed audio files.
pub const SONGS_PREFIX: &str = "songs";

/// Namespace for derived thumbnails.
pub const THUMBNAILS_PREFIX: &str = "thumbnails";

/// Key for a staged upload: `tmp/{uuid}{ext}`.
pub fn staging_key(extension: &str) -> String {
    format!("{}/{}{}", STAGING_PREFIX, Uuid::new_v4(), extension)
}

/// Final key for a committed song: `songs/{id}{ext}`.
pub fn song_key(id: Uuid, extension: &str) -> String {
    format!("{}/{}{}", SONGS_PREFIX, id, extension)
}

/// Key for a derived thumbnail: `thumbnails/{uuid}.jpg`.
pub fn thumbnail_key() -> String {
    format!("{}/{}.jpg", THUMBNAILS_PREFIX, Uuid::new_v4())
}

/// Sanitized extension (including the leading dot) from an original filename,
/// or an empty string when there is nothing usable.
pub fn sanitize_extension(filename: &str) -> String {
    let ext = match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => ext,
        _ => return String::new(),
    };
    let clean: String = ext
        .chars()
        .take(8)
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();
    if clean.is_empty() {
        String::new()
    } else {
        format!(".{}", clean)
    }
}
