//! Shared fixtures for pipeline integration tests.

use lofty::config::WriteOptions;
use lofty::picture::{MimeType, Picture, PictureType};
use lofty::tag::{Accessor, Tag, TagExt, TagType};

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

/// WAV bytes with ID3v2 tags written by lofty, optionally with embedded
/// artwork.
pub fn tagged_wav(
    title: &str,
    artist: &str,
    album: Option<&str>,
    artwork: Option<Vec<u8>>,
) -> Vec<u8> {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fixture.wav");
    std::fs::write(&path, pcm_wav(2)).unwrap();

    let mut tag = Tag::new(TagType::Id3v2);
    tag.set_title(title.to_string());
    tag.set_artist(artist.to_string());
    if let Some(album) = album {
        tag.set_album(album.to_string());
    }
    if let Some(data) = artwork {
        tag.push_picture(Picture::new_unchecked(
            PictureType::CoverFront,
            Some(MimeType::Png),
            None,
            data,
        ));
    }
    tag.save_to_path(&path, WriteOptions::default()).unwrap();

    std::fs::read(&path).unwrap()
}

/// Valid PNG bytes for artwork fixtures.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([200, 40, 40]));
    let mut out = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut std::io::Cursor::new(&mut out), image::ImageFormat::Png)
        .unwrap();
    out
}
