//! Range streaming tests over the local backend.

mod helpers;

use helpers::setup_test_app;

fn seeded_bytes() -> Vec<u8> {
    (0u16..1000).map(|i| (i % 251) as u8).collect()
}

#[tokio::test]
async fn full_download_without_range_header() {
    let app = setup_test_app().await;
    let data = seeded_bytes();
    let (id, _) = app.seed_song(&data, "audio/mpeg").await;

    let response = app.server.get(&format!("/api/songs/{id}/stream")).await;

    assert_eq!(response.status_code().as_u16(), 200);
    assert_eq!(response.header("accept-ranges"), "bytes");
    assert_eq!(response.header("content-type"), "audio/mpeg");
    assert_eq!(response.as_bytes().as_ref(), data.as_slice());
}

#[tokio::test]
async fn bounded_range_returns_exact_span() {
    let app = setup_test_app().await;
    let data = seeded_bytes();
    let (id, _) = app.seed_song(&data, "audio/mpeg").await;

    let response = app
        .server
        .get(&format!("/api/songs/{id}/stream"))
        .add_header("range", "bytes=0-99")
        .await;

    assert_eq!(response.status_code().as_u16(), 206);
    assert_eq!(response.header("content-range"), "bytes 0-99/1000");
    assert_eq!(response.header("content-length"), "100");
    assert_eq!(response.as_bytes().as_ref(), &data[0..100]);
}

#[tokio::test]
async fn open_ended_range_runs_to_last_byte() {
    let app = setup_test_app().await;
    let data = seeded_bytes();
    let (id, _) = app.seed_song(&data, "audio/mpeg").await;

    let response = app
        .server
        .get(&format!("/api/songs/{id}/stream"))
        .add_header("range", "bytes=900-")
        .await;

    assert_eq!(response.status_code().as_u16(), 206);
    assert_eq!(response.header("content-range"), "bytes 900-999/1000");
    assert_eq!(response.as_bytes().as_ref(), &data[900..1000]);
}

#[tokio::test]
async fn range_past_end_is_rejected_with_empty_body() {
    let app = setup_test_app().await;
    let (id, _) = app.seed_song(&seeded_bytes(), "audio/mpeg").await;

    let response = app
        .server
        .get(&format!("/api/songs/{id}/stream"))
        .add_header("range", "bytes=2000-")
        .await;

    assert_eq!(response.status_code().as_u16(), 416);
    assert!(response.as_bytes().is_empty());
}

#[tokio::test]
async fn malformed_range_is_rejected() {
    let app = setup_test_app().await;
    let (id, _) = app.seed_song(&seeded_bytes(), "audio/mpeg").await;

    let response = app
        .server
        .get(&format!("/api/songs/{id}/stream"))
        .add_header("range", "bytes=abc-xyz")
        .await;

    assert_eq!(response.status_code().as_u16(), 416);
    assert!(response.as_bytes().is_empty());
}

#[tokio::test]
async fn range_end_is_clamped_to_file_size() {
    let app = setup_test_app().await;
    let data = seeded_bytes();
    let (id, _) = app.seed_song(&data, "audio/mpeg").await;

    let response = app
        .server
        .get(&format!("/api/songs/{id}/stream"))
        .add_header("range", "bytes=990-5000")
        .await;

    assert_eq!(response.status_code().as_u16(), 206);
    assert_eq!(response.header("content-range"), "bytes 990-999/1000");
    assert_eq!(response.as_bytes().as_ref(), &data[990..1000]);
}

#[tokio::test]
async fn unknown_song_id_is_not_found() {
    let app = setup_test_app().await;

    let response = app
        .server
        .get(&format!("/api/songs/{}/stream", uuid::Uuid::new_v4()))
        .await;

    assert_eq!(response.status_code().as_u16(), 404);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "NOT_FOUND");
}
