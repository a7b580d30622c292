use super::*;
use std::sync::Arc;
use std::sync::mpsc;
use std::time::Duration;

use crate::testing::FakeCatalog;

fn track(id: &str, title: &str, artist: &str) -> TrackDescriptor {
    TrackDescriptor {
        id: id.into(),
        title: title.into(),
        artist: artist.into(),
        thumbnail: String::new(),
    }
}

#[test]
fn search_url_encodes_query() {
    let base = parse_base_url("http://localhost:8000").unwrap();
    let url = search_url(&base, "daft punk & friends");
    assert_eq!(url.path(), "/search");
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    assert_eq!(
        pairs,
        vec![("query".to_string(), "daft punk & friends".to_string())]
    );
    assert!(!url.as_str().contains(' '));
}

#[test]
fn urls_keep_base_path_prefix() {
    let base = parse_base_url("https://example.com/api/").unwrap();
    assert_eq!(
        search_url(&base, "x").as_str(),
        "https://example.com/api/search?query=x"
    );
    assert_eq!(
        stream_url(&base, "abc123").as_str(),
        "https://example.com/api/get_audio/abc123"
    );
}

#[test]
fn stream_url_escapes_id_as_single_segment() {
    let base = parse_base_url("http://localhost:8000").unwrap();
    let url = stream_url(&base, "a/b c");
    assert_eq!(url.path(), "/get_audio/a%2Fb%20c");
}

#[test]
fn invalid_base_urls_are_rejected() {
    assert!(matches!(
        parse_base_url("not a url"),
        Err(CatalogError::InvalidBaseUrl(_))
    ));
    assert!(matches!(
        parse_base_url("mailto:someone@example.com"),
        Err(CatalogError::InvalidBaseUrl(_))
    ));
    assert!(matches!(
        parse_base_url("ftp://example.com"),
        Err(CatalogError::InvalidBaseUrl(_))
    ));
}

#[test]
fn http_catalog_resolves_stream_urls_from_base() {
    let catalog = HttpCatalog::new("http://127.0.0.1:9/", Duration::from_secs(1)).unwrap();
    assert_eq!(catalog.base().as_str(), "http://127.0.0.1:9/");
    assert_eq!(catalog.stream_url("xyz"), "http://127.0.0.1:9/get_audio/xyz");
}

#[test]
fn parse_search_response_maps_video_id() {
    let body = br#"[
        {"videoId": "A1", "title": "First", "artist": "Someone", "thumbnail": "http://t/1.jpg"},
        {"videoId": "B2", "title": "Second", "artist": "", "thumbnail": ""}
    ]"#;
    let tracks = parse_search_response(body).unwrap();
    assert_eq!(tracks.len(), 2);
    assert_eq!(tracks[0].id, "A1");
    assert_eq!(tracks[0].display(), "Someone - First");
    assert_eq!(tracks[1].display(), "Second");
}

#[test]
fn parse_search_response_rejects_garbage() {
    assert!(matches!(
        parse_search_response(b"{\"detail\": \"nope\"}"),
        Err(CatalogError::Decode(_))
    ));
}

#[test]
fn extension_follows_content_type() {
    assert_eq!(extension_for(Some("audio/mpeg")), "mp3");
    assert_eq!(extension_for(Some("audio/webm; codecs=opus")), "webm");
    assert_eq!(extension_for(Some("Audio/MP4")), "m4a");
    assert_eq!(extension_for(Some("application/octet-stream")), "mp3");
    assert_eq!(extension_for(None), "mp3");
}

#[test]
fn download_file_stem_strips_path_separators() {
    let t = track("id1", "Live at 1/2 time: part?", "AC/DC");
    assert_eq!(download_file_stem(&t), "AC_DC - Live at 1_2 time_ part_");

    let blank = track("fallback", " .. ", "");
    assert_eq!(download_file_stem(&blank), "fallback");
}

#[test]
fn save_download_writes_payload() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("nested");
    let t = track("id1", "Song", "Band");
    let audio = AudioBytes {
        bytes: vec![1, 2, 3, 4],
        content_type: Some("audio/ogg".into()),
    };

    let path = save_download(&target, &t, &audio).unwrap();
    assert_eq!(path, target.join("Band - Song.ogg"));
    assert_eq!(std::fs::read(&path).unwrap(), vec![1, 2, 3, 4]);
}

#[test]
fn save_download_keeps_existing_files() {
    let dir = tempfile::tempdir().unwrap();
    let t = track("id1", "Song", "Band");
    let first = AudioBytes {
        bytes: vec![1],
        content_type: None,
    };
    let second = AudioBytes {
        bytes: vec![2],
        content_type: None,
    };

    let a = save_download(dir.path(), &t, &first).unwrap();
    let b = save_download(dir.path(), &t, &second).unwrap();
    let c = save_download(dir.path(), &t, &second).unwrap();

    assert_eq!(a, dir.path().join("Band - Song.mp3"));
    assert_eq!(b, dir.path().join("Band - Song (1).mp3"));
    assert_eq!(c, dir.path().join("Band - Song (2).mp3"));
    assert_eq!(std::fs::read(&a).unwrap(), vec![1]);
    assert_eq!(std::fs::read(&b).unwrap(), vec![2]);
}

#[test]
fn spawn_search_reports_sequence_and_result() {
    let catalog = Arc::new(FakeCatalog::with_tracks(vec![
        track("A", "Alpha", "x"),
        track("B", "Beta", "y"),
    ]));
    let (tx, rx) = mpsc::channel();

    spawn_search(catalog.clone(), 7, "test".into(), tx);
    let outcome = rx.recv_timeout(Duration::from_secs(5)).unwrap();

    assert_eq!(outcome.seq, 7);
    assert_eq!(outcome.query, "test");
    assert_eq!(outcome.result.unwrap().len(), 2);
    assert_eq!(catalog.searches(), vec!["test".to_string()]);
}

#[test]
fn spawn_download_surfaces_network_failure() {
    let catalog = Arc::new(FakeCatalog::failing());
    let dir = tempfile::tempdir().unwrap();
    let (tx, rx) = mpsc::channel();

    spawn_download(catalog, track("A", "Alpha", "x"), dir.path().to_path_buf(), tx);
    let outcome = rx.recv_timeout(Duration::from_secs(5)).unwrap();

    assert!(outcome.result.is_err());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}
