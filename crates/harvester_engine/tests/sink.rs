use std::fs;
use std::io::Cursor;
use std::path::Path;
use std::time::Duration;

use harvester_engine::{FailureKind, FetchSettings, HttpImageSink, ImageSink, SaveError};
use image::{DynamicImage, ImageFormat, RgbImage};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A PNG of pseudo-random pixels, large enough to clear the size threshold.
fn noisy_png() -> Vec<u8> {
    let mut state: u32 = 0x2545_f491;
    let img = RgbImage::from_fn(48, 48, |_, _| {
        let mut channel = || {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state & 0xff) as u8
        };
        image::Rgb([channel(), channel(), channel()])
    });
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut out, ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

fn is_empty_dir(dir: &Path) -> bool {
    fs::read_dir(dir).unwrap().next().is_none()
}

async fn serve(route: &str, response: ResponseTemplate) -> (MockServer, String) {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(response)
        .mount(&server)
        .await;
    let url = format!("{}{}", server.uri(), route);
    (server, url)
}

#[tokio::test]
async fn saves_a_valid_image_as_jpeg() {
    let png = noisy_png();
    assert!(png.len() >= 2048);
    let (_server, url) = serve(
        "/pic.png",
        ResponseTemplate::new(200).set_body_raw(png, "image/png"),
    )
    .await;
    let dir = TempDir::new().unwrap();
    let sink = HttpImageSink::new(&FetchSettings::default()).unwrap();

    assert!(sink.save(&url, dir.path(), "bing_1.jpg").await);

    let written = fs::read(dir.path().join("bing_1.jpg")).unwrap();
    assert_eq!(image::guess_format(&written).unwrap(), ImageFormat::Jpeg);
}

#[tokio::test]
async fn not_found_writes_nothing() {
    let (_server, url) = serve("/missing.jpg", ResponseTemplate::new(404)).await;
    let dir = TempDir::new().unwrap();
    let sink = HttpImageSink::new(&FetchSettings::default()).unwrap();

    assert!(!sink.save(&url, dir.path(), "a_1.jpg").await);
    assert!(is_empty_dir(dir.path()));

    let err = sink.try_save(&url, dir.path(), "a_1.jpg").await.unwrap_err();
    assert!(matches!(
        err,
        SaveError::Fetch(ref fetch) if fetch.kind == FailureKind::HttpStatus(404)
    ));
}

#[tokio::test]
async fn short_content_writes_nothing() {
    let (_server, url) = serve(
        "/tiny.jpg",
        ResponseTemplate::new(200).set_body_raw(vec![0xffu8; 1024], "image/jpeg"),
    )
    .await;
    let dir = TempDir::new().unwrap();
    let sink = HttpImageSink::new(&FetchSettings::default()).unwrap();

    assert!(!sink.save(&url, dir.path(), "a_1.jpg").await);
    assert!(is_empty_dir(dir.path()));

    let err = sink.try_save(&url, dir.path(), "a_1.jpg").await.unwrap_err();
    assert!(matches!(
        err,
        SaveError::Fetch(ref fetch) if fetch.kind == FailureKind::TooSmall {
            min_bytes: 2048,
            declared: Some(1024),
        }
    ));
}

#[tokio::test]
async fn undecodable_body_writes_nothing() {
    let (_server, url) = serve(
        "/fake.jpg",
        ResponseTemplate::new(200).set_body_raw(vec![0x42u8; 5000], "image/jpeg"),
    )
    .await;
    let dir = TempDir::new().unwrap();
    let sink = HttpImageSink::new(&FetchSettings::default()).unwrap();

    assert!(!sink.save(&url, dir.path(), "a_1.jpg").await);
    assert!(is_empty_dir(dir.path()));

    let err = sink.try_save(&url, dir.path(), "a_1.jpg").await.unwrap_err();
    assert!(matches!(err, SaveError::Decode(_)));
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let (_server, url) = serve(
        "/huge.png",
        ResponseTemplate::new(200).set_body_raw(noisy_png(), "image/png"),
    )
    .await;
    let dir = TempDir::new().unwrap();
    let settings = FetchSettings {
        max_bytes: 4096,
        ..FetchSettings::default()
    };
    let sink = HttpImageSink::new(&settings).unwrap();

    let err = sink.try_save(&url, dir.path(), "a_1.jpg").await.unwrap_err();
    assert!(matches!(
        err,
        SaveError::Fetch(ref fetch) if matches!(fetch.kind, FailureKind::TooLarge { max_bytes: 4096, .. })
    ));
    assert!(is_empty_dir(dir.path()));
}

#[tokio::test]
async fn slow_response_times_out() {
    let (_server, url) = serve(
        "/slow.png",
        ResponseTemplate::new(200)
            .set_delay(Duration::from_millis(250))
            .set_body_raw(noisy_png(), "image/png"),
    )
    .await;
    let dir = TempDir::new().unwrap();
    let settings = FetchSettings {
        request_timeout: Duration::from_millis(50),
        ..FetchSettings::default()
    };
    let sink = HttpImageSink::new(&settings).unwrap();

    let err = sink.try_save(&url, dir.path(), "a_1.jpg").await.unwrap_err();
    assert!(matches!(
        err,
        SaveError::Fetch(ref fetch) if fetch.kind == FailureKind::Timeout
    ));
}

#[tokio::test]
async fn malformed_url_is_not_fetched() {
    let dir = TempDir::new().unwrap();
    let sink = HttpImageSink::new(&FetchSettings::default()).unwrap();

    assert!(!sink.save("not a url", dir.path(), "a_1.jpg").await);
    assert!(is_empty_dir(dir.path()));
}
