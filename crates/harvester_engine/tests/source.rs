mod common;

use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use common::{FakeSink, OnePageLoader, RecordingProgress, ScriptedPage};
use futures_util::FutureExt;
use harvester_engine::{
    CancellationToken, Coordinator, HarvestEvent, HarvestRequest, HarvestStatus, Provider,
    ProviderSource, ScrollSettings, Source, SourceJob,
};
use pretty_assertions::assert_eq;

fn instant_scroll() -> ScrollSettings {
    ScrollSettings {
        settle: Duration::ZERO,
        pause: Duration::ZERO,
        max_scrolls: 10,
    }
}

fn job(limit: usize) -> SourceJob<'static> {
    SourceJob {
        query: "red panda",
        limit,
        destination: Path::new("/tmp/harvest"),
    }
}

fn source(provider: Provider, loader: Arc<OnePageLoader>, sink: Arc<FakeSink>) -> ProviderSource {
    ProviderSource::new(provider, loader, sink, instant_scroll())
}

#[tokio::test]
async fn stops_at_limit_and_names_files_sequentially() {
    let page = ScriptedPage::with_values(
        "src",
        &[
            "https://a.test/1.jpg",
            "https://a.test/2.jpg",
            "https://a.test/3.jpg",
            "https://a.test/4.jpg",
        ],
    );
    let probe = page.probe();
    let loader = Arc::new(OnePageLoader::new(page));
    let sink = Arc::new(FakeSink::new());
    let progress = RecordingProgress::new();

    let saved = source(Provider::Bing, loader.clone(), sink.clone())
        .harvest(&job(2), &progress, &CancellationToken::new())
        .await;

    assert_eq!(saved, 2);
    assert_eq!(
        sink.saved(),
        vec![
            ("https://a.test/1.jpg".to_string(), "bing_1.jpg".to_string()),
            ("https://a.test/2.jpg".to_string(), "bing_2.jpg".to_string()),
        ]
    );
    assert!(probe.closed());
    assert_eq!(
        loader.last_url.lock().unwrap().as_deref(),
        Some("https://www.bing.com/images/search?q=red+panda")
    );
}

#[tokio::test]
async fn failed_downloads_are_skipped_without_consuming_indices() {
    let page = ScriptedPage::with_values(
        "src",
        &[
            "https://a.test/broken.jpg",
            "data:image/gif;base64,AAAA",
            "https://a.test/ok.jpg",
        ],
    );
    let loader = Arc::new(OnePageLoader::new(page));
    let sink = Arc::new(FakeSink::new().broken(&["https://a.test/broken.jpg"]));
    let progress = RecordingProgress::new();

    let saved = source(Provider::Google, loader, sink.clone())
        .harvest(&job(5), &progress, &CancellationToken::new())
        .await;

    assert_eq!(saved, 1);
    assert_eq!(
        sink.saved(),
        vec![("https://a.test/ok.jpg".to_string(), "google_1.jpg".to_string())]
    );
    let events = progress.take();
    assert!(events.contains(&HarvestEvent::CandidateSkipped {
        source: "google".into(),
        url: "https://a.test/broken.jpg".into(),
    }));
    assert!(events.contains(&HarvestEvent::ImageSaved {
        source: "google".into(),
        index: 1,
        path: Path::new("/tmp/harvest").join("google_1.jpg"),
    }));
}

#[tokio::test]
async fn yandex_links_are_decoded_before_saving() {
    let page = ScriptedPage::with_values(
        "href",
        &[
            "https://yandex.com/images/search?pos=0&img_url=%2F%2Fimg.example.com%2Fpic.jpg%3Fx%3D1",
            "https://yandex.com/images/search?pos=1",
        ],
    );
    let loader = Arc::new(OnePageLoader::new(page));
    let sink = Arc::new(FakeSink::new());

    let saved = source(Provider::Yandex, loader, sink.clone())
        .harvest(&job(5), &RecordingProgress::new(), &CancellationToken::new())
        .await;

    assert_eq!(saved, 1);
    assert_eq!(
        sink.saved(),
        vec![(
            "https://img.example.com/pic.jpg?x=1".to_string(),
            "yandex_1.jpg".to_string()
        )]
    );
}

#[tokio::test]
async fn unreachable_page_yields_zero() {
    let loader = Arc::new(OnePageLoader::unreachable());
    let sink = Arc::new(FakeSink::new());

    let saved = source(Provider::Google, loader.clone(), sink.clone())
        .harvest(&job(3), &RecordingProgress::new(), &CancellationToken::new())
        .await;

    assert_eq!(saved, 0);
    assert_eq!(loader.loads.load(Ordering::SeqCst), 1);
    assert!(sink.saved().is_empty());
}

#[tokio::test]
async fn page_is_closed_when_element_query_fails() {
    let page = ScriptedPage::with_values("src", &["https://a.test/1.jpg"]).failing_query();
    let probe = page.probe();
    let loader = Arc::new(OnePageLoader::new(page));
    let sink = Arc::new(FakeSink::new());

    let saved = source(Provider::Bing, loader, sink)
        .harvest(&job(3), &RecordingProgress::new(), &CancellationToken::new())
        .await;

    assert_eq!(saved, 0);
    assert!(probe.closed());
}

#[tokio::test]
async fn cancellation_stops_after_the_save_in_flight() {
    let cancel = CancellationToken::new();
    let page = ScriptedPage::with_values(
        "src",
        &[
            "https://a.test/1.jpg",
            "https://a.test/2.jpg",
            "https://a.test/3.jpg",
        ],
    );
    let probe = page.probe();
    let loader = Arc::new(OnePageLoader::new(page));
    let sink = Arc::new(FakeSink::new().cancel_after(2, cancel.clone()));

    let saved = source(Provider::Bing, loader, sink.clone())
        .harvest(&job(10), &RecordingProgress::new(), &cancel)
        .await;

    assert_eq!(saved, 2);
    assert_eq!(sink.saved().len(), 2);
    assert!(probe.closed());
}

#[tokio::test]
async fn cancelled_before_start_loads_nothing() {
    let cancel = CancellationToken::new();
    cancel.cancel();
    let loader = Arc::new(OnePageLoader::new(ScriptedPage::with_values(
        "src",
        &["https://a.test/1.jpg"],
    )));

    let saved = source(Provider::Bing, loader.clone(), Arc::new(FakeSink::new()))
        .harvest(&job(3), &RecordingProgress::new(), &cancel)
        .await;

    assert_eq!(saved, 0);
    assert_eq!(loader.loads.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn page_is_closed_when_saving_panics() {
    let page = ScriptedPage::with_values("src", &["https://a.test/1.jpg"]);
    let probe = page.probe();
    let loader = Arc::new(OnePageLoader::new(page));
    let sink = Arc::new(FakeSink::new().panicking());
    let source = source(Provider::Bing, loader, sink);
    let progress = RecordingProgress::new();
    let cancel = CancellationToken::new();

    let outcome = AssertUnwindSafe(source.harvest(&job(1), &progress, &cancel))
        .catch_unwind()
        .await;

    assert!(outcome.is_err());
    assert!(probe.closed());
}

#[tokio::test]
async fn panicking_provider_source_is_closed_and_counted_as_zero() {
    let dir = tempfile::TempDir::new().unwrap();
    let page = ScriptedPage::with_values("src", &["https://a.test/1.jpg"]);
    let probe = page.probe();
    let loader = Arc::new(OnePageLoader::new(page));
    let sink = Arc::new(FakeSink::new().panicking());
    let coordinator = Coordinator::new(vec![
        Box::new(source(Provider::Bing, loader, sink)) as Box<dyn Source>,
    ]);
    let request = HarvestRequest::new("red panda", 1, dir.path()).unwrap();

    let report = coordinator
        .harvest(&request, &RecordingProgress::new(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.downloaded, 0);
    assert_eq!(report.status, HarvestStatus::Complete);
    assert!(probe.closed());
}
